//! Token lexing and the token-batch primitives.
//!
//! Tokens are read off the leaves of the syntax tree when a file is indexed.
//! Tokenizing a range copies the matching tokens into a fresh batch that the
//! caller owns until it hands it back to [`TranslationUnit::dispose_tokens`].

use crate::engine::raw::{token_kind, RawCursor, RawLocation, RawRange, RawToken};
use crate::engine::unit::{NodeData, TranslationUnit};
use std::ptr::NonNull;
use tracing::debug;

/// Kinds lexed as a single token even though the grammar gives them children.
const ATOMIC_KINDS: &[&str] = &[
    "string_literal",
    "char_literal",
    "raw_string_literal",
    "system_lib_string",
];

const LITERAL_KINDS: &[&str] = &[
    "number_literal",
    "string_literal",
    "char_literal",
    "raw_string_literal",
    "system_lib_string",
    "preproc_arg",
    "true",
    "false",
    "null",
    "nullptr",
];

pub(crate) fn is_identifier_kind(kind: &str) -> bool {
    kind.ends_with("identifier")
}

fn classify(kind: &str, named: bool, spelling: &str) -> u32 {
    if kind == "comment" {
        return token_kind::COMMENT;
    }
    if LITERAL_KINDS.contains(&kind) {
        return token_kind::LITERAL;
    }
    if named {
        return match kind {
            "primitive_type" | "auto" | "this" => token_kind::KEYWORD,
            _ => token_kind::IDENTIFIER,
        };
    }
    match spelling.chars().next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '#' => token_kind::KEYWORD,
        _ => token_kind::PUNCTUATION,
    }
}

/// Lex every token of a flattened tree, in source order.
pub(crate) fn lex(file: u32, text: &str, nodes: &[NodeData], comments: bool) -> Vec<RawToken> {
    let mut tokens = Vec::new();
    let mut stack = if nodes.is_empty() {
        Vec::new()
    } else {
        vec![0u32]
    };

    while let Some(index) = stack.pop() {
        let node = &nodes[index as usize];
        if !node.children.is_empty() && !ATOMIC_KINDS.contains(&node.kind) {
            stack.extend(node.children.iter().rev());
            continue;
        }

        let spelling = text
            .get(node.start as usize..node.end as usize)
            .unwrap_or("");
        if spelling.trim().is_empty() {
            continue;
        }
        let kind = classify(node.kind, node.named, spelling);
        if kind == token_kind::COMMENT && !comments {
            continue;
        }
        tokens.push(RawToken {
            kind,
            file,
            offset: node.start,
            length: node.end - node.start,
        });
    }

    tokens.sort_by_key(|token| token.offset);
    tokens
}

impl TranslationUnit {
    /// Tokenize a range into a new batch.
    ///
    /// Returns every token of the range's file that starts inside
    /// `[begin, end)`; the last token may extend past `end`. Null ranges,
    /// ranges spanning two files and ranges without tokens produce no batch.
    pub fn tokenize_range(&self, range: RawRange) -> Option<(NonNull<RawToken>, usize)> {
        if range.begin.file != range.end.file {
            return None;
        }
        let file = self.source(range.begin.file)?;
        let first = file.tokens.partition_point(|t| t.offset < range.begin.offset);
        let last = file.tokens.partition_point(|t| t.offset < range.end.offset);
        if first >= last {
            return None;
        }

        let batch: Box<[RawToken]> = file.tokens[first..last].into();
        let count = batch.len();
        let tokens = NonNull::from(Box::leak(batch)).cast::<RawToken>();
        self.live_batches.set(self.live_batches.get() + 1);

        debug!(
            file = %file.name,
            begin = range.begin.offset,
            end = range.end.offset,
            count,
            "tokenized range"
        );
        Some((tokens, count))
    }

    /// Release a token batch.
    ///
    /// # Safety
    ///
    /// `tokens` and `count` must be exactly what one call to
    /// [`tokenize_range`](Self::tokenize_range) on this unit returned, and
    /// the batch must not have been disposed before.
    pub unsafe fn dispose_tokens(&self, tokens: NonNull<RawToken>, count: usize) {
        let batch = std::ptr::slice_from_raw_parts_mut(tokens.as_ptr(), count);
        drop(unsafe { Box::from_raw(batch) });
        self.live_batches
            .set(self.live_batches.get().saturating_sub(1));
        debug!(count, "disposed token batch");
    }

    /// Raw kind code of a token, see [`token_kind`].
    pub fn token_kind(&self, token: &RawToken) -> u32 {
        token.kind
    }

    pub fn token_spelling(&self, token: &RawToken) -> &str {
        self.source(token.file)
            .map_or("", |file| file.slice(token.offset, token.offset + token.length))
    }

    pub fn token_location(&self, token: &RawToken) -> RawLocation {
        RawLocation {
            file: token.file,
            offset: token.offset,
        }
    }

    pub fn token_extent(&self, token: &RawToken) -> RawRange {
        RawRange {
            begin: self.token_location(token),
            end: RawLocation {
                file: token.file,
                offset: token.offset + token.length,
            },
        }
    }

    /// Fill `cursors[i]` with the node owning `tokens[i]`: the smallest named
    /// node whose extent covers the token.
    ///
    /// Only `min(tokens.len(), cursors.len())` slots are written.
    pub fn annotate_tokens(&self, tokens: &[RawToken], cursors: &mut [RawCursor]) {
        for (token, slot) in tokens.iter().zip(cursors.iter_mut()) {
            *slot = self.owning_cursor(token);
        }
        debug!(count = tokens.len(), "annotated tokens");
    }

    fn owning_cursor(&self, token: &RawToken) -> RawCursor {
        let Some(file) = self.source(token.file) else {
            return RawCursor::NULL;
        };
        let start = token.offset as usize;
        let end = start + token.length as usize;
        file.tree
            .root_node()
            .named_descendant_for_byte_range(start, end)
            .and_then(|node| file.node_index(node))
            .map_or(RawCursor::NULL, |node| RawCursor {
                file: token.file,
                node,
            })
    }
}
