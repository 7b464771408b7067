use crate::engine::lexer::{is_identifier_kind, lex};
use crate::engine::parser::Dialect;
use crate::engine::raw::{RawCursor, RawFileLocation, RawLocation, RawRange, RawToken};
use ast_grep_core::tree_sitter::StrDoc;
use ast_grep_core::AstGrep;
use ast_grep_language::SupportLang;
use std::cell::{Cell, OnceCell};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};
use tree_sitter::{Node, Tree};

/// One node of a flattened syntax tree.
#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub(crate) kind: &'static str,
    pub(crate) field: Option<&'static str>,
    pub(crate) named: bool,
    pub(crate) start: u32,
    pub(crate) end: u32,
    pub(crate) parent: Option<u32>,
    pub(crate) children: Vec<u32>,
}

/// A parsed file. Node indices are preorder positions in `nodes`.
pub(crate) struct SourceFile {
    pub(crate) name: String,
    pub(crate) text: String,
    pub(crate) tree: Tree,
    line_starts: Vec<u32>,
    pub(crate) nodes: Vec<NodeData>,
    node_ids: HashMap<usize, u32>,
    pub(crate) tokens: Vec<RawToken>,
    grep: OnceCell<AstGrep<StrDoc<SupportLang>>>,
}

impl SourceFile {
    pub(crate) fn new(id: u32, name: &str, text: &str, tree: Tree, comments: bool) -> Self {
        let mut nodes = Vec::new();
        let mut node_ids = HashMap::new();
        flatten(tree.root_node(), None, None, &mut nodes, &mut node_ids);
        let tokens = lex(id, text, &nodes, comments);
        debug!(
            file = name,
            nodes = nodes.len(),
            tokens = tokens.len(),
            "indexed source file"
        );

        Self {
            name: name.to_string(),
            text: text.to_string(),
            tree,
            line_starts: line_starts(text),
            nodes,
            node_ids,
            tokens,
            grep: OnceCell::new(),
        }
    }

    /// The ast-grep view of this file, built on first pattern search.
    pub(crate) fn ast_grep(&self, lang: SupportLang) -> &AstGrep<StrDoc<SupportLang>> {
        self.grep
            .get_or_init(|| AstGrep::new(self.text.as_str(), lang))
    }

    pub(crate) fn len(&self) -> u32 {
        self.text.len() as u32
    }

    pub(crate) fn slice(&self, start: u32, end: u32) -> &str {
        self.text.get(start as usize..end as usize).unwrap_or("")
    }

    /// Index of a live tree-sitter node in the flattened table.
    pub(crate) fn node_index(&self, node: Node<'_>) -> Option<u32> {
        self.node_ids.get(&node.id()).copied()
    }

    /// 1-based line and column of a byte offset.
    fn position(&self, offset: u32) -> (u32, u32) {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let column = offset - self.line_starts[line - 1] + 1;
        (line as u32, column)
    }

    fn offset_at(&self, line: u32, column: u32) -> Option<u32> {
        if line == 0 || column == 0 {
            return None;
        }
        let start = *self.line_starts.get(line as usize - 1)?;
        let line_end = self
            .line_starts
            .get(line as usize)
            .map_or(self.len(), |next| next - 1);
        Some(start.saturating_add(column - 1).min(line_end))
    }
}

fn line_starts(text: &str) -> Vec<u32> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(i, _)| i as u32 + 1))
        .collect()
}

fn flatten(
    node: Node<'_>,
    field: Option<&'static str>,
    parent: Option<u32>,
    nodes: &mut Vec<NodeData>,
    ids: &mut HashMap<usize, u32>,
) -> u32 {
    let index = nodes.len() as u32;
    nodes.push(NodeData {
        kind: node.kind(),
        field,
        named: node.is_named(),
        start: node.start_byte() as u32,
        end: node.end_byte() as u32,
        parent,
        children: Vec::new(),
    });
    ids.insert(node.id(), index);

    let mut cursor = node.walk();
    if cursor.goto_first_child() {
        loop {
            let child = flatten(cursor.node(), cursor.field_name(), Some(index), nodes, ids);
            nodes[index as usize].children.push(child);
            if !cursor.goto_next_sibling() {
                break;
            }
        }
    }
    index
}

/// A parsed main file plus any unsaved files, and the engine state derived
/// from them.
///
/// Every raw handle the engine produces is only meaningful for the unit that
/// produced it. Token batches from [`tokenize_range`](Self::tokenize_range)
/// are counted until they are disposed.
pub struct TranslationUnit {
    dialect: Dialect,
    files: Vec<SourceFile>,
    pub(crate) live_batches: Cell<usize>,
}

impl TranslationUnit {
    pub(crate) fn new(dialect: Dialect, files: Vec<SourceFile>) -> Self {
        Self {
            dialect,
            files,
            live_batches: Cell::new(0),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub(crate) fn source(&self, file: u32) -> Option<&SourceFile> {
        self.files.get(file as usize)
    }

    fn node(&self, cursor: RawCursor) -> Option<(&SourceFile, &NodeData)> {
        let file = self.source(cursor.file)?;
        let node = file.nodes.get(cursor.node as usize)?;
        Some((file, node))
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn file_name(&self, file: u32) -> Option<&str> {
        self.source(file).map(|f| f.name.as_str())
    }

    pub fn file_text(&self, file: u32) -> Option<&str> {
        self.source(file).map(|f| f.text.as_str())
    }

    pub fn lookup_file(&self, name: &str) -> Option<u32> {
        self.files
            .iter()
            .position(|f| f.name == name)
            .map(|i| i as u32)
    }

    /// Number of token batches handed out and not yet disposed.
    pub fn live_token_batches(&self) -> usize {
        self.live_batches.get()
    }

    /// Resolve a location to file, line, column and offset.
    ///
    /// Null or foreign locations resolve to no file and zeros.
    pub fn resolve_location(&self, location: RawLocation) -> RawFileLocation {
        match self.source(location.file) {
            Some(file) if location.offset <= file.len() => {
                let (line, column) = file.position(location.offset);
                RawFileLocation {
                    file: Some(location.file),
                    line,
                    column,
                    offset: location.offset,
                }
            }
            _ => RawFileLocation::NULL,
        }
    }

    /// Location of a 1-based line and column. Columns past the end of the
    /// line clamp to the line end.
    pub fn location_at(&self, file: u32, line: u32, column: u32) -> RawLocation {
        self.source(file)
            .and_then(|f| f.offset_at(line, column))
            .map_or(RawLocation::NULL, |offset| RawLocation { file, offset })
    }

    pub fn location_at_offset(&self, file: u32, offset: u32) -> RawLocation {
        match self.source(file) {
            Some(f) if offset <= f.len() => RawLocation { file, offset },
            _ => RawLocation::NULL,
        }
    }

    /// The range covering a whole file, from offset 0 to its length.
    pub fn file_extent(&self, file: u32) -> RawRange {
        match self.source(file) {
            Some(f) => RawRange {
                begin: RawLocation { file, offset: 0 },
                end: RawLocation {
                    file,
                    offset: f.len(),
                },
            },
            None => RawRange::NULL,
        }
    }

    /// Whether any file contains ERROR or MISSING nodes.
    pub fn has_errors(&self) -> bool {
        self.files.iter().any(|f| f.tree.root_node().has_error())
    }

    /// Ranges of every ERROR or MISSING node, in file order.
    pub fn error_ranges(&self) -> Vec<RawRange> {
        let mut ranges = Vec::new();
        for (id, file) in self.files.iter().enumerate() {
            let mut cursor = file.tree.walk();
            let mut descend = true;
            loop {
                let node = cursor.node();
                if descend && (node.is_error() || node.is_missing()) {
                    ranges.push(RawRange {
                        begin: RawLocation {
                            file: id as u32,
                            offset: node.start_byte() as u32,
                        },
                        end: RawLocation {
                            file: id as u32,
                            offset: node.end_byte() as u32,
                        },
                    });
                }
                if descend && node.has_error() && cursor.goto_first_child() {
                    continue;
                }
                if cursor.goto_next_sibling() {
                    descend = true;
                    continue;
                }
                if !cursor.goto_parent() {
                    break;
                }
                descend = false;
            }
        }
        ranges
    }

    pub fn root_cursor(&self, file: u32) -> RawCursor {
        match self.source(file) {
            Some(f) if !f.nodes.is_empty() => RawCursor { file, node: 0 },
            _ => RawCursor::NULL,
        }
    }

    /// The smallest named node at a location.
    pub fn cursor_for_location(&self, location: RawLocation) -> RawCursor {
        let Some(file) = self.source(location.file) else {
            return RawCursor::NULL;
        };
        if location.offset > file.len() {
            return RawCursor::NULL;
        }
        let start = location.offset as usize;
        let end = (start + 1).min(file.text.len());
        let root = file.tree.root_node();
        let node = root
            .named_descendant_for_byte_range(start, end)
            .unwrap_or(root);
        file.node_index(node)
            .map_or(RawCursor::NULL, |node| RawCursor {
                file: location.file,
                node,
            })
    }

    /// The node spanning exactly `[start, end)` with the given kind. Falls
    /// back to the innermost node with that exact span.
    pub fn cursor_for_span(&self, file: u32, start: u32, end: u32, kind: &str) -> RawCursor {
        let Some(source) = self.source(file) else {
            return RawCursor::NULL;
        };
        let root = source.tree.root_node();
        let Some(mut node) = root.descendant_for_byte_range(start as usize, end as usize) else {
            return RawCursor::NULL;
        };

        // Ancestors only grow, so the walk ends at the first inexact span.
        let exact = |n: &Node<'_>| n.start_byte() == start as usize && n.end_byte() == end as usize;
        let mut fallback = None;
        while exact(&node) {
            if node.kind() == kind {
                fallback = Some(node);
                break;
            }
            fallback.get_or_insert(node);
            match node.parent() {
                Some(parent) => node = parent,
                None => break,
            }
        }

        fallback
            .and_then(|n| source.node_index(n))
            .map_or(RawCursor::NULL, |node| RawCursor { file, node })
    }

    pub fn cursor_extent(&self, cursor: RawCursor) -> RawRange {
        match self.node(cursor) {
            Some((_, node)) => RawRange {
                begin: RawLocation {
                    file: cursor.file,
                    offset: node.start,
                },
                end: RawLocation {
                    file: cursor.file,
                    offset: node.end,
                },
            },
            None => RawRange::NULL,
        }
    }

    pub fn cursor_kind(&self, cursor: RawCursor) -> Option<&'static str> {
        self.node(cursor).map(|(_, node)| node.kind)
    }

    pub fn cursor_field(&self, cursor: RawCursor) -> Option<&'static str> {
        self.node(cursor).and_then(|(_, node)| node.field)
    }

    pub fn cursor_is_named(&self, cursor: RawCursor) -> bool {
        self.node(cursor).is_some_and(|(_, node)| node.named)
    }

    pub fn cursor_parent(&self, cursor: RawCursor) -> RawCursor {
        self.node(cursor)
            .and_then(|(_, node)| node.parent)
            .map_or(RawCursor::NULL, |parent| RawCursor {
                file: cursor.file,
                node: parent,
            })
    }

    pub fn cursor_children(&self, cursor: RawCursor) -> Vec<RawCursor> {
        self.node(cursor)
            .map(|(_, node)| {
                node.children
                    .iter()
                    .map(|&child| RawCursor {
                        file: cursor.file,
                        node: child,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Source text covered by a cursor.
    pub fn cursor_text(&self, cursor: RawCursor) -> Option<&str> {
        self.node(cursor)
            .map(|(file, node)| file.slice(node.start, node.end))
    }

    /// The name an entity or reference is spelled with.
    ///
    /// Identifiers spell themselves; other nodes are followed through their
    /// `declarator`, `name` or `function` child until an identifier is found.
    pub fn cursor_spelling(&self, cursor: RawCursor) -> Option<&str> {
        let file = self.source(cursor.file)?;
        let mut index = cursor.node;
        loop {
            let node = file.nodes.get(index as usize)?;
            if is_identifier_kind(node.kind) {
                return Some(file.slice(node.start, node.end));
            }
            index = node.children.iter().copied().find(|&child| {
                matches!(
                    file.nodes[child as usize].field,
                    Some("declarator" | "name" | "function")
                )
            })?;
        }
    }
}

impl fmt::Debug for TranslationUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationUnit")
            .field("dialect", &self.dialect)
            .field(
                "files",
                &self
                    .files
                    .iter()
                    .map(|file| &file.name)
                    .collect::<Vec<_>>(),
            )
            .field("live_batches", &self.live_batches.get())
            .finish()
    }
}

impl Drop for TranslationUnit {
    fn drop(&mut self) {
        let live = self.live_batches.get();
        if live > 0 {
            warn!(
                live,
                main = self.file_name(0).unwrap_or(""),
                "translation unit dropped with undisposed token batches"
            );
        }
    }
}
