//! Lexical tokens and token streams.
//!
//! A [`Tokens`] stream owns one engine allocation. It is released exactly
//! once: explicitly through [`Tokens::dispose`] or when the stream drops.
//! The [`Token`] values it hands out are copies and stay usable while the
//! translation unit lives.

use crate::cursor::Cursor;
use crate::engine::raw::token_kind;
use crate::engine::{RawToken, TranslationUnit};
use crate::location::{same_unit, SourceLocation};
use crate::range::SourceRange;
use serde::Serialize;
use std::fmt;
use std::ptr::NonNull;
use std::slice;
use thiserror::Error;
use tracing::warn;

/// Lexical category of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u32)]
pub enum TokenKind {
    Punctuation = token_kind::PUNCTUATION,
    Keyword = token_kind::KEYWORD,
    Identifier = token_kind::IDENTIFIER,
    Literal = token_kind::LITERAL,
    Comment = token_kind::COMMENT,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid TokenKind value ({0})")]
pub struct InvalidTokenKind(pub u32);

impl TryFrom<u32> for TokenKind {
    type Error = InvalidTokenKind;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            token_kind::PUNCTUATION => Ok(Self::Punctuation),
            token_kind::KEYWORD => Ok(Self::Keyword),
            token_kind::IDENTIFIER => Ok(Self::Identifier),
            token_kind::LITERAL => Ok(Self::Literal),
            token_kind::COMMENT => Ok(Self::Comment),
            other => Err(InvalidTokenKind(other)),
        }
    }
}

impl TokenKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Punctuation => "Punctuation",
            Self::Keyword => "Keyword",
            Self::Identifier => "Identifier",
            Self::Literal => "Literal",
            Self::Comment => "Comment",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single lexical token.
#[derive(Clone, Copy)]
pub struct Token<'tu> {
    unit: &'tu TranslationUnit,
    raw: RawToken,
}

impl<'tu> Token<'tu> {
    /// # Panics
    ///
    /// Panics with `invalid TokenKind value (N)` when the engine reports a
    /// kind code outside the known set.
    pub fn kind(&self) -> TokenKind {
        let code = self.unit.token_kind(&self.raw);
        match TokenKind::try_from(code) {
            Ok(kind) => kind,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn spelling(&self) -> &'tu str {
        self.unit.token_spelling(&self.raw)
    }

    pub fn location(&self) -> SourceLocation<'tu> {
        SourceLocation::from_raw(self.unit, self.unit.token_location(&self.raw))
    }

    pub fn extent(&self) -> SourceRange<'tu> {
        SourceRange::from_raw(self.unit, self.unit.token_extent(&self.raw))
    }

    pub fn raw(&self) -> RawToken {
        self.raw
    }
}

impl PartialEq for Token<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && std::ptr::eq(self.unit, other.unit)
    }
}

impl fmt::Debug for Token<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("kind", &self.raw.kind)
            .field("spelling", &self.spelling())
            .field("offset", &self.raw.offset)
            .finish()
    }
}

/// An ordered token stream produced by tokenizing a range.
///
/// Streams are move-only. An empty stream holds no engine allocation.
pub struct Tokens<'tu> {
    pub(crate) unit: &'tu TranslationUnit,
    batch: Option<NonNull<RawToken>>,
    len: usize,
}

impl<'tu> Tokens<'tu> {
    pub(crate) fn empty(unit: &'tu TranslationUnit) -> Self {
        Self {
            unit,
            batch: None,
            len: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The `index`-th token, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<Token<'tu>> {
        self.as_raw().get(index).map(|&raw| Token {
            unit: self.unit,
            raw,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Token<'tu>> + '_ {
        let unit = self.unit;
        self.as_raw().iter().map(move |&raw| Token { unit, raw })
    }

    /// Tokens lying entirely within `range`.
    pub fn inside(&self, range: &SourceRange<'tu>) -> Vec<Token<'tu>> {
        self.iter()
            .filter(|token| token.extent().is_inside(range))
            .collect()
    }

    /// The engine's view of the batch.
    pub fn as_raw(&self) -> &[RawToken] {
        match self.batch {
            // SAFETY: the batch came from `tokenize_range` with exactly
            // `len` elements and lives until `release`.
            Some(ptr) => unsafe { slice::from_raw_parts(ptr.as_ptr(), self.len) },
            None => &[],
        }
    }

    pub fn translation_unit(&self) -> &'tu TranslationUnit {
        self.unit
    }

    /// Release the stream's engine allocation now.
    pub fn dispose(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(ptr) = self.batch.take() {
            // SAFETY: `take` guarantees the batch is handed back once.
            unsafe { self.unit.dispose_tokens(ptr, self.len) };
            self.len = 0;
        }
    }
}

impl Drop for Tokens<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Tokens<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Tokenize `range` of `unit`.
///
/// Every token that starts inside the range is included, so the last one
/// may extend past its end. Null ranges, ranges spanning two files and
/// ranges of another unit give an empty stream.
pub fn tokenize<'tu>(unit: &'tu TranslationUnit, range: &SourceRange<'tu>) -> Tokens<'tu> {
    if !range.is_null() && !same_unit(range.unit(), Some(unit)) {
        warn!("range of another translation unit, tokenizing nothing");
        return Tokens::empty(unit);
    }
    match unit.tokenize_range(range.raw()) {
        Some((batch, len)) => Tokens {
            unit,
            batch: Some(batch),
            len,
        },
        None => Tokens::empty(unit),
    }
}

impl TranslationUnit {
    pub fn tokenize<'tu>(&'tu self, range: &SourceRange<'tu>) -> Tokens<'tu> {
        tokenize(self, range)
    }
}

impl<'tu> Cursor<'tu> {
    /// Tokenize the cursor's extent. Null cursors give `None`.
    pub fn tokenize(&self) -> Option<Tokens<'tu>> {
        let unit = self.translation_unit()?;
        Some(tokenize(unit, &self.extent()))
    }

    /// The tokens lying entirely within the cursor's extent.
    ///
    /// The intermediate stream is released before returning.
    pub fn tokens(&self) -> Vec<Token<'tu>> {
        let Some(stream) = self.tokenize() else {
            return Vec::new();
        };
        if stream.is_empty() {
            return Vec::new();
        }
        let inside = stream.inside(&self.extent());
        stream.dispose();
        inside
    }
}
