//! Sourcelens: correlate source ranges, lexical tokens and syntax-tree nodes
//!
//! A small layer over a tree-sitter backed engine for C and C++ sources.
//! Parse a translation unit, then ask it questions in terms of typed,
//! lifetime-checked values.
//!
//! # Architecture
//!
//! The [`engine`] speaks in plain-data handles (`RawLocation`, `RawRange`,
//! `RawCursor`, `RawToken`) and C-shaped callbacks. Everything above it
//! wraps those handles together with a borrow of their [`TranslationUnit`]:
//!
//! - [`SourceLocation`] and [`SourceRange`]: points and half-open ranges,
//!   with range intersection and containment
//! - [`Tokens`]: a token stream owning one engine allocation, released
//!   exactly once
//! - [`Tokens::annotate`]: the syntax node owning each token
//! - [`find`]: reference and structural search through a closure visitor
//!
//! # Example
//!
//! ```
//! use sourcelens::{Index, TokenKind};
//!
//! let unit = Index::default().parse("main.c", "int x = 1;").unwrap();
//! let tokens = unit.tokenize(&unit.main_file().extent());
//! let owners = tokens.annotate();
//!
//! let first = tokens.get(0).unwrap();
//! assert_eq!(first.kind(), TokenKind::Keyword);
//! assert_eq!(first.spelling(), "int");
//! assert_eq!(owners[0].kind(), "primitive_type");
//! ```

pub mod annotate;
pub mod config;
pub mod cursor;
pub mod engine;
pub mod location;
pub mod range;
pub mod token;
pub mod visit;

pub use cursor::Cursor;
pub use engine::{
    queries, Dialect, EngineError, FindOutcome, Index, SearchQuery, TranslationUnit, UnsavedFile,
};
pub use location::{File, FileLocation, SourceLocation};
pub use range::SourceRange;
pub use token::{tokenize, InvalidTokenKind, Token, TokenKind, Tokens};
pub use visit::{find, Visit};
