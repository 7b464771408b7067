//! Tree-sitter backed syntax engine.
//!
//! The engine parses C and C++ sources into translation units and answers
//! the primitive questions the correlation layer asks about them: where a
//! location is, which tokens a range covers, which node owns a token, and
//! which nodes match a search. Everything it hands out is a plain-data
//! handle from [`raw`]; token batches are engine allocations that must be
//! returned through [`TranslationUnit::dispose_tokens`].

pub mod cache;
pub mod errors;
pub mod lexer;
pub mod parser;
pub mod pool;
pub mod raw;
pub mod search;
pub mod unit;

pub use errors::EngineError;
pub use parser::{Dialect, Index, SourceParser, UnsavedFile};
pub use raw::{
    RawCursor, RawFileLocation, RawLocation, RawRange, RawToken, RawVisitFn, RawVisitor,
    VisitSignal, NO_FILE,
};
pub use search::{queries, FindOutcome, SearchQuery};
pub use unit::TranslationUnit;
