//! Thread-local parser pooling.
//!
//! Keeps one reusable tree-sitter parser per dialect and thread, created on
//! first use.

use crate::engine::errors::EngineError;
use crate::engine::parser::{Dialect, SourceParser};
use std::cell::RefCell;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

thread_local! {
    static PARSERS: RefCell<HashMap<Dialect, SourceParser>> = RefCell::new(HashMap::new());
}

/// Execute function with the pooled parser for `dialect`.
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use sourcelens::engine::{pool::with_parser, Dialect};
///
/// let tree = with_parser(Dialect::C, |parser| parser.parse("main.c", "int x;"))??;
/// assert_eq!(tree.root_node().kind(), "translation_unit");
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(dialect: Dialect, f: F) -> Result<R, EngineError>
where
    F: FnOnce(&mut SourceParser) -> R,
{
    PARSERS.with(|cell| {
        let mut parsers = cell.borrow_mut();
        let parser = match parsers.entry(dialect) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(SourceParser::new(dialect)?),
        };
        Ok(f(parser))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_parser_matches_dialect() {
        let dialect = with_parser(Dialect::Cpp, |parser| parser.dialect());
        assert_eq!(dialect.unwrap(), Dialect::Cpp);
    }

    #[test]
    fn pooled_parser_is_reused() {
        let first = with_parser(Dialect::C, |parser| parser as *const SourceParser).unwrap();
        let second = with_parser(Dialect::C, |parser| parser as *const SourceParser).unwrap();
        assert_eq!(first, second);
    }
}
