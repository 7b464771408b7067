//! Thread-local compilation cache for search queries.
//!
//! Tree-sitter queries and ast-grep patterns are compiled once per thread
//! and reused. Each cache is capped at 256 entries and cleared when full.

use crate::engine::errors::EngineError;
use crate::engine::parser::Dialect;
use ast_grep_core::Pattern;
use ast_grep_language::{LanguageExt, SupportLang};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tree_sitter::Query;

const MAX_CACHE_ENTRIES: usize = 256;

thread_local! {
    // Keys carry the language so identical sources for C and C++ never collide.
    static QUERY_CACHE: RefCell<HashMap<String, Rc<Query>>> = RefCell::new(HashMap::new());
    static PATTERN_CACHE: RefCell<HashMap<String, Pattern>> = RefCell::new(HashMap::new());
}

/// Get a compiled tree-sitter query from cache, or compile and cache it.
pub fn get_or_compile_query(source: &str, dialect: Dialect) -> Result<Rc<Query>, EngineError> {
    let cache_key = format!("{dialect:?}:{source}");

    QUERY_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(query) = cache.get(&cache_key) {
            return Ok(Rc::clone(query));
        }

        let language = dialect.support_lang().get_ts_language();
        let query = Query::new(&language, source).map_err(|e| EngineError::InvalidQuery {
            message: e.to_string(),
        })?;

        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }
        let query = Rc::new(query);
        cache.insert(cache_key, Rc::clone(&query));
        Ok(query)
    })
}

/// Get a compiled ast-grep pattern from cache, or compile and cache it.
///
/// Empty patterns and patterns with more than one root node are rejected.
pub fn get_or_compile_pattern(source: &str, lang: SupportLang) -> Result<Pattern, EngineError> {
    let cache_key = format!("{lang:?}:{source}");

    PATTERN_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        if let Some(p) = cache.get(&cache_key) {
            return Ok(p.clone());
        }

        let compiled =
            Pattern::try_new(source, lang).map_err(|e| EngineError::InvalidPattern {
                message: e.to_string(),
            })?;
        if cache.len() >= MAX_CACHE_ENTRIES {
            cache.clear();
        }
        cache.insert(cache_key, compiled.clone());
        Ok(compiled)
    })
}

/// Clear both caches (mainly for testing).
pub fn clear_cache() {
    QUERY_CACHE.with(|cache| cache.borrow_mut().clear());
    PATTERN_CACHE.with(|cache| cache.borrow_mut().clear());
}

/// Number of cached queries and patterns.
pub fn cache_size() -> usize {
    QUERY_CACHE.with(|cache| cache.borrow().len())
        + PATTERN_CACHE.with(|cache| cache.borrow().len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_is_compiled_once() {
        clear_cache();
        let first = get_or_compile_query("(identifier) @id", Dialect::C).unwrap();
        let second = get_or_compile_query("(identifier) @id", Dialect::C).unwrap();

        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(cache_size(), 1);
    }

    #[test]
    fn dialects_do_not_share_entries() {
        clear_cache();
        get_or_compile_query("(identifier) @id", Dialect::C).unwrap();
        get_or_compile_query("(identifier) @id", Dialect::Cpp).unwrap();

        assert_eq!(cache_size(), 2);
    }

    #[test]
    fn pattern_is_compiled_once() {
        clear_cache();
        get_or_compile_pattern("return $X;", SupportLang::C).unwrap();
        get_or_compile_pattern("return $X;", SupportLang::C).unwrap();

        assert_eq!(cache_size(), 1);
    }

    #[test]
    fn unusable_patterns_are_errors_and_not_cached() {
        clear_cache();
        for source in ["", "int a; int b;"] {
            let err = get_or_compile_pattern(source, SupportLang::C).unwrap_err();
            assert!(matches!(err, EngineError::InvalidPattern { .. }), "{source:?}");
        }
        assert_eq!(cache_size(), 0);
    }

    #[test]
    fn invalid_query_is_reported() {
        let err = get_or_compile_query("(not_a_real_node_kind) @x", Dialect::C).unwrap_err();
        assert!(matches!(err, EngineError::InvalidQuery { .. }));
    }
}
