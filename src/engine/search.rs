use crate::engine::cache;
use crate::engine::errors::EngineError;
use crate::engine::lexer::is_identifier_kind;
use crate::engine::raw::{RawCursor, RawVisitor, VisitSignal};
use crate::engine::unit::{SourceFile, TranslationUnit};
use std::ops::Range;
use tracing::debug;
use tree_sitter::{QueryCursor, StreamingIterator};

/// What a search looks for, starting from a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchQuery {
    /// Identifiers spelled like the entity the starting cursor names.
    References,
    /// A tree-sitter query; every capture of every match is reported.
    ///
    /// Tree-sitter queries use S-expression syntax:
    /// ```text
    /// (call_expression
    ///   function: (identifier) @callee)
    /// ```
    Query(String),
    /// An ast-grep pattern using `$NAME` and `$$$` metavariables.
    Pattern(String),
}

/// How a search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FindOutcome {
    /// Every match was visited.
    Completed,
    /// The visitor returned [`VisitSignal::Break`].
    Stopped,
}

impl TranslationUnit {
    /// Search `file` starting from `cursor`, calling the visitor for every
    /// match in traversal order until it returns [`VisitSignal::Break`].
    ///
    /// `Query` and `Pattern` searches are limited to the cursor's extent
    /// when the cursor lives in `file`, otherwise they cover the whole file.
    ///
    /// # Safety
    ///
    /// `visitor.visit` is called with `visitor.context`; the pair must be
    /// valid to call for the whole duration of this call.
    pub unsafe fn find_in_file(
        &self,
        cursor: RawCursor,
        file: u32,
        query: &SearchQuery,
        visitor: RawVisitor,
    ) -> Result<FindOutcome, EngineError> {
        let visit = visitor.visit.ok_or(EngineError::MissingVisitor)?;
        let target = self.source(file).ok_or(EngineError::UnknownFile { file })?;
        let extent = self.cursor_extent(cursor);
        if extent.is_null() {
            return Err(EngineError::InvalidCursor);
        }
        let scope = if cursor.file == file {
            extent.begin.offset as usize..extent.end.offset as usize
        } else {
            0..target.text.len()
        };

        let mut visits = 0usize;
        let mut emit = |found: RawCursor| {
            visits += 1;
            let range = self.cursor_extent(found);
            let signal = unsafe { visit(visitor.context, found, range) };
            signal == VisitSignal::Continue
        };

        debug!(file = %target.name, ?query, "search started");
        let completed = match query {
            SearchQuery::References => self.references(cursor, file, target, &mut emit)?,
            SearchQuery::Query(source) => {
                self.query_matches(file, target, source, scope, &mut emit)?
            }
            SearchQuery::Pattern(source) => {
                self.pattern_matches(file, target, source, scope, &mut emit)?
            }
        };
        let outcome = if completed {
            FindOutcome::Completed
        } else {
            FindOutcome::Stopped
        };
        debug!(file = %target.name, visits, ?outcome, "search finished");
        Ok(outcome)
    }

    fn references(
        &self,
        cursor: RawCursor,
        file: u32,
        target: &SourceFile,
        emit: &mut dyn FnMut(RawCursor) -> bool,
    ) -> Result<bool, EngineError> {
        let name = self
            .cursor_spelling(cursor)
            .ok_or_else(|| EngineError::NoReferencedName {
                kind: self.cursor_kind(cursor).unwrap_or("").to_string(),
            })?;

        // Node indices are preorder, which is source order.
        for (index, node) in target.nodes.iter().enumerate() {
            if is_identifier_kind(node.kind)
                && target.slice(node.start, node.end) == name
                && !emit(RawCursor {
                    file,
                    node: index as u32,
                })
            {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn query_matches(
        &self,
        file: u32,
        target: &SourceFile,
        source: &str,
        scope: Range<usize>,
        emit: &mut dyn FnMut(RawCursor) -> bool,
    ) -> Result<bool, EngineError> {
        let query = cache::get_or_compile_query(source, self.dialect())?;
        let mut cursor = QueryCursor::new();
        cursor.set_byte_range(scope.clone());
        let mut matches = cursor.matches(&query, target.tree.root_node(), target.text.as_bytes());

        // tree-sitter 0.25+ uses StreamingIterator
        while let Some(m) = matches.next() {
            for capture in m.captures {
                let node = capture.node;
                if node.start_byte() < scope.start || node.end_byte() > scope.end {
                    continue;
                }
                let Some(index) = target.node_index(node) else {
                    continue;
                };
                if !emit(RawCursor { file, node: index }) {
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }

    fn pattern_matches(
        &self,
        file: u32,
        target: &SourceFile,
        source: &str,
        scope: Range<usize>,
        emit: &mut dyn FnMut(RawCursor) -> bool,
    ) -> Result<bool, EngineError> {
        let lang = self.dialect().support_lang();
        let pattern = cache::get_or_compile_pattern(source, lang)?;
        let root = target.ast_grep(lang).root();

        for m in root.find_all(&pattern) {
            let node = m.get_node();
            let range = node.range();
            if range.start < scope.start || range.end > scope.end {
                continue;
            }
            let found =
                self.cursor_for_span(file, range.start as u32, range.end as u32, &node.kind());
            if found.is_null() {
                continue;
            }
            if !emit(found) {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Common tree-sitter queries for C constructs.
pub mod queries {
    /// Calls to a function by name.
    pub fn calls_to(name: &str) -> String {
        format!(
            r#"(call_expression
                function: (identifier) @callee
                (#eq? @callee "{name}")
            ) @call"#
        )
    }

    /// A function definition by name.
    pub fn function_by_name(name: &str) -> String {
        format!(
            r#"(function_definition
                declarator: (function_declarator
                    declarator: (identifier) @name
                    (#eq? @name "{name}"))
            ) @function"#
        )
    }

    /// Assignments to a variable by name.
    pub fn assignments_to(name: &str) -> String {
        format!(
            r#"(assignment_expression
                left: (identifier) @target
                (#eq? @target "{name}")
            ) @assignment"#
        )
    }

    /// Every call's callee.
    pub const ALL_CALLEES: &str = r#"(call_expression
        function: (identifier) @callee)"#;

    /// Every function definition.
    pub const ALL_FUNCTIONS: &str = r#"(function_definition
        declarator: (function_declarator
            declarator: (identifier) @name)) @function"#;
}
