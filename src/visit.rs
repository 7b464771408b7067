//! Reference and structural search with caller-supplied visitors.
//!
//! The engine reports matches through a C-shaped callback carrying an
//! opaque context pointer. [`find`] boxes the caller's closure and context
//! into one record, hands the engine a pointer to it together with a
//! trampoline monomorphised for the record's type, and turns each callback
//! back into typed [`Cursor`] and [`SourceRange`] values.

use crate::cursor::Cursor;
use crate::engine::{
    EngineError, FindOutcome, RawCursor, RawRange, RawVisitFn, RawVisitor, SearchQuery,
    TranslationUnit, VisitSignal,
};
use crate::location::File;
use crate::range::SourceRange;
use std::any::Any;
use std::ffi::c_void;
use std::panic::{self, AssertUnwindSafe};
use tracing::debug;

/// A visitor's answer for each match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visit {
    Continue,
    Stop,
}

impl From<Visit> for VisitSignal {
    fn from(visit: Visit) -> Self {
        match visit {
            Visit::Continue => VisitSignal::Continue,
            Visit::Stop => VisitSignal::Break,
        }
    }
}

trait Dispatch {
    fn dispatch(&mut self, cursor: RawCursor, range: RawRange) -> VisitSignal;
    fn store_panic(&mut self, payload: Box<dyn Any + Send>);
}

struct FindContext<'a, 'tu, C, F> {
    unit: &'tu TranslationUnit,
    context: &'a mut C,
    visitor: F,
    panic: Option<Box<dyn Any + Send>>,
}

impl<'tu, C, F> Dispatch for FindContext<'_, 'tu, C, F>
where
    F: FnMut(&mut C, Cursor<'tu>, SourceRange<'tu>) -> Visit,
{
    fn dispatch(&mut self, cursor: RawCursor, range: RawRange) -> VisitSignal {
        let cursor = Cursor::new(self.unit, cursor);
        let range = SourceRange::from_raw(self.unit, range);
        (self.visitor)(self.context, cursor, range).into()
    }

    fn store_panic(&mut self, payload: Box<dyn Any + Send>) {
        self.panic = Some(payload);
    }
}

/// Engine callback for records of type `D`.
///
/// A panicking visitor stops the search; the panic is resumed once the
/// engine has returned.
unsafe extern "C" fn trampoline<D: Dispatch>(
    context: *mut c_void,
    cursor: RawCursor,
    range: RawRange,
) -> VisitSignal {
    // SAFETY: `context` is the record `raw_visitor` was built from, and the
    // engine only calls back while `find` holds it.
    let record = unsafe { &mut *context.cast::<D>() };
    match panic::catch_unwind(AssertUnwindSafe(|| record.dispatch(cursor, range))) {
        Ok(signal) => signal,
        Err(payload) => {
            record.store_panic(payload);
            VisitSignal::Break
        }
    }
}

fn raw_visitor<D: Dispatch>(record: &mut D) -> RawVisitor {
    RawVisitor {
        context: (record as *mut D).cast::<c_void>(),
        visit: Some(trampoline::<D> as RawVisitFn),
    }
}

/// Search `file` from `cursor`, calling `visitor` with `context` for each
/// match until it returns [`Visit::Stop`].
///
/// Matches arrive in source order. The visitor receives each match's
/// cursor and extent; both are only valid while the translation unit is.
pub fn find<'tu, C, F>(
    cursor: &Cursor<'tu>,
    file: File<'tu>,
    query: &SearchQuery,
    context: &mut C,
    visitor: F,
) -> Result<FindOutcome, EngineError>
where
    F: FnMut(&mut C, Cursor<'tu>, SourceRange<'tu>) -> Visit,
{
    let unit = cursor.translation_unit().ok_or(EngineError::InvalidCursor)?;
    if !file.belongs_to(unit) {
        return Err(EngineError::UnknownFile { file: file.id() });
    }

    let mut record = Box::new(FindContext {
        unit,
        context,
        visitor,
        panic: None,
    });
    let raw = raw_visitor(&mut *record);
    debug!(file = file.name(), kind = cursor.kind(), "dispatching search");
    // SAFETY: the engine calls back synchronously and `record` outlives the
    // call.
    let outcome = unsafe { unit.find_in_file(cursor.raw(), file.id(), query, raw) };
    if let Some(payload) = record.panic.take() {
        panic::resume_unwind(payload);
    }
    outcome
}

impl<'tu> Cursor<'tu> {
    /// Visit every reference to the entity this cursor names within `file`.
    pub fn find_references_in_file<C, F>(
        &self,
        file: File<'tu>,
        context: &mut C,
        visitor: F,
    ) -> Result<FindOutcome, EngineError>
    where
        F: FnMut(&mut C, Cursor<'tu>, SourceRange<'tu>) -> Visit,
    {
        find(self, file, &SearchQuery::References, context, visitor)
    }

    /// Visit every match of a query or pattern within `file`, limited to
    /// this cursor's extent when the cursor is in `file`.
    pub fn find_in_file<C, F>(
        &self,
        file: File<'tu>,
        query: &SearchQuery,
        context: &mut C,
        visitor: F,
    ) -> Result<FindOutcome, EngineError>
    where
        F: FnMut(&mut C, Cursor<'tu>, SourceRange<'tu>) -> Visit,
    {
        find(self, file, query, context, visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{queries, Index, UnsavedFile};

    const SOURCE: &str = "int total = 0;\n\nvoid add(int n) {\n    total = total + n;\n}\n\nint main(void) {\n    add(1);\n    add(2);\n    return total;\n}\n";

    fn total_decl(unit: &TranslationUnit) -> Cursor<'_> {
        unit.cursor_at(unit.location(unit.main_file(), 1, 5))
    }

    #[test]
    fn continue_visits_every_reference() {
        let unit = Index::default().parse("main.c", SOURCE).unwrap();
        let decl = total_decl(&unit);
        let mut seen = Vec::new();

        let outcome = decl
            .find_references_in_file(unit.main_file(), &mut seen, |seen, cursor, range| {
                seen.push((cursor.spelling().unwrap_or(""), range.start().offset()));
                Visit::Continue
            })
            .unwrap();

        assert_eq!(outcome, FindOutcome::Completed);
        assert_eq!(
            seen,
            vec![("total", 4), ("total", 38), ("total", 46), ("total", 112)]
        );
    }

    #[test]
    fn stop_ends_after_one_visit() {
        let unit = Index::default().parse("main.c", SOURCE).unwrap();
        let mut visits = 0;

        let outcome = total_decl(&unit)
            .find_references_in_file(unit.main_file(), &mut visits, |visits, _, _| {
                *visits += 1;
                Visit::Stop
            })
            .unwrap();

        assert_eq!(outcome, FindOutcome::Stopped);
        assert_eq!(visits, 1);
    }

    #[test]
    fn query_search_reports_captures() {
        let unit = Index::default().parse("main.c", SOURCE).unwrap();
        let query = SearchQuery::Query(queries::ALL_CALLEES.to_string());
        let mut callees = Vec::new();

        unit.cursor()
            .find_in_file(unit.main_file(), &query, &mut callees, |callees, cursor, _| {
                callees.push(cursor.text());
                Visit::Continue
            })
            .unwrap();

        assert_eq!(callees, vec!["add", "add"]);
    }

    #[test]
    fn pattern_search_is_scoped_to_the_cursor() {
        let unit = Index::default().parse("main.c", SOURCE).unwrap();
        let query = SearchQuery::Pattern("add($ARG);".to_string());
        let main_fn = unit.cursor().children()[2];
        let add_fn = unit.cursor().children()[1];
        let mut count = 0;

        main_fn
            .find_in_file(unit.main_file(), &query, &mut count, |count, cursor, _| {
                assert_eq!(cursor.kind(), "expression_statement");
                *count += 1;
                Visit::Continue
            })
            .unwrap();
        assert_eq!(count, 2);

        count = 0;
        add_fn
            .find_in_file(unit.main_file(), &query, &mut count, |count, _, _| {
                *count += 1;
                Visit::Continue
            })
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn unusable_patterns_return_errors() {
        let unit = Index::default().parse("main.c", SOURCE).unwrap();
        let mut visits = 0;

        for source in ["", "int a; int b;"] {
            let result = find(
                &unit.cursor(),
                unit.main_file(),
                &SearchQuery::Pattern(source.to_string()),
                &mut visits,
                |visits, _, _| {
                    *visits += 1;
                    Visit::Continue
                },
            );
            let err = result.unwrap_err();
            assert!(matches!(err, EngineError::InvalidPattern { .. }), "{source:?}");
            assert!(err.to_string().starts_with("invalid ast-grep pattern"));
        }
        assert_eq!(visits, 0);
    }

    #[test]
    fn references_cross_into_other_files() {
        let unit = Index::default()
            .parse_with_unsaved(
                "main.c",
                "#include \"counter.h\"\nint main(void) { return counter + counter; }\n",
                &[UnsavedFile::new("counter.h", "extern int counter;\n")],
            )
            .unwrap();
        let header = unit.file("counter.h").unwrap();
        let decl = unit.cursor_at(unit.location(header, 1, 12));
        assert_eq!(decl.spelling(), Some("counter"));

        let mut lines = Vec::new();
        decl.find_references_in_file(unit.main_file(), &mut lines, |lines, cursor, _| {
            let location = cursor.location().file_location();
            assert_eq!(location.file, Some(unit.main_file()));
            lines.push((location.line, location.column));
            Visit::Continue
        })
        .unwrap();

        assert_eq!(lines, vec![(2, 25), (2, 35)]);
    }

    #[test]
    fn foreign_files_are_rejected() {
        let index = Index::default();
        let first = index.parse("main.c", SOURCE).unwrap();
        let second = index.parse("main.c", SOURCE).unwrap();

        let result = total_decl(&first).find_references_in_file(
            second.main_file(),
            &mut (),
            |_, _, _| Visit::Continue,
        );
        assert!(matches!(result, Err(EngineError::UnknownFile { file: 0 })));

        let result = Cursor::null().find_references_in_file(
            first.main_file(),
            &mut (),
            |_, _, _| Visit::Continue,
        );
        assert!(matches!(result, Err(EngineError::InvalidCursor)));
    }

    #[test]
    #[should_panic(expected = "visitor failed")]
    fn visitor_panics_resume_after_the_search() {
        let unit = Index::default().parse("main.c", SOURCE).unwrap();
        let _ = total_decl(&unit).find_references_in_file(
            unit.main_file(),
            &mut (),
            |_, _, _| panic!("visitor failed"),
        );
    }
}
