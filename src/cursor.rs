//! Syntax-tree nodes.

use crate::engine::{RawCursor, TranslationUnit};
use crate::location::{same_unit, SourceLocation};
use crate::range::SourceRange;
use std::fmt;

/// A node of a translation unit's syntax tree.
///
/// The null cursor is what annotation yields for a token no node owns. It
/// has no kind, an empty spelling and the null extent.
#[derive(Clone, Copy)]
pub struct Cursor<'tu> {
    unit: Option<&'tu TranslationUnit>,
    raw: RawCursor,
}

impl<'tu> Cursor<'tu> {
    pub(crate) fn new(unit: &'tu TranslationUnit, raw: RawCursor) -> Self {
        if raw.is_null() {
            return Self::null();
        }
        Self {
            unit: Some(unit),
            raw,
        }
    }

    pub fn null() -> Self {
        Self {
            unit: None,
            raw: RawCursor::NULL,
        }
    }

    pub fn raw(&self) -> RawCursor {
        self.raw
    }

    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    /// The grammar kind, such as `function_definition`; empty for null.
    pub fn kind(&self) -> &'static str {
        self.unit
            .and_then(|unit| unit.cursor_kind(self.raw))
            .unwrap_or("")
    }

    /// The field this node fills in its parent, such as `declarator`.
    pub fn field(&self) -> Option<&'static str> {
        self.unit.and_then(|unit| unit.cursor_field(self.raw))
    }

    pub fn is_named(&self) -> bool {
        self.unit.is_some_and(|unit| unit.cursor_is_named(self.raw))
    }

    pub fn extent(&self) -> SourceRange<'tu> {
        match self.unit {
            Some(unit) => SourceRange::from_raw(unit, unit.cursor_extent(self.raw)),
            None => SourceRange::null(),
        }
    }

    /// The first character of the node.
    pub fn location(&self) -> SourceLocation<'tu> {
        self.extent().start()
    }

    /// The name of the entity this node declares or refers to.
    pub fn spelling(&self) -> Option<&'tu str> {
        self.unit.and_then(|unit| unit.cursor_spelling(self.raw))
    }

    /// Source text the node covers.
    pub fn text(&self) -> &'tu str {
        self.unit
            .and_then(|unit| unit.cursor_text(self.raw))
            .unwrap_or("")
    }

    pub fn parent(&self) -> Option<Cursor<'tu>> {
        let unit = self.unit?;
        let parent = unit.cursor_parent(self.raw);
        (!parent.is_null()).then(|| Cursor::new(unit, parent))
    }

    pub fn children(&self) -> Vec<Cursor<'tu>> {
        let Some(unit) = self.unit else {
            return Vec::new();
        };
        unit.cursor_children(self.raw)
            .into_iter()
            .map(|raw| Cursor::new(unit, raw))
            .collect()
    }

    pub fn translation_unit(&self) -> Option<&'tu TranslationUnit> {
        self.unit
    }
}

impl PartialEq for Cursor<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && same_unit(self.unit, other.unit)
    }
}

impl Eq for Cursor<'_> {}

impl fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("Cursor(null)");
        }
        write!(f, "Cursor({} @ {})", self.kind(), self.extent())
    }
}

impl TranslationUnit {
    /// The root node of the main file.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(self, self.root_cursor(0))
    }

    /// The smallest named node at `location`.
    ///
    /// Null locations and locations of another unit give the null cursor.
    pub fn cursor_at<'tu>(&'tu self, location: SourceLocation<'tu>) -> Cursor<'tu> {
        if !same_unit(location.unit, Some(self)) {
            return Cursor::null();
        }
        Cursor::new(self, self.cursor_for_location(location.raw))
    }
}
