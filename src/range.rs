//! Half-open source ranges and their arithmetic.

use crate::engine::{RawRange, TranslationUnit};
use crate::location::{same_unit, SourceLocation};
use std::fmt;

/// A half-open character range: includes `start`, excludes `end`.
///
/// Ranges are plain values tied to their translation unit. The null range
/// is a sentinel made by [`SourceRange::null`]; it never equals a real
/// range.
#[derive(Clone, Copy)]
pub struct SourceRange<'tu> {
    unit: Option<&'tu TranslationUnit>,
    raw: RawRange,
}

impl<'tu> SourceRange<'tu> {
    /// The null (invalid) range.
    pub fn null() -> Self {
        Self {
            unit: None,
            raw: RawRange::NULL,
        }
    }

    /// A range from two locations.
    ///
    /// The order of `start` and `end` is not checked. Locations from
    /// different translation units give the null range.
    pub fn new(start: SourceLocation<'tu>, end: SourceLocation<'tu>) -> Self {
        if !same_unit(start.unit, end.unit) {
            return Self::null();
        }
        Self {
            unit: start.unit,
            raw: RawRange {
                begin: start.raw,
                end: end.raw,
            },
        }
    }

    pub(crate) fn from_raw(unit: &'tu TranslationUnit, raw: RawRange) -> Self {
        if raw.is_null() {
            return Self::null();
        }
        Self {
            unit: Some(unit),
            raw,
        }
    }

    pub fn raw(&self) -> RawRange {
        self.raw
    }

    pub(crate) fn unit(&self) -> Option<&'tu TranslationUnit> {
        self.unit
    }

    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    /// Value equality of the two ranges.
    pub fn is_equal(&self, other: &SourceRange<'tu>) -> bool {
        self == other
    }

    /// The first character within the range.
    pub fn start(&self) -> SourceLocation<'tu> {
        SourceLocation {
            unit: self.unit,
            raw: self.raw.begin,
        }
    }

    /// The location just past the last character within the range.
    pub fn end(&self) -> SourceLocation<'tu> {
        SourceLocation {
            unit: self.unit,
            raw: self.raw.end,
        }
    }

    /// The overlap of two ranges, or the null range.
    ///
    /// Start and end points are compared by byte offset, and each pair must
    /// agree on its file; a pair in different files makes the result null.
    /// Ties keep the endpoint of `self`.
    pub fn intersect(&self, other: &SourceRange<'tu>) -> SourceRange<'tu> {
        let mine = self.start().file_location();
        let theirs = other.start().file_location();
        if mine.file != theirs.file {
            return SourceRange::null();
        }
        let (start, start_loc) = if mine.offset < theirs.offset {
            (theirs.offset, other.start())
        } else {
            (mine.offset, self.start())
        };

        let mine = self.end().file_location();
        let theirs = other.end().file_location();
        if mine.file != theirs.file {
            return SourceRange::null();
        }
        let (end, end_loc) = if mine.offset > theirs.offset {
            (theirs.offset, other.end())
        } else {
            (mine.offset, self.end())
        };

        if start < end {
            SourceRange::new(start_loc, end_loc)
        } else {
            SourceRange::null()
        }
    }

    /// Whether `self` lies entirely within `outer`.
    pub fn is_inside(&self, outer: &SourceRange<'tu>) -> bool {
        self.intersect(outer) == *self
    }
}

impl PartialEq for SourceRange<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && same_unit(self.unit, other.unit)
    }
}

impl Eq for SourceRange<'_> {}

impl fmt::Display for SourceRange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("null");
        }
        let start = self.start().file_location();
        let name = start.file.map_or("", |file| file.name());
        write!(
            f,
            "{}:{}:{}({})",
            name, start.line, start.column, start.offset
        )?;
        let end = self.end().file_location();
        write!(f, " - :{}:{}({})", end.line, end.column, end.offset)
    }
}

impl fmt::Debug for SourceRange<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceRange({self})")
    }
}
