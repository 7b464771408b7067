//! Files and points inside a translation unit.

use crate::engine::{RawLocation, TranslationUnit};
use crate::range::SourceRange;
use std::fmt;
use std::ptr;

pub(crate) fn same_unit(a: Option<&TranslationUnit>, b: Option<&TranslationUnit>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => ptr::eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

/// A file of a translation unit: the main file or one of its unsaved files.
#[derive(Clone, Copy)]
pub struct File<'tu> {
    unit: &'tu TranslationUnit,
    id: u32,
}

impl<'tu> File<'tu> {
    pub fn name(&self) -> &'tu str {
        self.unit.file_name(self.id).unwrap_or("")
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn contents(&self) -> &'tu str {
        self.unit.file_text(self.id).unwrap_or("")
    }

    /// The range covering the whole file.
    pub fn extent(&self) -> SourceRange<'tu> {
        SourceRange::from_raw(self.unit, self.unit.file_extent(self.id))
    }

    pub fn translation_unit(&self) -> &'tu TranslationUnit {
        self.unit
    }

    pub(crate) fn belongs_to(&self, unit: &TranslationUnit) -> bool {
        ptr::eq(self.unit, unit)
    }
}

impl PartialEq for File<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.unit, other.unit) && self.id == other.id
    }
}

impl Eq for File<'_> {}

impl fmt::Debug for File<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("File").field(&self.name()).finish()
    }
}

/// A location resolved to file, 1-based line and column, and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileLocation<'tu> {
    pub file: Option<File<'tu>>,
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

/// An opaque point in a source file.
///
/// Locations are views into their translation unit and cannot outlive it.
/// Two locations in different files have no order.
#[derive(Clone, Copy)]
pub struct SourceLocation<'tu> {
    pub(crate) unit: Option<&'tu TranslationUnit>,
    pub(crate) raw: RawLocation,
}

impl<'tu> SourceLocation<'tu> {
    /// The null location, which belongs to no file.
    pub fn null() -> Self {
        Self {
            unit: None,
            raw: RawLocation::NULL,
        }
    }

    pub(crate) fn from_raw(unit: &'tu TranslationUnit, raw: RawLocation) -> Self {
        if raw.is_null() {
            return Self::null();
        }
        Self {
            unit: Some(unit),
            raw,
        }
    }

    pub fn is_null(&self) -> bool {
        self.raw.is_null()
    }

    pub fn raw(&self) -> RawLocation {
        self.raw
    }

    pub fn file_location(&self) -> FileLocation<'tu> {
        let Some(unit) = self.unit else {
            return FileLocation {
                file: None,
                line: 0,
                column: 0,
                offset: 0,
            };
        };
        let resolved = unit.resolve_location(self.raw);
        FileLocation {
            file: resolved.file.map(|id| File { unit, id }),
            line: resolved.line,
            column: resolved.column,
            offset: resolved.offset,
        }
    }

    pub fn file(&self) -> Option<File<'tu>> {
        self.file_location().file
    }

    pub fn offset(&self) -> u32 {
        self.file_location().offset
    }
}

impl PartialEq for SourceLocation<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw && same_unit(self.unit, other.unit)
    }
}

impl Eq for SourceLocation<'_> {}

impl fmt::Display for SourceLocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return f.write_str("null");
        }
        let loc = self.file_location();
        let name = loc.file.map_or("", |file| file.name());
        write!(f, "{}:{}:{}({})", name, loc.line, loc.column, loc.offset)
    }
}

impl fmt::Debug for SourceLocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SourceLocation({self})")
    }
}

impl TranslationUnit {
    pub fn main_file(&self) -> File<'_> {
        File { unit: self, id: 0 }
    }

    pub fn file(&self, name: &str) -> Option<File<'_>> {
        self.lookup_file(name).map(|id| File { unit: self, id })
    }

    pub fn files(&self) -> Vec<File<'_>> {
        (0..self.file_count() as u32)
            .map(|id| File { unit: self, id })
            .collect()
    }

    /// Location of a 1-based line and column in `file`; null when the line
    /// does not exist or `file` belongs to another unit.
    pub fn location<'tu>(
        &'tu self,
        file: File<'tu>,
        line: u32,
        column: u32,
    ) -> SourceLocation<'tu> {
        if !file.belongs_to(self) {
            return SourceLocation::null();
        }
        SourceLocation::from_raw(self, self.location_at(file.id, line, column))
    }

    pub fn location_for_offset<'tu>(
        &'tu self,
        file: File<'tu>,
        offset: u32,
    ) -> SourceLocation<'tu> {
        if !file.belongs_to(self) {
            return SourceLocation::null();
        }
        SourceLocation::from_raw(self, self.location_at_offset(file.id, offset))
    }
}
