//! Plain-data handles exchanged with the engine.
//!
//! These mirror the shapes of a C indexing API: every handle is a small
//! `#[repr(C)]` value that only has meaning together with the
//! [`TranslationUnit`](super::TranslationUnit) that produced it.

use std::ffi::c_void;

/// File id used by null handles.
pub const NO_FILE: u32 = u32::MAX;

/// Raw token kind codes reported by [`TranslationUnit::token_kind`](super::TranslationUnit::token_kind).
pub mod token_kind {
    pub const PUNCTUATION: u32 = 0;
    pub const KEYWORD: u32 = 1;
    pub const IDENTIFIER: u32 = 2;
    pub const LITERAL: u32 = 3;
    pub const COMMENT: u32 = 4;
}

/// A point in one file of a translation unit.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawLocation {
    pub file: u32,
    pub offset: u32,
}

impl RawLocation {
    pub const NULL: RawLocation = RawLocation {
        file: NO_FILE,
        offset: 0,
    };

    pub fn is_null(&self) -> bool {
        self.file == NO_FILE
    }
}

/// A pair of locations. The end is exclusive.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawRange {
    pub begin: RawLocation,
    pub end: RawLocation,
}

impl RawRange {
    pub const NULL: RawRange = RawRange {
        begin: RawLocation::NULL,
        end: RawLocation::NULL,
    };

    pub fn is_null(&self) -> bool {
        *self == RawRange::NULL
    }
}

/// A reference to one node of a file's syntax tree.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawCursor {
    pub file: u32,
    pub node: u32,
}

impl RawCursor {
    pub const NULL: RawCursor = RawCursor {
        file: NO_FILE,
        node: u32::MAX,
    };

    pub fn is_null(&self) -> bool {
        self.file == NO_FILE
    }
}

/// A lexical token. Self-contained: reading it only needs the unit.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RawToken {
    pub kind: u32,
    pub file: u32,
    pub offset: u32,
    pub length: u32,
}

/// A location resolved to file, 1-based line and column, and byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawFileLocation {
    pub file: Option<u32>,
    pub line: u32,
    pub column: u32,
    pub offset: u32,
}

impl RawFileLocation {
    pub(crate) const NULL: RawFileLocation = RawFileLocation {
        file: None,
        line: 0,
        column: 0,
        offset: 0,
    };
}

/// What a visitor callback tells the engine to do next.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitSignal {
    Break = 0,
    Continue = 1,
}

/// Callback invoked by the engine for every search match.
pub type RawVisitFn = unsafe extern "C" fn(*mut c_void, RawCursor, RawRange) -> VisitSignal;

/// Context pointer plus callback, handed to
/// [`TranslationUnit::find_in_file`](super::TranslationUnit::find_in_file).
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawVisitor {
    pub context: *mut c_void,
    pub visit: Option<RawVisitFn>,
}
