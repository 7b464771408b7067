use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("failed to set language for parser")]
    LanguageSet,

    #[error("failed to parse {name}")]
    ParseFailed { name: String },

    #[error("{name} is {len} bytes, offsets are limited to 32 bits")]
    FileTooLarge { name: String, len: usize },

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid tree-sitter query: {message}")]
    InvalidQuery { message: String },

    #[error("invalid ast-grep pattern: {message}")]
    InvalidPattern { message: String },

    #[error("cursor does not refer to a node of this translation unit")]
    InvalidCursor,

    #[error("file id {file} is not part of this translation unit")]
    UnknownFile { file: u32 },

    #[error("cursor of kind '{kind}' does not name an entity")]
    NoReferencedName { kind: String },

    #[error("visitor record has no callback")]
    MissingVisitor,
}
