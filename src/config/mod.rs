//! Per-invocation settings for the command-line tool.

pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError, DEFAULT_FILE_NAME};
pub use schema::{IndexSection, LensConfig, ValidationError, ValidationIssue};
