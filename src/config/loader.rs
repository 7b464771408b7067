use crate::config::schema::{LensConfig, ValidationError};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Looked up in the working directory when no `--config` is given.
pub const DEFAULT_FILE_NAME: &str = "sourcelens.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse config TOML{}: {source}", located(.path))]
    Toml {
        path: Option<PathBuf>,
        #[source]
        source: toml_edit::de::Error,
    },

    #[error("invalid config{}: {source}", located(.path))]
    Validation {
        path: Option<PathBuf>,
        #[source]
        source: ValidationError,
    },

    /// An `include` entry that could not be read.
    #[error("failed to read include {}: {source}", .path.display())]
    Include {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn located(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|path| format!(" ({})", path.display()))
        .unwrap_or_default()
}

pub fn load_from_str(input: &str) -> Result<LensConfig, ConfigError> {
    parse(input, None)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<LensConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse(&contents, Some(path))
}

/// Deserialize and validate, attributing failures to `origin` when the
/// input came from a file.
fn parse(input: &str, origin: Option<&Path>) -> Result<LensConfig, ConfigError> {
    let path = || origin.map(Path::to_path_buf);
    let config: LensConfig =
        toml_edit::de::from_str(input).map_err(|source| ConfigError::Toml {
            path: path(),
            source,
        })?;
    config.validate().map_err(|source| ConfigError::Validation {
        path: path(),
        source,
    })?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidationIssue;
    use crate::engine::Dialect;

    #[test]
    fn empty_input_uses_defaults() {
        let config = load_from_str("").unwrap();

        assert_eq!(config, LensConfig::default());
        assert_eq!(config.index.dialect, Dialect::C);
        assert!(config.index.comments);
    }

    #[test]
    fn reads_every_setting() {
        let config = load_from_str(
            r#"
include = ["include/util.h", "config.h"]

[index]
dialect = "cpp"
comments = false
"#,
        )
        .unwrap();

        assert_eq!(config.index.dialect, Dialect::Cpp);
        assert!(!config.index.comments);
        assert_eq!(
            config.include,
            vec![PathBuf::from("include/util.h"), PathBuf::from("config.h")]
        );
        assert_eq!(config.index().dialect(), Dialect::Cpp);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = load_from_str("[index]\nlanguage = \"c\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Toml { path: None, .. }));
    }

    #[test]
    fn duplicate_and_empty_includes_fail_validation() {
        let err = load_from_str(r#"include = ["a.h", "", "a.h"]"#).unwrap_err();
        let ConfigError::Validation { source, .. } = err else {
            panic!("expected validation error, got {err}");
        };

        assert_eq!(
            source.issues,
            vec![
                ValidationIssue::EmptyInclude,
                ValidationIssue::DuplicateInclude {
                    path: PathBuf::from("a.h")
                },
            ]
        );
    }

    #[test]
    fn path_errors_carry_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_FILE_NAME);
        fs::write(&path, "include = [\"x.h\", \"x.h\"]\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(err.to_string().contains(DEFAULT_FILE_NAME));

        let missing = load_from_path(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn includes_become_unsaved_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("include")).unwrap();
        let header = dir.path().join("include/util.h");
        fs::write(header, "int util(void);\n").unwrap();
        let config = load_from_str(r#"include = ["include/util.h"]"#).unwrap();

        let files = config.unsaved_files(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "include/util.h");
        assert_eq!(files[0].contents, "int util(void);\n");
    }

    #[test]
    fn missing_include_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from_str(r#"include = ["include/gone.h"]"#).unwrap();

        let err = config.unsaved_files(dir.path()).unwrap_err();
        let ConfigError::Include { path, .. } = &err else {
            panic!("expected include error, got {err}");
        };
        assert_eq!(path, &dir.path().join("include/gone.h"));
        assert!(err.to_string().contains("include/gone.h"), "{err}");
    }

    #[test]
    fn string_input_errors_have_no_path() {
        let err = load_from_str("include = 3").unwrap_err();

        assert!(matches!(err, ConfigError::Toml { path: None, .. }));
        assert!(err.to_string().starts_with("failed to parse config TOML: "));
    }
}
