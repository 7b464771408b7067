use crate::config::loader::ConfigError;
use crate::engine::{Dialect, Index, UnsavedFile};
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LensConfig {
    #[serde(default)]
    pub index: IndexSection,
    /// Files added to every translation unit as unsaved files.
    #[serde(default)]
    pub include: Vec<PathBuf>,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct IndexSection {
    #[serde(default)]
    pub dialect: Dialect,
    #[serde(default = "default_comments")]
    pub comments: bool,
}

fn default_comments() -> bool {
    true
}

impl Default for IndexSection {
    fn default() -> Self {
        Self {
            dialect: Dialect::default(),
            comments: default_comments(),
        }
    }
}

impl LensConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for path in &self.include {
            if path.as_os_str().is_empty() {
                issues.push(ValidationIssue::EmptyInclude);
            } else if !seen.insert(path) {
                issues.push(ValidationIssue::DuplicateInclude { path: path.clone() });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    pub fn index(&self) -> Index {
        Index::new(self.index.dialect).with_comments(self.index.comments)
    }

    /// Read every include, resolving relative paths against `base_dir`.
    ///
    /// Each file is named by its path as written in the config.
    pub fn unsaved_files(&self, base_dir: &Path) -> Result<Vec<UnsavedFile>, ConfigError> {
        self.include
            .iter()
            .map(|include| {
                let path = base_dir.join(include);
                let contents = fs::read_to_string(&path)
                    .map_err(|source| ConfigError::Include { path, source })?;
                Ok(UnsavedFile::new(include.to_string_lossy(), contents))
            })
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyInclude,
    DuplicateInclude { path: PathBuf },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyInclude => write!(f, "include entry is empty"),
            ValidationIssue::DuplicateInclude { path } => {
                write!(f, "include '{}' is listed more than once", path.display())
            }
        }
    }
}
