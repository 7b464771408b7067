use crate::engine::errors::EngineError;
use crate::engine::pool::with_parser;
use crate::engine::unit::{SourceFile, TranslationUnit};
use ast_grep_language::{LanguageExt, SupportLang};
use serde::Deserialize;
use std::path::Path;
use tracing::debug;
use tree_sitter::{Parser, Tree};

/// Source language of a translation unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    C,
    Cpp,
}

impl Dialect {
    /// Parse a dialect name as accepted on the command line.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "c" => Some(Dialect::C),
            "cpp" | "c++" | "cxx" => Some(Dialect::Cpp),
            _ => None,
        }
    }

    /// The ast-grep language carrying this dialect's grammar.
    pub fn support_lang(self) -> SupportLang {
        match self {
            Dialect::C => SupportLang::C,
            Dialect::Cpp => SupportLang::Cpp,
        }
    }
}

/// Tree-sitter parser wrapper for one dialect.
pub struct SourceParser {
    parser: Parser,
    dialect: Dialect,
}

impl SourceParser {
    pub fn new(dialect: Dialect) -> Result<Self, EngineError> {
        let mut parser = Parser::new();
        // Get the tree-sitter Language from ast-grep-language
        let ts_lang = dialect.support_lang().get_ts_language();
        parser
            .set_language(&ts_lang)
            .map_err(|_| EngineError::LanguageSet)?;

        Ok(Self { parser, dialect })
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Parse source code into a tree-sitter Tree.
    pub fn parse(&mut self, name: &str, source: &str) -> Result<Tree, EngineError> {
        self.parser
            .parse(source, None)
            .ok_or_else(|| EngineError::ParseFailed {
                name: name.to_string(),
            })
    }
}

/// An in-memory file added to a translation unit next to the main file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsavedFile {
    pub name: String,
    pub contents: String,
}

impl UnsavedFile {
    pub fn new(name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// Shared parse settings for a set of translation units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index {
    dialect: Dialect,
    comments: bool,
}

impl Index {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            comments: true,
        }
    }

    /// Whether comments are lexed as tokens (on by default).
    pub fn with_comments(mut self, comments: bool) -> Self {
        self.comments = comments;
        self
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn parse(&self, name: &str, source: &str) -> Result<TranslationUnit, EngineError> {
        self.parse_with_unsaved(name, source, &[])
    }

    /// Parse a main file together with extra in-memory files.
    ///
    /// The main file gets file id 0, unsaved files follow in order.
    pub fn parse_with_unsaved(
        &self,
        name: &str,
        source: &str,
        unsaved: &[UnsavedFile],
    ) -> Result<TranslationUnit, EngineError> {
        let mut files = Vec::with_capacity(1 + unsaved.len());
        files.push(self.load(0, name, source)?);
        for file in unsaved {
            let id = files.len() as u32;
            files.push(self.load(id, &file.name, &file.contents)?);
        }

        debug!(
            main = name,
            files = files.len(),
            dialect = ?self.dialect,
            "parsed translation unit"
        );
        Ok(TranslationUnit::new(self.dialect, files))
    }

    pub fn parse_file(&self, path: &Path) -> Result<TranslationUnit, EngineError> {
        let source = std::fs::read_to_string(path).map_err(|e| EngineError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.parse(&path.display().to_string(), &source)
    }

    fn load(&self, id: u32, name: &str, source: &str) -> Result<SourceFile, EngineError> {
        if u32::try_from(source.len()).is_err() {
            return Err(EngineError::FileTooLarge {
                name: name.to_string(),
                len: source.len(),
            });
        }
        let tree = with_parser(self.dialect, |parser| parser.parse(name, source))??;
        Ok(SourceFile::new(id, name, source, tree, self.comments))
    }
}

impl Default for Index {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}
