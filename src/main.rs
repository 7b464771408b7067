use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use sourcelens::config::{self, LensConfig, DEFAULT_FILE_NAME};
use sourcelens::{
    Cursor, Dialect, FindOutcome, SearchQuery, SourceLocation, SourceRange, Token, TokenKind,
    TranslationUnit, Visit,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sourcelens")]
#[command(about = "Correlate tokens, ranges and syntax nodes in C and C++ sources")]
#[command(long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./sourcelens.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Source dialect, overriding the config file
    #[arg(short, long, global = true, value_parser = parse_dialect)]
    dialect: Option<Dialect>,

    /// Leave comments out of token streams
    #[arg(long, global = true)]
    no_comments: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize a file, or one line of it
    Tokens {
        file: PathBuf,

        /// Only tokens starting on this 1-based line
        #[arg(short, long)]
        line: Option<u32>,

        /// Print one JSON record per token
        #[arg(long)]
        json: bool,
    },

    /// Show the syntax node owning each token
    Annotate {
        file: PathBuf,

        /// Print one JSON record per token
        #[arg(long)]
        json: bool,
    },

    /// Show the node at a location and the tokens inside it
    Extent {
        file: PathBuf,

        #[arg(short, long)]
        line: u32,

        #[arg(short, long)]
        column: u32,
    },

    /// Find references to the entity at a location, or query matches below it
    Find {
        file: PathBuf,

        #[arg(short, long)]
        line: u32,

        #[arg(short, long)]
        column: u32,

        /// Tree-sitter query; every capture is reported
        #[arg(short, long, conflicts_with = "pattern")]
        query: Option<String>,

        /// ast-grep pattern such as `$F($$$ARGS)`
        #[arg(short, long)]
        pattern: Option<String>,

        /// Stop after this many matches
        #[arg(long)]
        limit: Option<usize>,
    },
}

fn parse_dialect(value: &str) -> Result<Dialect, String> {
    Dialect::parse(value).ok_or_else(|| format!("unknown dialect '{value}' (expected c or cpp)"))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SOURCELENS_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let (mut config, base_dir) = load_config(cli.config.as_deref())?;
    if let Some(dialect) = cli.dialect {
        config.index.dialect = dialect;
    }
    if cli.no_comments {
        config.index.comments = false;
    }

    match cli.command {
        Commands::Tokens { file, line, json } => {
            let unit = parse_unit(&config, &base_dir, &file)?;
            cmd_tokens(&unit, line, json)
        }
        Commands::Annotate { file, json } => {
            let unit = parse_unit(&config, &base_dir, &file)?;
            cmd_annotate(&unit, json)
        }
        Commands::Extent { file, line, column } => {
            let unit = parse_unit(&config, &base_dir, &file)?;
            cmd_extent(&unit, line, column)
        }
        Commands::Find {
            file,
            line,
            column,
            query,
            pattern,
            limit,
        } => {
            let unit = parse_unit(&config, &base_dir, &file)?;
            let search = match (query, pattern) {
                (Some(query), _) => SearchQuery::Query(query),
                (None, Some(pattern)) => SearchQuery::Pattern(pattern),
                (None, None) => SearchQuery::References,
            };
            cmd_find(&unit, line, column, &search, limit)
        }
    }
}

/// Load the explicit config, or `sourcelens.toml` from the working
/// directory, or defaults. Includes resolve against the returned directory.
fn load_config(explicit: Option<&Path>) -> Result<(LensConfig, PathBuf)> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => {
            let fallback = PathBuf::from(DEFAULT_FILE_NAME);
            if !fallback.is_file() {
                return Ok((LensConfig::default(), PathBuf::from(".")));
            }
            fallback
        }
    };
    let config = config::load_from_path(&path)?;
    let base_dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    debug!(path = %path.display(), "loaded config");
    Ok((config, base_dir))
}

fn parse_unit(config: &LensConfig, base_dir: &Path, file: &Path) -> Result<TranslationUnit> {
    let source = fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let unsaved = config.unsaved_files(base_dir)?;
    let unit = config
        .index()
        .parse_with_unsaved(&file.display().to_string(), &source, &unsaved)?;
    if unit.has_errors() {
        eprintln!(
            "{}",
            format!("Warning: {} has syntax errors", file.display()).yellow()
        );
    }
    Ok(unit)
}

fn location_at<'tu>(
    unit: &'tu TranslationUnit,
    line: u32,
    column: u32,
) -> Result<SourceLocation<'tu>> {
    let location = unit.location(unit.main_file(), line, column);
    if location.is_null() {
        bail!("{}:{} is outside {}", line, column, unit.main_file().name());
    }
    Ok(location)
}

/// The range from the start of `line` to the start of the next one.
fn line_range(unit: &TranslationUnit, line: u32) -> Result<SourceRange<'_>> {
    let file = unit.main_file();
    let start = location_at(unit, line, 1)?;
    let next = unit.location(file, line + 1, 1);
    let end = if next.is_null() {
        file.extent().end()
    } else {
        next
    };
    Ok(SourceRange::new(start, end))
}

#[derive(Serialize)]
struct PointRecord {
    line: u32,
    column: u32,
    offset: u32,
}

#[derive(Serialize)]
struct ExtentRecord {
    file: String,
    start: PointRecord,
    end: PointRecord,
}

impl ExtentRecord {
    fn new(range: &SourceRange<'_>) -> Self {
        let point = |location: SourceLocation<'_>| {
            let resolved = location.file_location();
            PointRecord {
                line: resolved.line,
                column: resolved.column,
                offset: resolved.offset,
            }
        };
        Self {
            file: range
                .start()
                .file()
                .map_or_else(String::new, |file| file.name().to_string()),
            start: point(range.start()),
            end: point(range.end()),
        }
    }
}

#[derive(Serialize)]
struct TokenRecord<'a> {
    kind: TokenKind,
    spelling: &'a str,
    extent: ExtentRecord,
    #[serde(skip_serializing_if = "Option::is_none")]
    owner: Option<OwnerRecord>,
}

#[derive(Serialize)]
struct OwnerRecord {
    kind: &'static str,
    extent: Option<ExtentRecord>,
}

fn colored_kind(kind: TokenKind) -> colored::ColoredString {
    let name = format!("{:<11}", kind.name());
    match kind {
        TokenKind::Keyword => name.magenta(),
        TokenKind::Identifier => name.cyan(),
        TokenKind::Literal => name.green(),
        TokenKind::Comment => name.dimmed(),
        TokenKind::Punctuation => name.normal(),
    }
}

fn print_token(token: &Token<'_>) {
    println!(
        "{} {:<20} {}",
        colored_kind(token.kind()),
        token.spelling(),
        token.extent().to_string().dimmed()
    );
}

fn print_json<T: Serialize>(record: &T) -> Result<()> {
    println!("{}", serde_json::to_string(record)?);
    Ok(())
}

fn cmd_tokens(unit: &TranslationUnit, line: Option<u32>, json: bool) -> Result<()> {
    let range = match line {
        Some(line) => line_range(unit, line)?,
        None => unit.main_file().extent(),
    };
    let tokens = unit.tokenize(&range);

    for token in tokens.iter() {
        if json {
            print_json(&TokenRecord {
                kind: token.kind(),
                spelling: token.spelling(),
                extent: ExtentRecord::new(&token.extent()),
                owner: None,
            })?;
        } else {
            print_token(&token);
        }
    }
    if !json {
        println!("{}", format!("{} tokens", tokens.count()).dimmed());
    }
    tokens.dispose();
    Ok(())
}

fn cmd_annotate(unit: &TranslationUnit, json: bool) -> Result<()> {
    let tokens = unit.tokenize(&unit.main_file().extent());
    let owners = tokens.annotate();

    for (token, owner) in tokens.iter().zip(&owners) {
        if json {
            let extent = owner.extent();
            print_json(&TokenRecord {
                kind: token.kind(),
                spelling: token.spelling(),
                extent: ExtentRecord::new(&token.extent()),
                owner: Some(OwnerRecord {
                    kind: owner.kind(),
                    extent: (!extent.is_null()).then(|| ExtentRecord::new(&extent)),
                }),
            })?;
        } else {
            println!(
                "{} {:<20} {}",
                colored_kind(token.kind()),
                token.spelling(),
                owner.kind().bold()
            );
        }
    }
    Ok(())
}

fn cmd_extent(unit: &TranslationUnit, line: u32, column: u32) -> Result<()> {
    let cursor = unit.cursor_at(location_at(unit, line, column)?);
    if cursor.is_null() {
        bail!("no syntax node at {}:{}", line, column);
    }

    print_cursor(&cursor);
    for token in cursor.tokens() {
        print!("  ");
        print_token(&token);
    }
    Ok(())
}

fn print_cursor(cursor: &Cursor<'_>) {
    println!(
        "{} {} {}",
        cursor.kind().bold(),
        cursor.spelling().unwrap_or("").cyan(),
        cursor.extent().to_string().dimmed()
    );
}

fn cmd_find(
    unit: &TranslationUnit,
    line: u32,
    column: u32,
    query: &SearchQuery,
    limit: Option<usize>,
) -> Result<()> {
    let cursor = unit.cursor_at(location_at(unit, line, column)?);
    if cursor.is_null() {
        bail!("no syntax node at {}:{}", line, column);
    }
    let limit = limit.unwrap_or(usize::MAX);
    if limit == 0 {
        return Ok(());
    }

    let mut visits = 0usize;
    let print_match = |visits: &mut usize, found: Cursor<'_>, range: SourceRange<'_>| {
        *visits += 1;
        let first_line = found.text().lines().next().unwrap_or("");
        println!(
            "{} {} {}",
            range.start().to_string().cyan(),
            found.kind().bold(),
            first_line
        );
        if *visits >= limit {
            Visit::Stop
        } else {
            Visit::Continue
        }
    };
    let outcome = cursor.find_in_file(unit.main_file(), query, &mut visits, print_match)?;

    let summary = match outcome {
        FindOutcome::Completed => format!("{visits} matches"),
        FindOutcome::Stopped => format!("stopped after {visits} matches"),
    };
    println!("{}", summary.dimmed());
    Ok(())
}
