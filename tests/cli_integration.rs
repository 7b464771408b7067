//! Integration tests for the command-line interface

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const SOURCE: &str = r#"#include "util.h"

int total = 0;

void add(int n) {
    total = total + n; // accumulate
}

int main(void) {
    add(1);
    add(helper());
    return total;
}
"#;

fn setup_workspace() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("main.c"), SOURCE).unwrap();
    let header = dir.path().join("util.h");
    fs::write(header, "int helper(void);\n").unwrap();
    dir
}

fn run(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sourcelens"))
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("SOURCELENS_LOG")
        .args(args)
        .output()
        .unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help_lists_commands() {
    let dir = setup_workspace();
    let output = run(dir.path(), &["--help"]);

    assert!(output.status.success());
    let text = stdout(&output);
    for command in ["tokens", "annotate", "extent", "find"] {
        assert!(text.contains(command), "missing {command} in help");
    }
}

#[test]
fn test_tokens_json_for_one_line() {
    let dir = setup_workspace();
    let output = run(dir.path(), &["tokens", "main.c", "--line", "3", "--json"]);

    assert!(output.status.success());
    let records: Vec<serde_json::Value> = stdout(&output)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let spellings: Vec<_> = records
        .iter()
        .map(|r| r["spelling"].as_str().unwrap())
        .collect();
    assert_eq!(spellings, vec!["int", "total", "=", "0", ";"]);
    assert_eq!(records[0]["kind"], "keyword");
    assert_eq!(records[1]["extent"]["start"]["line"], 3);
    assert_eq!(records[1]["extent"]["start"]["column"], 5);
    assert_eq!(records[1]["extent"]["file"], "main.c");
}

#[test]
fn test_tokens_respects_no_comments() {
    let dir = setup_workspace();

    let with = stdout(&run(dir.path(), &["tokens", "main.c", "--line", "6"]));
    assert!(with.contains("// accumulate"));

    let without = stdout(&run(dir.path(), &["--no-comments", "tokens", "main.c", "--line", "6"]));
    assert!(!without.contains("// accumulate"));
}

#[test]
fn test_annotate_reports_owners() {
    let dir = setup_workspace();
    let output = run(dir.path(), &["annotate", "main.c", "--json"]);

    assert!(output.status.success());
    let records: Vec<serde_json::Value> = stdout(&output)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let ret = records
        .iter()
        .find(|r| r["spelling"] == "return")
        .unwrap();
    assert_eq!(ret["owner"]["kind"], "return_statement");
    assert_eq!(ret["owner"]["extent"]["start"]["line"], 12);
}

#[test]
fn test_extent_lists_tokens_inside() {
    let dir = setup_workspace();
    let output = run(dir.path(), &["extent", "main.c", "--line", "10", "--column", "5"]);

    assert!(output.status.success());
    let text = stdout(&output);
    let first = text.lines().next().unwrap();
    assert!(first.starts_with("identifier add main.c:10:5(114)"), "{first}");
}

#[test]
fn test_find_references_with_limit() {
    let dir = setup_workspace();

    let all = stdout(&run(dir.path(), &["find", "main.c", "--line", "3", "--column", "5"]));
    assert_eq!(all.lines().filter(|l| l.contains("identifier")).count(), 4);
    assert!(all.contains("4 matches"));

    let limited = stdout(&run(
        dir.path(),
        &["find", "main.c", "--line", "3", "--column", "5", "--limit", "2"],
    ));
    assert!(limited.contains("stopped after 2 matches"));
}

#[test]
fn test_find_pattern_below_cursor() {
    let dir = setup_workspace();
    let output = run(
        dir.path(),
        &[
            "find", "main.c", "--line", "9", "--column", "16", "--pattern", "add($ARG);",
        ],
    );

    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("main.c:10:5(114) expression_statement add(1);"));
    assert!(text.contains("2 matches"));
}

#[test]
fn test_find_rejects_empty_pattern() {
    let dir = setup_workspace();
    let output = run(
        dir.path(),
        &["find", "main.c", "--line", "3", "--column", "5", "--pattern", ""],
    );

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid ast-grep pattern"), "{stderr}");
    assert!(!stderr.contains("panicked"), "{stderr}");
}

#[test]
fn test_config_file_adds_includes() {
    let dir = setup_workspace();
    fs::write(
        dir.path().join("sourcelens.toml"),
        "include = [\"util.h\"]\n\n[index]\ndialect = \"c\"\n",
    )
    .unwrap();

    // The query runs in main.c; the header only has to parse alongside it
    let output = run(dir.path(), &["tokens", "main.c", "--line", "1"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
}

#[test]
fn test_missing_include_is_named() {
    let dir = setup_workspace();
    let config = dir.path().join("sourcelens.toml");
    fs::write(config, "include = [\"gone.h\"]\n").unwrap();

    let output = run(dir.path(), &["tokens", "main.c"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to read include"), "{stderr}");
    assert!(stderr.contains("gone.h"), "{stderr}");
}

#[test]
fn test_invalid_config_fails() {
    let dir = setup_workspace();
    fs::write(
        dir.path().join("custom.toml"),
        "include = [\"util.h\", \"util.h\"]\n",
    )
    .unwrap();

    let output = run(dir.path(), &["--config", "custom.toml", "tokens", "main.c"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("listed more than once"), "{stderr}");
}

#[test]
fn test_location_outside_file_fails() {
    let dir = setup_workspace();
    let output = run(dir.path(), &["extent", "main.c", "--line", "99", "--column", "1"]);

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("outside main.c"));
}

#[test]
fn test_unknown_dialect_is_rejected() {
    let dir = setup_workspace();
    let output = run(dir.path(), &["--dialect", "rust", "tokens", "main.c"]);

    assert!(!output.status.success());
}
