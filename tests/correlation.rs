//! End-to-end correlation of ranges, tokens and syntax nodes

use sourcelens::{
    find, queries, Dialect, FindOutcome, Index, SearchQuery, SourceRange, TokenKind, UnsavedFile,
    Visit,
};

const HEADER: &str = "#define LIMIT 10\nextern int limit_hits;\nint clamp(int value);\n";

const MAIN: &str = r#"#include "limits.h"

int limit_hits = 0;

int clamp(int value) {
    if (value > LIMIT) {
        limit_hits++;
        return LIMIT;
    }
    return value;
}
"#;

fn unit() -> sourcelens::TranslationUnit {
    Index::default()
        .parse_with_unsaved("clamp.c", MAIN, &[UnsavedFile::new("limits.h", HEADER)])
        .unwrap()
}

#[test]
fn test_tokens_of_a_statement_match_its_node() {
    let unit = unit();
    let location = unit.location(unit.main_file(), 7, 9);
    let identifier = unit.cursor_at(location);
    assert_eq!(identifier.spelling(), Some("limit_hits"));

    let statement = identifier
        .parent()
        .and_then(|p| p.parent())
        .unwrap();
    assert_eq!(statement.kind(), "expression_statement");

    let tokens = statement.tokens();
    let pairs: Vec<_> = tokens.iter().map(|t| (t.kind(), t.spelling())).collect();
    assert_eq!(
        pairs,
        vec![
            (TokenKind::Identifier, "limit_hits"),
            (TokenKind::Punctuation, "++"),
            (TokenKind::Punctuation, ";"),
        ]
    );
    assert_eq!(unit.live_token_batches(), 0);
}

#[test]
fn test_annotation_round_trips_through_extents() {
    let unit = unit();
    let tokens = unit.tokenize(&unit.main_file().extent());
    let owners = tokens.annotate();

    assert_eq!(owners.len(), tokens.count());
    for (token, owner) in tokens.iter().zip(&owners) {
        assert!(!owner.is_null(), "{token:?} has no owner");
        assert!(token.extent().is_inside(&owner.extent()));
        // The owner's own tokens include this one
        assert!(owner.tokens().iter().any(|t| t == &token));
    }
    drop(tokens);
    assert_eq!(unit.live_token_batches(), 0);
}

#[test]
fn test_range_of_one_function_excludes_neighbours() {
    let unit = unit();
    let clamp = unit.cursor().children()[2];
    assert_eq!(clamp.kind(), "function_definition");
    let extent = clamp.extent();

    let before = unit.cursor().children()[1].extent();
    assert!(before.intersect(&extent).is_null());
    assert!(!before.is_inside(&extent));

    let body_tokens = clamp.tokens();
    assert_eq!(body_tokens.first().map(|t| t.spelling()), Some("int"));
    assert_eq!(body_tokens.last().map(|t| t.spelling()), Some("}"));
    for token in &body_tokens {
        assert!(token.extent().is_inside(&extent));
    }
}

#[test]
fn test_header_declaration_finds_main_file_uses() {
    let unit = unit();
    let header = unit.file("limits.h").unwrap();
    let decl = unit.cursor_at(unit.location(header, 2, 12));
    assert_eq!(decl.spelling(), Some("limit_hits"));
    assert_eq!(decl.location().file(), Some(header));

    let mut lines = Vec::new();
    let outcome = decl
        .find_references_in_file(unit.main_file(), &mut lines, |lines, cursor, range| {
            assert_eq!(range, cursor.extent());
            lines.push(cursor.location().file_location().line);
            Visit::Continue
        })
        .unwrap();

    assert_eq!(outcome, FindOutcome::Completed);
    assert_eq!(lines, vec![3, 7]);
}

#[test]
fn test_ranges_from_two_files_never_intersect() {
    let unit = unit();
    let header = unit.file("limits.h").unwrap().extent();
    let main = unit.main_file().extent();

    assert!(header.intersect(&main).is_null());
    assert!(main.intersect(&header).is_null());
    assert!(SourceRange::null().intersect(&main).is_null());
}

#[test]
fn test_query_search_with_free_function() {
    let unit = unit();
    let mut names = Vec::new();

    let outcome = find(
        &unit.cursor(),
        unit.main_file(),
        &SearchQuery::Query(queries::function_by_name("clamp")),
        &mut names,
        |names, cursor, _| {
            names.push((cursor.kind(), cursor.spelling().unwrap_or("").to_string()));
            Visit::Continue
        },
    )
    .unwrap();

    assert_eq!(outcome, FindOutcome::Completed);
    names.sort();
    assert_eq!(
        names,
        vec![
            ("function_definition", "clamp".to_string()),
            ("identifier", "clamp".to_string()),
        ]
    );
}

#[test]
fn test_stop_after_first_assignment() {
    let unit = Index::new(Dialect::C)
        .parse("assign.c", "void f(void) { int a; a = 1; a = 2; a = 3; }\n")
        .unwrap();
    let mut seen = Vec::new();

    let outcome = find(
        &unit.cursor(),
        unit.main_file(),
        &SearchQuery::Query("(assignment_expression) @assignment".to_string()),
        &mut seen,
        |seen, cursor, _| {
            seen.push(cursor.text());
            Visit::Stop
        },
    )
    .unwrap();

    assert_eq!(outcome, FindOutcome::Stopped);
    assert_eq!(seen, vec!["a = 1"]);
}

#[test]
fn test_cpp_dialect_tokenizes_templates() {
    let unit = Index::new(Dialect::Cpp)
        .parse("box.cpp", "template <typename T> struct Box { T value; };\n")
        .unwrap();
    let tokens = unit.tokenize(&unit.main_file().extent());
    let keywords: Vec<_> = tokens
        .iter()
        .filter(|t| t.kind() == TokenKind::Keyword)
        .map(|t| t.spelling())
        .collect();

    assert_eq!(keywords, vec!["template", "typename", "struct"]);
}
