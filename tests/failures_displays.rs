use std::path::PathBuf;

use cfg_toolkit::{FormatFailure, Grammar, GrammarError, GrammarKind, load_grammar};
use insta::assert_compact_debug_snapshot;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

#[test]
fn missing_arrow() {
    let err = Grammar::from_text(["S"], ["a"], ["S a b"], "S", GrammarKind::ContextFree)
        .unwrap_err();

    println!("{err}");
    insta::assert_snapshot!(err, @"line 1: `S a b`: expected `->` or `→` between the left and right side");
}

#[test]
fn empty_left_side() {
    let srcs = ["-> a", "  → a b"];
    for src in srcs {
        let err = Grammar::from_text(["S"], ["a", "b"], [src], "S", GrammarKind::ContextFree)
            .unwrap_err();

        println!("{err}");
        assert!(matches!(
            err,
            GrammarError::Format {
                line_no: Some(1),
                reason: FormatFailure::EmptyLeftSide,
                ..
            }
        ));
    }
}

#[test]
fn empty_line_is_not_skipped() {
    let err = Grammar::from_text(
        ["S"],
        ["a"],
        ["S -> a", "", "S -> a a"],
        "S",
        GrammarKind::ContextFree,
    )
    .unwrap_err();

    println!("{err}");
    assert_compact_debug_snapshot!(
        err,
        @r#"Format { line_no: Some(2), line: "", reason: MissingArrow }"#
    );
    assert!(err.report().is_none());
}

#[test]
fn report_points_at_the_line() {
    let err = Grammar::from_text(["S"], ["a"], ["S -> a", "S a a"], "S", GrammarKind::ContextFree)
        .unwrap_err();
    let report = err.report().unwrap();

    println!("{report}");
    assert!(report.contains("MissingArrow"));
    assert!(report.contains("malformed production on line 2"));
    assert!(report.contains("S a a"));
    assert!(report.contains(FormatFailure::MissingArrow.message()));
}

#[test]
fn broken_file() {
    let err = load_grammar(data("broken.json")).unwrap_err();

    println!("{err}");
    insta::assert_snapshot!(err, @"line 2: `S a a`: expected `->` or `→` between the left and right side");
}

#[test]
fn file_without_start_symbol() {
    let err = load_grammar(data("no_start.json")).unwrap_err();

    println!("{err}");
    insta::assert_snapshot!(err, @"grammar record has no `S0` entry");
}

#[test]
fn not_json() {
    let err = Grammar::from_json("N = {S}").unwrap_err();

    println!("{err}");
    assert!(matches!(err, GrammarError::Json(_)));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn missing_file() {
    let err = load_grammar(data("does_not_exist.json")).unwrap_err();

    println!("{err}");
    assert!(matches!(err, GrammarError::Io(_)));
}
