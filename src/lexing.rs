use logos::Logos;

use crate::{
    Body,
    error::{FormatFailure, GrammarError},
};

/// Right-hand side tokens that stand for the empty string rather than for a symbol.
pub(crate) const EPSILON_MARKERS: [&str; 5] = ["ε", "ϵ", "Є", "$", "epsilon"];

const ARROWS: [&str; 2] = ["->", "→"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Logos)]
#[logos(skip r"\s+")]
enum RhsToken<'a> {
    #[token("|")]
    Alternation,
    #[regex(r"[^\s|]+")]
    Symbol(&'a str),
}

/// Splits on whichever arrow occurs first.
fn split_arrow(line: &str) -> Option<(&str, &str)> {
    ARROWS
        .iter()
        .filter_map(|arrow| line.find(arrow).map(|at| (at, arrow.len())))
        .min_by_key(|(at, _)| *at)
        .map(|(at, len)| (&line[..at], &line[at + len..]))
}

fn split_sides(line: &str) -> Result<(&str, &str), GrammarError> {
    let (left, right) =
        split_arrow(line).ok_or_else(|| GrammarError::format(line, FormatFailure::MissingArrow))?;
    let left = left.trim();
    if left.is_empty() {
        return Err(GrammarError::format(line, FormatFailure::EmptyLeftSide));
    }
    Ok((left, right))
}

fn tokenize<'a>(line: &str, right: &'a str) -> Result<Vec<RhsToken<'a>>, GrammarError> {
    RhsToken::lexer(right)
        .map(|token| token.map_err(|()| GrammarError::format(line, FormatFailure::UnlexableSymbol)))
        .collect()
}

/// Parses a single `A -> x y z` line into its left symbol and right-hand side.
///
/// Either `->` or `→` separates the sides. The right side is split on whitespace;
/// epsilon markers such as `ε` are dropped, so `S -> ε` and `S ->` both give an empty body.
/// A `|` is not special here, callers are expected to run [`expand_alternatives`] first.
pub fn parse_production_line(line: &str) -> Result<(String, Body), GrammarError> {
    parse_production_line_declared(line, |_| false)
}

/// Like [`parse_production_line`], but an epsilon marker for which `declared` holds
/// is kept as an ordinary symbol.
pub(crate) fn parse_production_line_declared(
    line: &str,
    declared: impl Fn(&str) -> bool,
) -> Result<(String, Body), GrammarError> {
    let (left, right) = split_sides(line)?;

    let body = tokenize(line, right)?
        .into_iter()
        .filter_map(|token| match token {
            RhsToken::Symbol(s) if EPSILON_MARKERS.contains(&s) && !declared(s) => None,
            RhsToken::Symbol(s) => Some(s.to_owned()),
            RhsToken::Alternation => Some("|".to_owned()),
        })
        .collect();

    Ok((left.to_owned(), body))
}

/// Rewrites `A -> x | y` into one line per alternative, `["A -> x", "A -> y"]`.
///
/// Lines without a `|` come back unchanged.
pub fn expand_alternatives(line: &str) -> Result<Vec<String>, GrammarError> {
    let (left, right) = split_sides(line)?;
    let tokens = tokenize(line, right)?;

    if !tokens.contains(&RhsToken::Alternation) {
        return Ok(vec![line.to_owned()]);
    }

    let lines = tokens
        .split(|t| *t == RhsToken::Alternation)
        .map(|alternative| {
            let symbols: Vec<&str> = alternative
                .iter()
                .filter_map(|t| match t {
                    RhsToken::Symbol(s) => Some(*s),
                    RhsToken::Alternation => None,
                })
                .collect();
            format!("{left} -> {}", symbols.join(" "))
        })
        .collect();
    Ok(lines)
}

#[cfg(test)]
mod test {
    use insta::assert_compact_debug_snapshot;

    use super::{expand_alternatives, parse_production_line, parse_production_line_declared};
    use crate::error::{FormatFailure, GrammarError};

    #[test]
    fn basic_line() {
        let parsed = parse_production_line("S -> a S b").unwrap();
        assert_compact_debug_snapshot!(parsed, @r#"("S", ["a", "S", "b"])"#);
    }

    #[test]
    fn unicode_arrow_and_ragged_spacing() {
        let parsed = parse_production_line("  Expr →   Term\t+  Expr ").unwrap();
        assert_compact_debug_snapshot!(parsed, @r#"("Expr", ["Term", "+", "Expr"])"#);
    }

    #[test]
    fn arrow_without_spaces() {
        let parsed = parse_production_line("A->B c").unwrap();
        assert_compact_debug_snapshot!(parsed, @r#"("A", ["B", "c"])"#);
    }

    #[test]
    fn epsilon_forms() {
        for line in ["S -> ε", "S ->", "S -> epsilon", "S → $"] {
            let (left, body) = parse_production_line(line).unwrap();
            assert_eq!(left, "S");
            assert!(body.is_empty(), "{line} gave {body:?}");
        }
    }

    #[test]
    fn declared_markers_are_symbols() {
        let declared = |s: &str| s == "$" || s == "epsilon";
        let parsed = parse_production_line_declared("S -> a $ ε epsilon", declared).unwrap();
        assert_compact_debug_snapshot!(parsed, @r#"("S", ["a", "$", "epsilon"])"#);
    }

    #[test]
    fn missing_arrow() {
        for line in ["S a b", "", "   "] {
            let err = parse_production_line(line).unwrap_err();
            assert!(
                matches!(
                    err,
                    GrammarError::Format {
                        reason: FormatFailure::MissingArrow,
                        ..
                    }
                ),
                "{err}"
            );
        }
    }

    #[test]
    fn empty_left_side() {
        let err = parse_production_line(" -> a").unwrap_err();
        assert!(matches!(
            err,
            GrammarError::Format {
                reason: FormatFailure::EmptyLeftSide,
                line_no: None,
                ..
            }
        ));
    }

    #[test]
    fn expands_alternatives() {
        let lines = expand_alternatives("S -> a | b").unwrap();
        assert_compact_debug_snapshot!(lines, @r#"["S -> a", "S -> b"]"#);
    }

    #[test]
    fn expands_empty_alternative() {
        let lines = expand_alternatives("S → a S b|").unwrap();
        assert_compact_debug_snapshot!(lines, @r#"["S -> a S b", "S -> "]"#);
    }

    #[test]
    fn single_alternative_untouched() {
        let lines = expand_alternatives("S → a").unwrap();
        assert_compact_debug_snapshot!(lines, @r#"["S → a"]"#);
    }

    #[test]
    fn expand_rejects_missing_arrow() {
        assert!(expand_alternatives("S | a").is_err());
    }
}
