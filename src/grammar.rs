use std::{collections::BTreeSet, fmt::Display};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString, IntoStaticStr};

use crate::{
    error::GrammarError,
    lexing::{expand_alternatives, parse_production_line_declared},
};

/// One right-hand side: an ordered sequence of symbol names. Empty means ε.
pub type Body = Vec<String>;

/// Chomsky classification of a grammar. Informational only, no algorithm looks at it.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    StrumDisplay,
    EnumString,
    IntoStaticStr,
    Serialize,
    Deserialize,
)]
pub enum GrammarKind {
    #[default]
    #[strum(serialize = "2")]
    #[serde(rename = "2")]
    ContextFree,
    #[strum(serialize = "3")]
    #[serde(rename = "3")]
    Regular,
}

/// A formal grammar G = (N, T, P, S).
///
/// Productions keep the order in which their left symbols were first seen, and
/// the bodies of one symbol keep the order they were given in. Every algorithm
/// in this crate takes a `&Grammar` and builds new values instead of mutating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grammar {
    pub nonterminals: BTreeSet<String>,
    pub terminals: BTreeSet<String>,
    pub productions: IndexMap<String, Vec<Body>>,
    pub start: String,
    pub kind: GrammarKind,
}

impl Grammar {
    /// Builds a grammar from symbol lists and `A -> x y` production lines.
    ///
    /// Lines may use `|` between alternatives; each one becomes its own body.
    /// The first malformed line aborts construction, and the error carries its
    /// 1-based position.
    pub fn from_text<N, T, L>(
        nonterminals: N,
        terminals: T,
        lines: L,
        start: &str,
        kind: GrammarKind,
    ) -> Result<Grammar, GrammarError>
    where
        N: IntoIterator,
        N::Item: Into<String>,
        T: IntoIterator,
        T::Item: Into<String>,
        L: IntoIterator,
        L::Item: AsRef<str>,
    {
        let nonterminals: BTreeSet<String> = nonterminals.into_iter().map(Into::into).collect();
        let terminals: BTreeSet<String> = terminals.into_iter().map(Into::into).collect();
        let declared = |s: &str| terminals.contains(s) || nonterminals.contains(s);
        let mut productions: IndexMap<String, Vec<Body>> = IndexMap::new();

        for (n, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            let expanded = expand_alternatives(line).map_err(|e| e.at_line(n + 1))?;
            for alternative in expanded {
                let (left, body) = parse_production_line_declared(&alternative, declared)
                    .map_err(|e| e.at_line(n + 1))?;
                productions.entry(left).or_default().push(body);
            }
        }

        Ok(Grammar {
            nonterminals,
            terminals,
            productions,
            start: start.to_owned(),
            kind,
        })
    }

    pub fn is_nonterminal(&self, symbol: &str) -> bool {
        self.nonterminals.contains(symbol)
    }

    pub fn is_terminal(&self, symbol: &str) -> bool {
        self.terminals.contains(symbol)
    }

    /// Right-hand sides of `symbol`, empty if it has none.
    pub fn bodies(&self, symbol: &str) -> &[Body] {
        self.productions.get(symbol).map_or(&[], Vec::as_slice)
    }

    /// Every production as `(left, body)`, in storage order.
    pub fn rules(&self) -> impl Iterator<Item = (&str, &[String])> + '_ {
        self.productions
            .iter()
            .flat_map(|(left, bodies)| bodies.iter().map(move |b| (left.as_str(), b.as_slice())))
    }

    pub fn production_count(&self) -> usize {
        self.productions.values().map(Vec::len).sum()
    }

    /// Finds the first right-hand side symbol that is neither a terminal nor a non-terminal.
    ///
    /// Returns `(left, symbol)`. Such grammars are accepted everywhere, but the
    /// undeclared symbol can never be matched by the parser.
    pub fn dangling_reference(&self) -> Option<(&str, &str)> {
        self.rules().find_map(|(left, body)| {
            body.iter()
                .find(|s| !self.is_nonterminal(s) && !self.is_terminal(s))
                .map(|s| (left, s.as_str()))
        })
    }

    /// Splits user input into terminal tokens.
    ///
    /// With single-character terminals the input is read character by character,
    /// otherwise tokens are separated by whitespace.
    pub fn tokenize_input(&self, input: &str) -> Vec<String> {
        let input = input.trim();
        if self.terminals.iter().any(|t| t.chars().count() > 1) {
            input.split_whitespace().map(str::to_owned).collect()
        } else {
            input
                .chars()
                .filter(|c| !c.is_whitespace())
                .map(String::from)
                .collect()
        }
    }

    pub fn to_display_text(&self) -> String {
        self.to_string()
    }
}

fn write_set(
    f: &mut std::fmt::Formatter<'_>,
    name: &str,
    set: &BTreeSet<String>,
) -> std::fmt::Result {
    let items: Vec<&str> = set.iter().map(String::as_str).collect();
    writeln!(f, "{name} = {{{}}}", items.join(", "))
}

impl Display for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write_set(f, "N", &self.nonterminals)?;
        write_set(f, "T", &self.terminals)?;
        writeln!(f, "S = {}", self.start)?;
        write!(f, "P:")?;
        for (left, body) in self.rules() {
            write!(f, "\n  {left} -> {}", body.join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use insta::assert_compact_debug_snapshot;

    use super::{Grammar, GrammarKind};
    use crate::error::{FormatFailure, GrammarError};

    fn arith() -> Grammar {
        Grammar::from_text(
            ["E", "T", "F"],
            ["+", "*", "(", ")", "id"],
            [
                "E -> E + T | T",
                "T -> T * F",
                "F -> ( E ) | id",
                "T -> F",
            ],
            "E",
            GrammarKind::ContextFree,
        )
        .unwrap()
    }

    #[test]
    fn declared_dollar_is_a_terminal() {
        let g = Grammar::from_text(
            ["S"],
            ["a", "$"],
            ["S -> a $ | ε"],
            "S",
            GrammarKind::ContextFree,
        )
        .unwrap();
        assert_compact_debug_snapshot!(g.bodies("S"), @r#"[["a", "$"], []]"#);
        assert!(crate::cyk::parse(&g, &["a", "$"]).accepted);
        assert!(!crate::cyk::parse(&g, &["a"]).accepted);
    }

    #[test]
    fn undeclared_markers_are_epsilon() {
        let g = Grammar::from_text(
            ["S"],
            ["a"],
            ["S -> a $ | epsilon"],
            "S",
            GrammarKind::ContextFree,
        )
        .unwrap();
        assert_compact_debug_snapshot!(g.bodies("S"), @r#"[["a"], []]"#);
    }

    #[test]
    fn declared_epsilon_word_is_a_terminal() {
        let g = Grammar::from_text(
            ["S"],
            ["epsilon"],
            ["S -> epsilon"],
            "S",
            GrammarKind::ContextFree,
        )
        .unwrap();
        assert!(crate::cyk::parse(&g, &["epsilon"]).accepted);
        let empty: [&str; 0] = [];
        assert!(!crate::cyk::parse(&g, &empty).accepted);
    }

    #[test]
    fn groups_bodies_by_left_symbol() {
        let g = arith();
        let heads: Vec<&String> = g.productions.keys().collect();
        assert_compact_debug_snapshot!(heads, @r#"["E", "T", "F"]"#);
        assert_compact_debug_snapshot!(g.bodies("T"), @r#"[["T", "*", "F"], ["F"]]"#);
        assert_eq!(g.production_count(), 6);
    }

    #[test]
    fn alternatives_become_separate_bodies() {
        let g = Grammar::from_text(["S"], ["a", "b"], ["S -> a | b"], "S", GrammarKind::default())
            .unwrap();
        assert_compact_debug_snapshot!(g.bodies("S"), @r#"[["a"], ["b"]]"#);
    }

    #[test]
    fn bad_line_is_reported_with_position() {
        let err = Grammar::from_text(
            ["S"],
            ["a"],
            ["S -> a", "S a"],
            "S",
            GrammarKind::ContextFree,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GrammarError::Format {
                line_no: Some(2),
                reason: FormatFailure::MissingArrow,
                ..
            }
        ));
    }

    #[test]
    fn empty_line_is_an_error() {
        let err = Grammar::from_text(["S"], ["a"], ["S -> a", ""], "S", GrammarKind::ContextFree)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "line 2: ``: expected `->` or `→` between the left and right side"
        );
    }

    #[test]
    fn display_text() {
        let g = Grammar::from_text(
            ["S", "A"],
            ["b", "a"],
            ["S -> A b", "A -> a", "A -> ε"],
            "S",
            GrammarKind::ContextFree,
        )
        .unwrap();
        assert_eq!(
            g.to_display_text(),
            "N = {A, S}\nT = {a, b}\nS = S\nP:\n  S -> A b\n  A -> a\n  A -> "
        );
    }

    #[test]
    fn dangling() {
        let g = Grammar::from_text(["S"], ["a"], ["S -> a", "S -> a B"], "S", GrammarKind::Regular)
            .unwrap();
        assert_eq!(g.dangling_reference(), Some(("S", "B")));
        assert_eq!(arith().dangling_reference(), None);
    }

    #[test]
    fn tokenize_input_by_chars_or_words() {
        let single = Grammar::from_text(["S"], ["a", "b"], ["S -> a b"], "S", GrammarKind::Regular)
            .unwrap();
        assert_compact_debug_snapshot!(single.tokenize_input(" ab a"), @r#"["a", "b", "a"]"#);
        assert_compact_debug_snapshot!(arith().tokenize_input("id + id"), @r#"["id", "+", "id"]"#);
        assert!(arith().tokenize_input("   ").is_empty());
    }

    #[test]
    fn kind_codes() {
        assert_eq!(GrammarKind::Regular.to_string(), "3");
        assert_eq!("2".parse::<GrammarKind>().unwrap(), GrammarKind::ContextFree);
        assert!("1".parse::<GrammarKind>().is_err());
    }
}
