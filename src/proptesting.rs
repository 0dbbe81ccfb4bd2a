#![cfg(test)]
use std::collections::HashSet;

use crate::{CykParser, Grammar, GrammarKind, ShortestStrings, generate_shortest, is_cnf, to_cnf};
use proptest::prelude::*;
use proptest_derive::Arbitrary;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
enum Head {
    S,
    A,
    B,
    C,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
enum Symbol {
    Nonterminal(Head),
    #[proptest(weight = 2)]
    LowerA,
    #[proptest(weight = 2)]
    LowerB,
}

impl Head {
    fn name(self) -> &'static str {
        match self {
            Head::S => "S",
            Head::A => "A",
            Head::B => "B",
            Head::C => "C",
        }
    }
}

impl Symbol {
    fn name(self) -> &'static str {
        match self {
            Symbol::Nonterminal(head) => head.name(),
            Symbol::LowerA => "a",
            Symbol::LowerB => "b",
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
struct RawRule {
    head: Head,
    #[proptest(strategy = "prop::collection::vec(any::<Symbol>(), 0..4)")]
    body: Vec<Symbol>,
}

impl RawRule {
    fn line(&self) -> String {
        let body: Vec<&str> = self.body.iter().map(|s| s.name()).collect();
        format!("{} -> {}", self.head.name(), body.join(" "))
    }
}

fn grammar_strategy() -> impl Strategy<Value = Grammar> {
    prop::collection::vec(any::<RawRule>(), 1..7).prop_map(|rules| {
        let lines: Vec<String> = rules.iter().map(RawRule::line).collect();
        Grammar::from_text(
            ["S", "A", "B", "C"],
            ["a", "b"],
            &lines,
            "S",
            GrammarKind::ContextFree,
        )
        .unwrap_or_else(|e| panic!("{e}"))
    })
}

fn chars(word: &str) -> Vec<String> {
    word.chars().map(String::from).collect()
}

/// Every word over `{a, b}` of length `0..=4`.
fn short_words() -> Vec<String> {
    let mut words = vec![String::new()];
    let mut frontier = vec![String::new()];
    for _ in 0..4 {
        frontier = frontier
            .iter()
            .flat_map(|w| [format!("{w}a"), format!("{w}b")])
            .collect();
        words.extend(frontier.iter().cloned());
    }
    words
}

/// Membership by saturation over `(symbol, from, to)` facts, without any normal form.
fn derives(g: &Grammar, word: &[String]) -> bool {
    let n = word.len();
    let mut facts: HashSet<(&str, usize, usize)> = HashSet::new();
    loop {
        let before = facts.len();
        for (left, body) in g.rules() {
            for from in 0..=n {
                let mut ends = vec![from];
                for symbol in body {
                    let mut next = Vec::new();
                    for &at in &ends {
                        if g.is_nonterminal(symbol) {
                            next.extend(
                                (at..=n).filter(|&to| facts.contains(&(symbol.as_str(), at, to))),
                            );
                        } else if word.get(at) == Some(symbol) {
                            next.push(at + 1);
                        }
                    }
                    next.sort_unstable();
                    next.dedup();
                    ends = next;
                }
                for to in ends {
                    facts.insert((left, from, to));
                }
            }
        }
        if facts.len() == before {
            return facts.contains(&(g.start.as_str(), 0, n));
        }
    }
}

#[test]
fn raw_rule_line() {
    let rule = RawRule {
        head: Head::B,
        body: vec![Symbol::LowerA, Symbol::Nonterminal(Head::S)],
    };
    assert_eq!(rule.line(), "B -> a S");
    let empty = RawRule {
        head: Head::S,
        body: vec![],
    };
    assert_eq!(empty.line(), "S -> ");
}

proptest! {
    #[test]
    fn conversion_gives_cnf(g in grammar_strategy()) {
        let cnf = to_cnf(&g);
        prop_assert!(is_cnf(&cnf), "not in CNF:\n{cnf}\nfrom\n{g}");
    }
}

proptest! {
    #[test]
    fn conversion_is_idempotent(g in grammar_strategy()) {
        let once = to_cnf(&g);
        let twice = to_cnf(&once);
        prop_assert_eq!(twice, once);
    }
}

proptest! {
    #[test]
    fn generated_strings_are_accepted(g in grammar_strategy()) {
        let parser = CykParser::new(&g);
        for word in generate_shortest(&g, 8, Some(2_000)) {
            let tokens = chars(&word);
            let result = parser.parse(&tokens);
            prop_assert!(result.accepted, "`{word}` rejected by\n{}", parser.cnf());
            if let Some(tree) = result.tree {
                prop_assert_eq!(tree.yield_terminals(), tokens.iter().map(String::as_str).collect::<Vec<_>>());
            }
        }
    }
}

proptest! {
    #[test]
    fn conversion_keeps_short_words(g in grammar_strategy()) {
        let cnf = to_cnf(&g);
        let parser = CykParser::new(&g);
        for word in short_words() {
            let tokens = chars(&word);
            let expected = derives(&g, &tokens);
            prop_assert_eq!(derives(&cnf, &tokens), expected, "`{}` in\n{}\nvs\n{}", word, g, cnf);
            prop_assert_eq!(parser.accepts(&tokens), expected, "`{}` in\n{}", word, g);
        }
    }
}

proptest! {
    #[test]
    fn conversion_keeps_generated_words(g in grammar_strategy()) {
        let cnf = to_cnf(&g);
        for word in generate_shortest(&g, 8, Some(2_000)) {
            prop_assert!(derives(&cnf, &chars(&word)), "`{}` lost by\n{}", word, cnf);
        }
        for word in generate_shortest(&cnf, 8, Some(2_000)) {
            prop_assert!(derives(&g, &chars(&word)), "`{}` added by\n{}", word, cnf);
        }
    }
}

proptest! {
    #[test]
    fn accepted_words_are_generated(g in grammar_strategy()) {
        const MAX_STEPS: usize = 5_000;
        let mut strings = ShortestStrings::new(&g, MAX_STEPS);
        let generated: HashSet<String> = strings.by_ref().collect();
        let exhausted = strings.steps() < MAX_STEPS;

        let parser = CykParser::new(&g);
        for word in short_words() {
            if exhausted && parser.accepts(&chars(&word)) {
                prop_assert!(generated.contains(&word), "`{}` missing from {:?}", word, generated);
            }
        }
    }
}

proptest! {
    #[test]
    fn generation_is_repeatable(g in grammar_strategy()) {
        let first = generate_shortest(&g, 8, Some(2_000));
        let second = generate_shortest(&g, 8, Some(2_000));
        prop_assert_eq!(first, second);
    }
}

#[test]
fn saturation_handles_epsilon_and_cycles() {
    let g = Grammar::from_text(
        ["S", "A"],
        ["a", "b"],
        ["S -> A S b | A", "A -> S | a | ε"],
        "S",
        GrammarKind::ContextFree,
    )
    .unwrap();
    assert!(derives(&g, &[]));
    assert!(derives(&g, &chars("a")));
    assert!(derives(&g, &chars("ab")));
    assert!(!derives(&g, &chars("ba")));
}
