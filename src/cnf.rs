use std::collections::{BTreeSet, HashSet, VecDeque};

use indexmap::{IndexMap, IndexSet};
use tracing::{debug, trace};

use crate::grammar::{Body, Grammar};

/// Converts `grammar` into an equivalent grammar in Chomsky Normal Form.
///
/// Every production of the result is `A -> B C`, `A -> a`, or `S -> ε` for the
/// start symbol only, and the start symbol never occurs on a right-hand side.
/// The input is left untouched.
pub fn to_cnf(grammar: &Grammar) -> Grammar {
    let mut normalizer = Normalizer::new(grammar);
    normalizer.isolate_start();
    let nullable = normalizer.nullable();
    normalizer.eliminate_epsilon(&nullable);
    normalizer.eliminate_units();
    normalizer.substitute_terminals();
    normalizer.binarize();
    normalizer.dedup();
    normalizer.finish(grammar)
}

/// Checks the structural CNF invariant on every production of `grammar`.
pub fn is_cnf(grammar: &Grammar) -> bool {
    let start_is_nullable = grammar.bodies(&grammar.start).iter().any(Vec::is_empty);
    grammar.rules().all(|(left, body)| match body {
        [] => left == grammar.start,
        [a] => grammar.is_terminal(a),
        [b, c] => {
            grammar.is_nonterminal(b)
                && grammar.is_nonterminal(c)
                && !(start_is_nullable && (*b == grammar.start || *c == grammar.start))
        }
        _ => false,
    })
}

/// Working state of one conversion. Owns the fresh-name counter for all phases.
struct Normalizer {
    nonterminals: BTreeSet<String>,
    terminals: BTreeSet<String>,
    productions: IndexMap<String, Vec<Body>>,
    start: String,
    counter: usize,
}

impl Normalizer {
    fn new(grammar: &Grammar) -> Normalizer {
        Normalizer {
            nonterminals: grammar.nonterminals.clone(),
            terminals: grammar.terminals.clone(),
            productions: grammar.productions.clone(),
            start: grammar.start.clone(),
            counter: 0,
        }
    }

    fn is_taken(&self, name: &str) -> bool {
        self.nonterminals.contains(name)
            || self.terminals.contains(name)
            || self.productions.contains_key(name)
    }

    fn is_unit(&self, body: &[String]) -> bool {
        matches!(body, [b] if self.nonterminals.contains(b))
    }

    fn production_count(&self) -> usize {
        self.productions.values().map(Vec::len).sum()
    }

    fn isolate_start(&mut self) {
        let referenced = self
            .productions
            .values()
            .flatten()
            .any(|body| body.contains(&self.start));
        if !referenced {
            return;
        }

        let mut fresh = format!("{}0", self.start);
        while self.is_taken(&fresh) {
            fresh.push('0');
        }
        trace!(name = %fresh, "fresh start symbol");
        self.nonterminals.insert(fresh.clone());
        self.productions
            .entry(fresh.clone())
            .or_default()
            .push(vec![self.start.clone()]);
        self.start = fresh;
        debug!(start = %self.start, "isolated start symbol");
    }

    fn nullable(&self) -> HashSet<String> {
        let mut nullable = HashSet::new();
        loop {
            let before = nullable.len();
            for (left, bodies) in &self.productions {
                if !nullable.contains(left)
                    && bodies
                        .iter()
                        .any(|body| body.iter().all(|s| nullable.contains(s)))
                {
                    nullable.insert(left.clone());
                }
            }
            if nullable.len() == before {
                debug!(count = nullable.len(), "computed nullable symbols");
                return nullable;
            }
        }
    }

    fn eliminate_epsilon(&mut self, nullable: &HashSet<String>) {
        for (left, bodies) in &mut self.productions {
            let mut variants: IndexSet<Body> = IndexSet::new();
            for body in bodies.iter() {
                variants.extend(without_nullable(body, nullable));
            }
            *bodies = variants
                .into_iter()
                .filter(|body| !body.is_empty() || *left == self.start)
                .collect();
        }
        debug!(
            productions = self.production_count(),
            "removed epsilon productions"
        );
    }

    /// Non-terminals reachable from `from` through unit productions alone, in discovery order.
    fn unit_closure(&self, from: &str) -> IndexSet<String> {
        let mut reached = IndexSet::new();
        let mut pending = VecDeque::from([from.to_owned()]);
        while let Some(symbol) = pending.pop_front() {
            let Some(bodies) = self.productions.get(&symbol) else {
                continue;
            };
            for body in bodies.iter().filter(|b| self.is_unit(b)) {
                let target = &body[0];
                if target != from && reached.insert(target.clone()) {
                    pending.push_back(target.clone());
                }
            }
        }
        reached
    }

    fn eliminate_units(&mut self) {
        let heads: Vec<String> = self
            .productions
            .keys()
            .filter(|h| self.nonterminals.contains(*h))
            .chain(
                self.nonterminals
                    .iter()
                    .filter(|n| !self.productions.contains_key(*n)),
            )
            .cloned()
            .collect();

        let mut rebuilt = IndexMap::new();
        for head in heads {
            let closure = self.unit_closure(&head);
            let mut bodies: IndexSet<Body> = IndexSet::new();
            for source in std::iter::once(&head).chain(closure.iter()) {
                let Some(source_bodies) = self.productions.get(source) else {
                    continue;
                };
                bodies.extend(
                    source_bodies
                        .iter()
                        .filter(|b| !self.is_unit(b))
                        .cloned(),
                );
            }
            if !bodies.is_empty() {
                rebuilt.insert(head, bodies.into_iter().collect());
            }
        }
        self.productions = rebuilt;
        debug!(
            productions = self.production_count(),
            "removed unit productions"
        );
    }

    fn fresh_terminal_name(&mut self) -> String {
        loop {
            let name = format!("T_{}", self.counter);
            self.counter += 1;
            if !self.is_taken(&name) {
                trace!(%name, "fresh terminal placeholder");
                self.nonterminals.insert(name.clone());
                return name;
            }
        }
    }

    fn substitute_terminals(&mut self) {
        let mut placeholders: IndexMap<String, String> = IndexMap::new();
        let heads: Vec<String> = self.productions.keys().cloned().collect();

        for head in heads {
            let Some(mut bodies) = self.productions.get_mut(&head).map(std::mem::take) else {
                continue;
            };
            for body in bodies.iter_mut().filter(|b| b.len() >= 2) {
                for symbol in body.iter_mut() {
                    if !self.terminals.contains(symbol.as_str()) {
                        continue;
                    }
                    let placeholder = match placeholders.get(symbol.as_str()) {
                        Some(existing) => existing.clone(),
                        None => {
                            let fresh = self.fresh_terminal_name();
                            placeholders.insert(symbol.clone(), fresh.clone());
                            fresh
                        }
                    };
                    *symbol = placeholder;
                }
            }
            self.productions.insert(head, bodies);
        }

        for (terminal, placeholder) in placeholders {
            self.productions
                .entry(placeholder)
                .or_default()
                .push(vec![terminal]);
        }
        debug!(
            productions = self.production_count(),
            "substituted terminals in long bodies"
        );
    }

    fn fresh_chain_name(&mut self, position: usize) -> String {
        let mut n = self.nonterminals.len();
        loop {
            let name = format!("X_{n}_{position}");
            if !self.is_taken(&name) {
                trace!(%name, "fresh chain symbol");
                self.nonterminals.insert(name.clone());
                return name;
            }
            n += 1;
        }
    }

    /// Splits `s1 s2 ... sk` into `s1 X1` plus the productions `X1 -> s2 X2`, ..., `X(k-2) -> s(k-1) sk`.
    fn chain(&mut self, body: &[String]) -> (Body, Vec<(String, Body)>) {
        let k = body.len();
        let names: Vec<String> = (0..k - 2).map(|i| self.fresh_chain_name(i)).collect();

        let head_body = vec![body[0].clone(), names[0].clone()];
        let mut links: Vec<(String, Body)> = (1..k - 2)
            .map(|i| (names[i - 1].clone(), vec![body[i].clone(), names[i].clone()]))
            .collect();
        links.push((
            names[k - 3].clone(),
            vec![body[k - 2].clone(), body[k - 1].clone()],
        ));
        (head_body, links)
    }

    fn binarize(&mut self) {
        loop {
            let mut changed = false;
            let heads: Vec<String> = self.productions.keys().cloned().collect();
            let mut links = Vec::new();

            for head in heads {
                let Some(bodies) = self.productions.get_mut(&head).map(std::mem::take) else {
                    continue;
                };
                let mut kept = Vec::with_capacity(bodies.len());
                for body in bodies {
                    if body.len() <= 2 {
                        kept.push(body);
                        continue;
                    }
                    changed = true;
                    let (head_body, chain) = self.chain(&body);
                    kept.push(head_body);
                    links.extend(chain);
                }
                self.productions.insert(head, kept);
            }

            for (left, body) in links {
                self.productions.entry(left).or_default().push(body);
            }
            if !changed {
                break;
            }
        }
        debug!(
            productions = self.production_count(),
            "binarized long bodies"
        );
    }

    fn dedup(&mut self) {
        for bodies in self.productions.values_mut() {
            let unique: IndexSet<Body> = bodies.drain(..).collect();
            bodies.extend(unique);
        }
    }

    fn finish(self, source: &Grammar) -> Grammar {
        debug!(
            nonterminals = self.nonterminals.len(),
            productions = self.production_count(),
            start = %self.start,
            "converted to CNF"
        );
        Grammar {
            nonterminals: self.nonterminals,
            terminals: self.terminals,
            productions: self.productions,
            start: self.start,
            kind: source.kind,
        }
    }
}

/// Every variant of `body` obtained by deleting any subset of its nullable symbols.
/// The body itself always comes first.
fn without_nullable(body: &[String], nullable: &HashSet<String>) -> Vec<Body> {
    let Some((first, rest)) = body.split_first() else {
        return vec![Vec::new()];
    };
    let tails = without_nullable(rest, nullable);
    let mut variants: Vec<Body> = tails
        .iter()
        .map(|tail| {
            let mut kept = Vec::with_capacity(tail.len() + 1);
            kept.push(first.clone());
            kept.extend(tail.iter().cloned());
            kept
        })
        .collect();
    if nullable.contains(first) {
        variants.extend(tails);
    }
    variants
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use insta::assert_compact_debug_snapshot;

    use super::{is_cnf, to_cnf, without_nullable};
    use crate::grammar::{Grammar, GrammarKind};

    fn grammar(n: &[&str], t: &[&str], lines: &[&str], start: &str) -> Grammar {
        Grammar::from_text(
            n.iter().copied(),
            t.iter().copied(),
            lines.iter().copied(),
            start,
            GrammarKind::ContextFree,
        )
        .unwrap()
    }

    #[test]
    fn anbn() {
        let g = grammar(&["S"], &["a", "b"], &["S -> a S b | ε"], "S");
        let cnf = to_cnf(&g);
        assert!(is_cnf(&cnf));
        assert_eq!(
            cnf.to_string(),
            "N = {S, S0, T_0, T_1, X_4_0, X_5_0}\n\
             T = {a, b}\n\
             S = S0\n\
             P:\n  \
             S -> T_0 X_4_0\n  \
             S -> T_0 T_1\n  \
             S0 -> \n  \
             S0 -> T_0 X_5_0\n  \
             S0 -> T_0 T_1\n  \
             T_0 -> a\n  \
             T_1 -> b\n  \
             X_4_0 -> S T_1\n  \
             X_5_0 -> S T_1"
        );
    }

    #[test]
    fn input_is_not_modified() {
        let g = grammar(&["S"], &["a", "b"], &["S -> a S b | ε"], "S");
        let before = g.clone();
        let _ = to_cnf(&g);
        assert_eq!(g, before);
    }

    #[test]
    fn already_cnf_passes_through() {
        let g = grammar(
            &["S", "A", "B"],
            &["a", "b"],
            &["S -> A B", "A -> a", "B -> b"],
            "S",
        );
        assert!(is_cnf(&g));
        assert_eq!(to_cnf(&g), g);
    }

    #[test]
    fn start_name_collision() {
        let g = grammar(&["S", "S0"], &["a"], &["S -> a S0", "S0 -> S | a"], "S");
        let cnf = to_cnf(&g);
        assert_eq!(cnf.start, "S00");
        assert!(is_cnf(&cnf));
        assert!(cnf.rules().all(|(_, body)| !body.contains(&cnf.start)));
    }

    #[test]
    fn unit_chains_are_collapsed() {
        let g = grammar(
            &["S", "A", "B"],
            &["a", "b"],
            &["S -> A", "A -> B | a", "B -> b | S"],
            "S",
        );
        let cnf = to_cnf(&g);
        assert!(is_cnf(&cnf));
        assert_compact_debug_snapshot!(cnf.bodies(&cnf.start), @r#"[["a"], ["b"]]"#);
    }

    #[test]
    fn placeholder_names_skip_existing_symbols() {
        let g = grammar(&["S", "T_0"], &["a", "b"], &["S -> a T_0 b", "T_0 -> a"], "S");
        let cnf = to_cnf(&g);
        assert!(is_cnf(&cnf));
        assert_compact_debug_snapshot!(cnf.bodies("T_1"), @r#"[["a"]]"#);
        assert_compact_debug_snapshot!(cnf.bodies("T_2"), @r#"[["b"]]"#);
    }

    #[test]
    fn long_body_becomes_a_chain() {
        let g = grammar(&["S", "A"], &["a"], &["S -> A A A A", "A -> a"], "S");
        let cnf = to_cnf(&g);
        assert!(is_cnf(&cnf));
        assert_compact_debug_snapshot!(cnf.bodies("S"), @r#"[["A", "X_2_0"]]"#);
        assert_compact_debug_snapshot!(cnf.bodies("X_2_0"), @r#"[["A", "X_3_1"]]"#);
        assert_compact_debug_snapshot!(cnf.bodies("X_3_1"), @r#"[["A", "A"]]"#);
    }

    #[test]
    fn nullable_variants_keep_the_body_first() {
        let nullable = HashSet::from(["A".to_owned()]);
        let body = vec!["A".to_owned(), "b".to_owned(), "A".to_owned()];
        assert_compact_debug_snapshot!(
            without_nullable(&body, &nullable),
            @r#"[["A", "b", "A"], ["A", "b"], ["b", "A"], ["b"]]"#
        );
    }

    #[test]
    fn is_cnf_rejects() {
        let long = grammar(&["S"], &["a"], &["S -> a a a"], "S");
        assert!(!is_cnf(&long));
        let unit = grammar(&["S", "A"], &["a"], &["S -> A", "A -> a"], "S");
        assert!(!is_cnf(&unit));
        let inner_epsilon = grammar(&["S", "A"], &["a"], &["S -> a", "A -> ε"], "S");
        assert!(!is_cnf(&inner_epsilon));
        let nullable_start_used = grammar(&["S"], &["a"], &["S -> S S | a | ε"], "S");
        assert!(!is_cnf(&nullable_start_used));
    }

    #[test]
    fn idempotent() {
        let g = grammar(
            &["E", "T", "F"],
            &["+", "*", "(", ")", "id"],
            &["E -> E + T | T", "T -> T * F | F", "F -> ( E ) | id"],
            "E",
        );
        let once = to_cnf(&g);
        assert!(is_cnf(&once));
        assert_eq!(to_cnf(&once), once);
    }
}
