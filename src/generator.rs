use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::grammar::Grammar;

/// Limits for [`generate_shortest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// How many distinct strings to return at most.
    pub limit: usize,
    /// How many sentential forms may be taken off the queue before giving up.
    pub max_steps: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            limit: 10,
            max_steps: 100_000,
        }
    }
}

impl GeneratorConfig {
    pub fn generate(&self, grammar: &Grammar) -> Vec<String> {
        ShortestStrings::new(grammar, self.max_steps)
            .take(self.limit)
            .collect()
    }
}

/// Breadth-first enumeration of the strings of a grammar, shortest first.
///
/// Sentential forms are expanded at their leftmost non-terminal only. Strings of
/// equal length come out in no particular order. The grammar is used as given,
/// it does not need to be in CNF.
#[derive(Debug)]
pub struct ShortestStrings<'g> {
    grammar: &'g Grammar,
    queue: VecDeque<Vec<&'g str>>,
    seen: HashSet<Vec<&'g str>>,
    emitted: HashSet<String>,
    steps: usize,
    max_steps: usize,
}

impl<'g> ShortestStrings<'g> {
    pub fn new(grammar: &'g Grammar, max_steps: usize) -> ShortestStrings<'g> {
        let start = vec![grammar.start.as_str()];
        ShortestStrings {
            grammar,
            queue: VecDeque::from([start.clone()]),
            seen: HashSet::from([start]),
            emitted: HashSet::new(),
            steps: 0,
            max_steps,
        }
    }

    /// Sentential forms taken off the queue so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    fn expand(&mut self, form: &[&'g str], at: usize) {
        for body in self.grammar.bodies(form[at]) {
            let mut next = Vec::with_capacity(form.len() + body.len());
            next.extend_from_slice(&form[..at]);
            next.extend(body.iter().map(String::as_str));
            next.extend_from_slice(&form[at + 1..]);
            if self.seen.insert(next.clone()) {
                self.queue.push_back(next);
            }
        }
    }
}

impl Iterator for ShortestStrings<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if self.steps >= self.max_steps {
                if !self.queue.is_empty() {
                    warn!(
                        max_steps = self.max_steps,
                        found = self.emitted.len(),
                        "string search hit its step limit"
                    );
                    self.queue.clear();
                }
                return None;
            }
            let Some(form) = self.queue.pop_front() else {
                debug!(
                    steps = self.steps,
                    found = self.emitted.len(),
                    "string search exhausted"
                );
                return None;
            };
            self.steps += 1;

            match form.iter().position(|s| self.grammar.is_nonterminal(s)) {
                Some(at) => self.expand(&form, at),
                None => {
                    let word = form.concat();
                    if self.emitted.insert(word.clone()) {
                        return Some(word);
                    }
                }
            }
        }
    }
}

/// The first `limit` strings of the language, in breadth-first discovery order.
///
/// `max_steps` bounds the search, defaulting to [`GeneratorConfig::default`]'s.
/// Running into it yields a shorter list, never an error.
pub fn generate_shortest(
    grammar: &Grammar,
    limit: usize,
    max_steps: Option<usize>,
) -> Vec<String> {
    GeneratorConfig {
        limit,
        max_steps: max_steps.unwrap_or(GeneratorConfig::default().max_steps),
    }
    .generate(grammar)
}
