use std::collections::HashMap;

use indexmap::{IndexMap, IndexSet};
use serde::Serialize;
use tracing::{debug, trace};

use crate::{
    cnf::to_cnf,
    grammar::Grammar,
    tree::ParseTree,
};

/// Outcome of a CYK run. A rejected input is a normal result, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CykResult {
    pub accepted: bool,
    /// One derivation of the input, present exactly when it was accepted.
    pub tree: Option<ParseTree>,
}

/// How a non-terminal came to cover a span.
///
/// Children are referenced by symbol and span only, each one is rebuilt from its own
/// first witness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Witness {
    Terminal,
    Binary { split: usize, left: usize, right: usize },
}

type Cell = IndexMap<usize, Vec<Witness>>;

/// A CYK recognizer over the CNF form of a grammar.
///
/// Building one normalizes the grammar once; [`CykParser::parse`] can then be
/// called for any number of inputs.
#[derive(Debug, Clone)]
pub struct CykParser {
    cnf: Grammar,
    symbols: IndexSet<String>,
    start: usize,
    accepts_empty: bool,
    /// terminal -> heads of `A -> terminal`
    terminal_rules: HashMap<String, Vec<usize>>,
    /// `A -> B C` as `(A, B, C)`
    binary_rules: Vec<(usize, usize, usize)>,
}

impl CykParser {
    pub fn new(grammar: &Grammar) -> CykParser {
        let cnf = to_cnf(grammar);
        let mut symbols = IndexSet::new();
        let (start, _) = symbols.insert_full(cnf.start.clone());
        let mut terminal_rules: HashMap<String, Vec<usize>> = HashMap::new();
        let mut binary_rules = Vec::new();
        let mut accepts_empty = false;

        for (left, body) in cnf.rules() {
            let (head, _) = symbols.insert_full(left.to_owned());
            match body {
                [] => accepts_empty |= head == start,
                [terminal] => terminal_rules.entry(terminal.clone()).or_default().push(head),
                [b, c] => {
                    let (b, _) = symbols.insert_full(b.clone());
                    let (c, _) = symbols.insert_full(c.clone());
                    binary_rules.push((head, b, c));
                }
                _ => {}
            }
        }

        debug!(
            symbols = symbols.len(),
            binary = binary_rules.len(),
            terminal = terminal_rules.len(),
            "prepared CYK tables"
        );
        CykParser {
            cnf,
            symbols,
            start,
            accepts_empty,
            terminal_rules,
            binary_rules,
        }
    }

    /// The CNF grammar the parser works on.
    pub fn cnf(&self) -> &Grammar {
        &self.cnf
    }

    pub fn parse<T: AsRef<str>>(&self, tokens: &[T]) -> CykResult {
        let n = tokens.len();
        if n == 0 {
            debug!(accepted = self.accepts_empty, "empty input");
            return CykResult {
                accepted: self.accepts_empty,
                tree: self.accepts_empty.then(|| ParseTree::Empty {
                    symbol: self.cnf.start.clone(),
                }),
            };
        }

        let table = self.fill(tokens);
        let tree = self.rebuild(&table, tokens, self.start, 0, n);
        debug!(len = n, accepted = tree.is_some(), "parsed input");
        CykResult {
            accepted: tree.is_some(),
            tree,
        }
    }

    pub fn accepts<T: AsRef<str>>(&self, tokens: &[T]) -> bool {
        self.parse(tokens).accepted
    }

    /// `table[len - 1][i]` holds the witnesses for the span of `len` tokens starting at `i`.
    fn fill<T: AsRef<str>>(&self, tokens: &[T]) -> Vec<Vec<Cell>> {
        let n = tokens.len();
        let mut table: Vec<Vec<Cell>> = Vec::with_capacity(n);

        let base = tokens
            .iter()
            .map(|token| {
                let mut cell = Cell::new();
                for &head in self.terminal_rules.get(token.as_ref()).into_iter().flatten() {
                    cell.entry(head).or_default().push(Witness::Terminal);
                }
                cell
            })
            .collect();
        table.push(base);

        for len in 2..=n {
            let mut row = Vec::with_capacity(n - len + 1);
            for i in 0..=n - len {
                let mut cell = Cell::new();
                for split in 1..len {
                    let left = &table[split - 1][i];
                    let right = &table[len - split - 1][i + split];
                    if left.is_empty() || right.is_empty() {
                        continue;
                    }
                    for &(a, b, c) in &self.binary_rules {
                        if left.contains_key(&b) && right.contains_key(&c) {
                            cell.entry(a).or_default().push(Witness::Binary {
                                split,
                                left: b,
                                right: c,
                            });
                        }
                    }
                }
                trace!(i, len, symbols = cell.len(), "filled cell");
                row.push(cell);
            }
            table.push(row);
        }
        table
    }

    fn rebuild<T: AsRef<str>>(
        &self,
        table: &[Vec<Cell>],
        tokens: &[T],
        symbol: usize,
        i: usize,
        len: usize,
    ) -> Option<ParseTree> {
        let witness = table.get(len - 1)?.get(i)?.get(&symbol)?.first()?;
        let name = self.symbols.get_index(symbol)?.clone();
        match *witness {
            Witness::Terminal => Some(ParseTree::Leaf {
                symbol: name,
                terminal: tokens.get(i)?.as_ref().to_owned(),
            }),
            Witness::Binary { split, left, right } => Some(ParseTree::Branch {
                symbol: name,
                left: Box::new(self.rebuild(table, tokens, left, i, split)?),
                right: Box::new(self.rebuild(table, tokens, right, i + split, len - split)?),
            }),
        }
    }
}

/// Normalizes `grammar` and runs CYK on `tokens`. The empty slice is the empty string.
pub fn parse<T: AsRef<str>>(grammar: &Grammar, tokens: &[T]) -> CykResult {
    CykParser::new(grammar).parse(tokens)
}
