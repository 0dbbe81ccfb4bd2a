use std::{
    fmt::{Display, Write},
    sync::LazyLock,
};

use regex::Regex;
use serde::{Serialize, ser::SerializeSeq};

/// Names of the placeholders CNF conversion introduces for terminals inside long bodies.
static AUXILIARY_TERMINAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^T_\d+$").expect("static regex"));

const INDENT: &str = "  ";

/// A derivation found by the CYK parser.
///
/// The shapes follow CNF: a non-terminal derives one terminal, two non-terminals,
/// or (for the start symbol only) nothing at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseTree {
    Empty {
        symbol: String,
    },
    Leaf {
        symbol: String,
        terminal: String,
    },
    Branch {
        symbol: String,
        left: Box<ParseTree>,
        right: Box<ParseTree>,
    },
}

impl ParseTree {
    pub fn symbol(&self) -> &str {
        match self {
            ParseTree::Empty { symbol }
            | ParseTree::Leaf { symbol, .. }
            | ParseTree::Branch { symbol, .. } => symbol,
        }
    }

    /// The terminals under this node, left to right.
    pub fn yield_terminals(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_terminals(&mut out);
        out
    }

    fn collect_terminals<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            ParseTree::Empty { .. } => {}
            ParseTree::Leaf { terminal, .. } => out.push(terminal),
            ParseTree::Branch { left, right, .. } => {
                left.collect_terminals(out);
                right.collect_terminals(out);
            }
        }
    }

    pub fn depth(&self) -> usize {
        match self {
            ParseTree::Empty { .. } | ParseTree::Leaf { .. } => 1,
            ParseTree::Branch { left, right, .. } => 1 + left.depth().max(right.depth()),
        }
    }
}

/// Serializes as nested arrays: `["S", ["A", "a"], ["B", "b"]]`.
impl Serialize for ParseTree {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ParseTree::Empty { symbol } => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(symbol)?;
                seq.end()
            }
            ParseTree::Leaf { symbol, terminal } => {
                let mut seq = serializer.serialize_seq(Some(2))?;
                seq.serialize_element(symbol)?;
                seq.serialize_element(terminal)?;
                seq.end()
            }
            ParseTree::Branch {
                symbol,
                left,
                right,
            } => {
                let mut seq = serializer.serialize_seq(Some(3))?;
                seq.serialize_element(symbol)?;
                seq.serialize_element(left)?;
                seq.serialize_element(right)?;
                seq.end()
            }
        }
    }
}

pub fn is_auxiliary_terminal_symbol(symbol: &str) -> bool {
    AUXILIARY_TERMINAL.is_match(symbol)
}

/// Renders a derivation as indented text, two spaces per level.
///
/// ```text
/// S
///   A -> a
///   B -> b
/// ```
///
/// Terminal placeholders such as `T_0 -> a` do not get a line of their own,
/// their terminal is printed where the placeholder would have been.
pub fn render_tree_text(tree: &ParseTree) -> String {
    tree.to_string()
}

impl Display for ParseTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        render_node(self, 0, f)
    }
}

fn render_node(tree: &ParseTree, depth: usize, out: &mut impl Write) -> std::fmt::Result {
    let indent = INDENT.repeat(depth);
    match tree {
        ParseTree::Leaf { symbol, terminal } if is_auxiliary_terminal_symbol(symbol) => {
            writeln!(out, "{indent}{terminal}")
        }
        ParseTree::Leaf { symbol, terminal } => writeln!(out, "{indent}{symbol} -> {terminal}"),
        ParseTree::Empty { symbol } => writeln!(out, "{indent}{symbol}"),
        ParseTree::Branch {
            symbol,
            left,
            right,
        } => {
            writeln!(out, "{indent}{symbol}")?;
            render_node(left, depth + 1, out)?;
            render_node(right, depth + 1, out)
        }
    }
}
