#![forbid(unsafe_code)]
#![warn(explicit_outlives_requirements)]
#![warn(missing_debug_implementations)]
#![warn(clippy::pedantic)]
#![warn(missing_copy_implementations)]
#![warn(redundant_lifetimes)]
//#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![warn(unused_crate_dependencies)]
#![warn(unused_qualifications)]
#![allow(clippy::must_use_candidate)]

//! Context-free grammars: Chomsky Normal Form conversion, CYK parsing and
//! shortest-string generation.
//!
//! ```
//! use cfg_toolkit::{Grammar, GrammarKind, generate_shortest, parse, render_tree_text};
//!
//! let g = Grammar::from_text(
//!     ["S", "A", "B"],
//!     ["a", "b"],
//!     ["S -> A B", "A -> a", "B -> b"],
//!     "S",
//!     GrammarKind::ContextFree,
//! )
//! .unwrap();
//!
//! let result = parse(&g, &["a", "b"]);
//! assert!(result.accepted);
//! assert_eq!(render_tree_text(&result.tree.unwrap()), "S\n  A -> a\n  B -> b\n");
//! assert_eq!(generate_shortest(&g, 5, None), ["ab"]);
//! ```

mod cnf;
mod cyk;
mod debug;
mod error;
mod generator;
mod grammar;
mod layout;
mod lexing;
mod proptesting;
mod storage;
mod tree;

pub use cnf::{is_cnf, to_cnf};
pub use cyk::{CykParser, CykResult, parse};
pub use debug::render_tree_fancy;
pub use error::{FormatFailure, GrammarError};
pub use generator::{GeneratorConfig, ShortestStrings, generate_shortest};
pub use grammar::{Body, Grammar, GrammarKind};
pub use layout::{LayoutConfig, PositionedNode, TreeLayout, TreeNode, layout_tree};
pub use lexing::{expand_alternatives, parse_production_line};
pub use storage::{GrammarRecord, load_grammar, save_grammar};
pub use tree::{ParseTree, is_auxiliary_terminal_symbol, render_tree_text};
