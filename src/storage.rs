use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    error::GrammarError,
    grammar::{Grammar, GrammarKind},
};

/// On-disk shape of a grammar.
///
/// ```json
/// { "N": ["S"], "T": ["a", "b"], "P": ["S -> a S b", "S -> "], "S0": "S", "type": "2" }
/// ```
///
/// Older files name the start symbol `S` instead of `S0`; both are read, `S0` is written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrammarRecord {
    #[serde(rename = "N", skip_serializing_if = "Option::is_none")]
    pub nonterminals: Option<Vec<String>>,
    #[serde(rename = "T", skip_serializing_if = "Option::is_none")]
    pub terminals: Option<Vec<String>>,
    #[serde(rename = "P", skip_serializing_if = "Option::is_none")]
    pub productions: Option<Vec<String>>,
    #[serde(rename = "S0", skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(rename = "S", skip_serializing_if = "Option::is_none")]
    pub legacy_start: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: GrammarKind,
}

impl Grammar {
    /// Flattens the grammar into its persisted form.
    ///
    /// `N` and `T` come out sorted. `P` has one `A -> x y` line per body in storage order.
    pub fn to_record(&self) -> GrammarRecord {
        GrammarRecord {
            nonterminals: Some(self.nonterminals.iter().cloned().collect()),
            terminals: Some(self.terminals.iter().cloned().collect()),
            productions: Some(
                self.rules()
                    .map(|(left, body)| format!("{left} -> {}", body.join(" ")))
                    .collect(),
            ),
            start: Some(self.start.clone()),
            legacy_start: None,
            kind: self.kind,
        }
    }

    pub fn from_record(record: GrammarRecord) -> Result<Grammar, GrammarError> {
        let GrammarRecord {
            nonterminals,
            terminals,
            productions,
            start,
            legacy_start,
            kind,
        } = record;

        let nonterminals = nonterminals.ok_or(GrammarError::MissingKey("N"))?;
        let terminals = terminals.ok_or(GrammarError::MissingKey("T"))?;
        let productions = productions.ok_or(GrammarError::MissingKey("P"))?;
        let start = start
            .filter(|s| !s.is_empty())
            .or(legacy_start)
            .ok_or(GrammarError::MissingKey("S0"))?;

        Grammar::from_text(nonterminals, terminals, productions, &start, kind)
    }

    /// Pretty-printed JSON, two-space indented, non-ASCII left as is.
    pub fn to_json(&self) -> Result<String, GrammarError> {
        Ok(serde_json::to_string_pretty(&self.to_record())?)
    }

    pub fn from_json(text: &str) -> Result<Grammar, GrammarError> {
        let record: GrammarRecord = serde_json::from_str(text)?;
        Grammar::from_record(record)
    }
}

pub fn load_grammar(path: impl AsRef<Path>) -> Result<Grammar, GrammarError> {
    let path = path.as_ref();
    debug!(path = %path.display(), "loading grammar");
    let text = std::fs::read_to_string(path)?;
    Grammar::from_json(&text)
}

pub fn save_grammar(grammar: &Grammar, path: impl AsRef<Path>) -> Result<(), GrammarError> {
    let path = path.as_ref();
    debug!(path = %path.display(), rules = grammar.production_count(), "saving grammar");
    std::fs::write(path, grammar.to_json()?)?;
    Ok(())
}
