//! Query syntax parsing.
//!
//! Supported syntax inside keyword queries:
//!
//! - bare terms: `react router`
//! - quoted phrases: `"state management"`
//! - field clauses: `owner:facebook`, `language:rust`
//! - wildcard clauses: `react*` (prefix match)
//! - fuzzy clauses: `raect~` or `raect~1` (bounded edit distance, default 2)
//!
//! Every clause kind is a distinct [`Clause`] variant so scoring handles
//! them exhaustively.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::analysis::Analyzer;
use crate::analysis::tokenizer::normalize;
use crate::data::SearchField;
use crate::error::{QuarryError, Result};

/// Maximum accepted query length, in characters.
pub const MAX_QUERY_LENGTH: usize = 1000;

/// Default edit distance for fuzzy clauses without an explicit bound.
pub const DEFAULT_FUZZY_EDITS: u32 = 2;

/// Upper bound on a fuzzy clause's requested edit distance.
const MAX_FUZZY_EDITS: u32 = 3;

static PHRASE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]*)""#).expect("phrase regex is valid"));

static FUZZY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)~(\d*)$").expect("fuzzy regex is valid"));

/// One parsed query clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Clause {
    /// A single analyzed term.
    Term(String),
    /// An exact-adjacency phrase of analyzed terms.
    Phrase(Vec<String>),
    /// A field-scoped clause: the named field must equal or contain the
    /// value.
    Field {
        field: SearchField,
        value: String,
    },
    /// A prefix match against normalized index terms.
    Wildcard(String),
    /// An approximate match within a bounded edit distance.
    Fuzzy {
        term: String,
        max_edits: u32,
    },
}

/// A validated, parsed query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// The original query text.
    pub raw_text: String,
    /// Parsed clauses in source order.
    pub clauses: Vec<Clause>,
}

impl ParsedQuery {
    /// True when at least one field clause restricts the result set.
    pub fn has_field_clauses(&self) -> bool {
        self.clauses
            .iter()
            .any(|c| matches!(c, Clause::Field { .. }))
    }
}

/// Parses raw query text into a [`ParsedQuery`].
pub struct QueryParser {
    analyzer: Arc<Analyzer>,
}

impl QueryParser {
    /// Create a parser sharing the engine's analyzer.
    pub fn new(analyzer: Arc<Analyzer>) -> Self {
        QueryParser { analyzer }
    }

    /// Validate and parse query text.
    ///
    /// Empty/whitespace-only text and text longer than
    /// [`MAX_QUERY_LENGTH`] are rejected before any index access.
    pub fn parse(&self, text: &str) -> Result<ParsedQuery> {
        if text.trim().is_empty() {
            return Err(QuarryError::invalid_query("query text is empty"));
        }
        let char_count = text.chars().count();
        if char_count > MAX_QUERY_LENGTH {
            return Err(QuarryError::invalid_query(format!(
                "query text is {char_count} characters, maximum is {MAX_QUERY_LENGTH}"
            )));
        }

        let mut clauses = Vec::new();

        for capture in PHRASE_RE.captures_iter(text) {
            let terms: Vec<String> = self
                .analyzer
                .analyze(&capture[1])
                .into_iter()
                .map(|t| t.normalized)
                .collect();
            if !terms.is_empty() {
                clauses.push(Clause::Phrase(terms));
            }
        }
        let remainder = PHRASE_RE.replace_all(text, " ");

        for raw in remainder.split_whitespace() {
            if let Some((field_name, value)) = raw.split_once(':') {
                if let Some(field) = SearchField::parse(field_name) {
                    let value = normalize(value);
                    if !value.is_empty() {
                        clauses.push(Clause::Field { field, value });
                    }
                    continue;
                }
            }

            if let Some(prefix) = raw.strip_suffix('*') {
                let prefix = normalize(prefix);
                if !prefix.is_empty() {
                    clauses.push(Clause::Wildcard(prefix));
                }
                continue;
            }

            if let Some(capture) = FUZZY_RE.captures(raw) {
                let term = normalize(&capture[1]);
                let max_edits = capture[2]
                    .parse::<u32>()
                    .unwrap_or(DEFAULT_FUZZY_EDITS)
                    .min(MAX_FUZZY_EDITS);
                if !term.is_empty() {
                    clauses.push(Clause::Fuzzy { term, max_edits });
                }
                continue;
            }

            for token in self.analyzer.analyze(raw) {
                clauses.push(Clause::Term(token.normalized));
            }
        }

        Ok(ParsedQuery {
            raw_text: text.to_string(),
            clauses,
        })
    }
}
