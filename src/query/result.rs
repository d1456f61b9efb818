//! Search results, suggestions and statistics types.

use serde::{Deserialize, Serialize};

use crate::data::SearchField;

/// One term's contribution to a document's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelevanceFactor {
    /// The matched index term.
    pub term: String,
    /// Field the match occurred in.
    pub field: SearchField,
    /// Weighted TF-IDF contribution.
    pub contribution: f64,
}

/// Per-result metadata, recomputed for every query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultMetadata {
    /// Fields in which at least one clause matched.
    pub matched_fields: Vec<SearchField>,
    /// Individual score contributions.
    pub relevance_factors: Vec<RelevanceFactor>,
    /// Wall-clock time of the search that produced this result.
    pub search_time_ms: f64,
    /// Relative confidence in `[0, 1]`, derived from the normalized score.
    pub confidence: f64,
}

/// A single ranked search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Matched document id.
    pub doc_id: u64,
    /// Relative relevance score, normalized against the best hit.
    pub score: f64,
    /// Fields in which the query matched.
    pub matched_fields: Vec<SearchField>,
    /// Scoring metadata.
    pub metadata: ResultMetadata,
}

/// Origin of a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    /// Prefix completion from the index vocabulary.
    Completion,
    /// Drawn from recent search history.
    History,
    /// Drawn from frequency-ranked history.
    Popular,
}

/// An autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Suggested text.
    pub text: String,
    /// Ranking score; higher first.
    pub score: f64,
    /// Where the suggestion came from.
    pub kind: SuggestionKind,
}
