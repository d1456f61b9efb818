//! Engine configuration.
//!
//! All values carry documented defaults; invalid values are clamped into a
//! safe range at construction rather than rejected.

use serde::{Deserialize, Serialize};

use crate::data::SearchField;

/// Per-field scoring multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldWeights {
    /// Weight for the name field (default 2.0).
    pub name: f64,
    /// Weight for the description field (default 1.5).
    pub description: f64,
    /// Weight for topic strings (default 1.8).
    pub topics: f64,
    /// Weight for the owner login (default 1.2).
    pub owner: f64,
}

impl Default for FieldWeights {
    fn default() -> Self {
        FieldWeights {
            name: SearchField::Name.default_weight(),
            description: SearchField::Description.default_weight(),
            topics: SearchField::Topics.default_weight(),
            owner: SearchField::Owner.default_weight(),
        }
    }
}

impl FieldWeights {
    /// The weight for a searchable field. Language carries no configurable
    /// weight and scores at 1.0.
    pub fn weight(&self, field: SearchField) -> f64 {
        match field {
            SearchField::Name => self.name,
            SearchField::Description => self.description,
            SearchField::Topics => self.topics,
            SearchField::Owner => self.owner,
            SearchField::Language => 1.0,
        }
    }

    fn clamped(self) -> Self {
        fn clamp_weight(value: f64, default: f64) -> f64 {
            if value.is_finite() {
                value.clamp(0.0, 100.0)
            } else {
                default
            }
        }
        let defaults = FieldWeights::default();
        FieldWeights {
            name: clamp_weight(self.name, defaults.name),
            description: clamp_weight(self.description, defaults.description),
            topics: clamp_weight(self.topics, defaults.topics),
            owner: clamp_weight(self.owner, defaults.owner),
        }
    }
}

/// Index construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Documents indexed per batch during `initialize` (default 100).
    pub batch_size: usize,
    /// Maximum indexable corpus size (default 10,000).
    pub max_documents: usize,
    /// Per-field scoring weights.
    pub field_weights: FieldWeights,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        IndexingConfig {
            batch_size: 100,
            max_documents: 10_000,
            field_weights: FieldWeights::default(),
        }
    }
}

/// Search execution settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Page size when a request does not specify one (default 50).
    pub default_limit: usize,
    /// Hard cap on page size (default 200).
    pub max_limit: usize,
    /// Advisory timeout for callers wrapping the engine in an async
    /// boundary (default 5000). The synchronous engine does not enforce it.
    pub timeout_ms: u64,
    /// Minimum normalized similarity for fuzzy term expansion
    /// (default 0.5).
    pub fuzzy_threshold: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            default_limit: 50,
            max_limit: 200,
            timeout_ms: 5000,
            fuzzy_threshold: 0.5,
        }
    }
}

/// Full engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Index construction settings.
    #[serde(default)]
    pub indexing: IndexingConfig,
    /// Search execution settings.
    #[serde(default)]
    pub search: SearchConfig,
}

impl EngineConfig {
    /// Clamp every value into its safe range.
    pub fn clamped(mut self) -> Self {
        self.indexing.batch_size = self.indexing.batch_size.max(1);
        self.indexing.max_documents = self.indexing.max_documents.max(1);
        self.indexing.field_weights = self.indexing.field_weights.clamped();
        self.search.max_limit = self.search.max_limit.max(1);
        self.search.default_limit = self.search.default_limit.clamp(1, self.search.max_limit);
        self.search.fuzzy_threshold = if self.search.fuzzy_threshold.is_finite() {
            self.search.fuzzy_threshold.clamp(0.0, 1.0)
        } else {
            SearchConfig::default().fuzzy_threshold
        };
        self
    }
}
