//! # Quarry
//!
//! An embedded full-text search and ranking engine for repository records.
//!
//! ## Features
//!
//! - Pure Rust implementation
//! - Unicode-aware tokenization with suffix stemming
//! - In-memory inverted index with per-field postings
//! - TF-IDF scoring with field weighting
//! - Phrase, field, wildcard and fuzzy query clauses
//! - Structured filters, sorting and pagination
//! - Prefix suggestions and search-history integration
//! - Step-by-step explanation traces
//! - Checksummed index serialization for fast reload
//!
//! ```
//! use quarry::{Engine, EngineConfig, Repo, SearchRequest};
//!
//! let engine = Engine::new(EngineConfig::default());
//! engine.initialize(&[
//!     Repo::new(1, "react").owner("facebook").language("JavaScript"),
//!     Repo::new(2, "vue").owner("vuejs").language("TypeScript"),
//! ])?;
//!
//! let results = engine.search(&SearchRequest::keyword("react"))?;
//! assert_eq!(results[0].doc_id, 1);
//! # Ok::<(), quarry::QuarryError>(())
//! ```

// Core modules
pub mod analysis;
pub mod data;
pub mod engine;
pub mod error;
pub mod history;
pub mod index;
pub mod query;

// Re-exports for the public API
pub use analysis::{Analyzer, Keyword, Token, TokenKind};
pub use data::{Repo, SearchField};
pub use engine::config::{EngineConfig, FieldWeights, IndexingConfig, SearchConfig};
pub use engine::{Engine, SearchStatistics};
pub use error::{QuarryError, Result};
pub use history::{HistoryEntry, HistoryStore, MemoryHistory};
pub use index::{IndexStats, InvertedIndex};
pub use query::explain::{ExplainStep, ExplanationTrace};
pub use query::parser::{ParsedQuery, QueryParser};
pub use query::request::{
    DateField, DateRange, Filters, SearchKind, SearchRequest, SortBy, SortOrder,
};
pub use query::result::{
    RelevanceFactor, ResultMetadata, SearchResult, Suggestion, SuggestionKind,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
