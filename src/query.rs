//! Query parsing, execution, scoring and ranking.
//!
//! A raw query string is validated and parsed into a closed set of clause
//! kinds ([`Clause`]) so every kind is handled exhaustively at scoring
//! time, then executed against the inverted index with structured filters,
//! sorting and pagination applied on top of the ranked list.

pub mod executor;
pub mod explain;
pub mod parser;
pub mod request;
pub mod result;

pub use executor::QueryExecutor;
pub use explain::{ExplainStep, ExplanationTrace};
pub use parser::{Clause, ParsedQuery, QueryParser, MAX_QUERY_LENGTH};
pub use request::{
    DateField, DateRange, Filters, SearchKind, SearchRequest, SortBy, SortOrder,
};
pub use result::{RelevanceFactor, ResultMetadata, SearchResult, Suggestion, SuggestionKind};
