//! Inverted index construction and maintenance.
//!
//! The index is built in memory from a supplied document set: a global index
//! over all searchable text plus one sub-index per field, each mapping
//! normalized term → posting list. Incremental mutation goes through
//! [`InvertedIndex::upsert`] (remove-then-reinsert) and
//! [`InvertedIndex::remove`]. The whole structure serializes to a compact
//! binary blob for fast reload ([`InvertedIndex::serialize`]).

pub mod codec;
pub mod inverted;
pub mod posting;

pub use inverted::{IndexStats, InvertedIndex};
pub use posting::{Posting, PostingList};
