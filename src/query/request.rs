//! Search request types: query text, structured filters, sort and paging.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The kind of search requested.
///
/// Only keyword search is implemented; the other kinds fail fast with
/// `UnsupportedSearchType` instead of silently degrading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    #[default]
    Keyword,
    Semantic,
    Conversational,
}

impl SearchKind {
    /// Name used in errors and history entries.
    pub fn as_str(&self) -> &'static str {
        match self {
            SearchKind::Keyword => "keyword",
            SearchKind::Semantic => "semantic",
            SearchKind::Conversational => "conversational",
        }
    }
}

/// Which timestamp a date-range filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateField {
    Created,
    Updated,
}

/// Inclusive timestamp range filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRange {
    /// Timestamp field the range applies to.
    pub field: DateField,
    /// Inclusive lower bound.
    pub start: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub end: Option<DateTime<Utc>>,
}

/// Structured filters applied after scoring.
///
/// The engine applies exactly what is passed; UI-level defaults (archived
/// hidden, forks shown) are the caller's concern.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    /// Exact primary-language match (case-insensitive).
    pub language: Option<String>,
    /// Inclusive minimum star count.
    pub min_stars: Option<u64>,
    /// Inclusive maximum star count.
    pub max_stars: Option<u64>,
    /// Inclusive creation/update date range.
    pub date_range: Option<DateRange>,
    /// When false, archived repositories are excluded.
    pub show_archived: Option<bool>,
    /// When false, forked repositories are excluded.
    pub show_forks: Option<bool>,
}

impl Filters {
    /// True when no filter is set.
    pub fn is_empty(&self) -> bool {
        self == &Filters::default()
    }
}

/// Sort key for the ranked result list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Relevance,
    Stars,
    Updated,
    Created,
    Name,
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// A full search request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Raw query text.
    pub text: String,
    /// Search kind; only keyword is supported.
    #[serde(default)]
    pub kind: SearchKind,
    /// Structured filters.
    #[serde(default)]
    pub filters: Filters,
    /// Sort key.
    #[serde(default)]
    pub sort_by: SortBy,
    /// Sort direction.
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Page size; clamped into `[1, search.max_limit]`, defaulting to
    /// `search.default_limit` when unset.
    #[serde(default)]
    pub limit: Option<usize>,
    /// Number of ranked results to skip.
    #[serde(default)]
    pub offset: usize,
}

impl SearchRequest {
    /// A keyword request with default filters, sort and paging.
    pub fn keyword(text: impl Into<String>) -> Self {
        SearchRequest {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Set the search kind.
    pub fn kind(mut self, kind: SearchKind) -> Self {
        self.kind = kind;
        self
    }

    /// Set structured filters.
    pub fn filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    /// Set the sort key and direction.
    pub fn sort(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    /// Set the page size.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Set the page offset.
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}
