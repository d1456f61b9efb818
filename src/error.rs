//! Error types for the quarry library.

use thiserror::Error;

/// Errors that can occur in quarry operations.
#[derive(Error, Debug)]
pub enum QuarryError {
    /// The query text failed validation or could not be parsed.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// An operation was attempted outside the `Ready` state.
    #[error("Engine not initialized: {0}")]
    NotInitialized(String),

    /// A search kind the engine does not implement.
    #[error("Unsupported search type: {0}")]
    UnsupportedSearchType(String),

    /// A serialized index blob failed structural validation.
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// A decoded index violated an internal consistency invariant.
    #[error("Index corruption: {0}")]
    IndexCorruption(String),
}

impl QuarryError {
    pub fn invalid_query(msg: impl Into<String>) -> Self {
        QuarryError::InvalidQuery(msg.into())
    }

    pub fn not_initialized(msg: impl Into<String>) -> Self {
        QuarryError::NotInitialized(msg.into())
    }

    pub fn unsupported_search_type(msg: impl Into<String>) -> Self {
        QuarryError::UnsupportedSearchType(msg.into())
    }

    pub fn deserialization(msg: impl Into<String>) -> Self {
        QuarryError::Deserialization(msg.into())
    }

    pub fn index_corruption(msg: impl Into<String>) -> Self {
        QuarryError::IndexCorruption(msg.into())
    }
}

/// Result type for quarry operations.
pub type Result<T> = std::result::Result<T, QuarryError>;
