//! Token representation.

use serde::{Deserialize, Serialize};

/// Classification of a token produced by the tokenizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Contains at least one alphabetic character.
    Word,
    /// Digits only.
    Number,
    /// Punctuation with no alphanumeric content.
    Symbol,
}

/// A single analyzed unit of text.
///
/// Tokens exist only transiently between analysis and posting construction;
/// they are never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Original substring from the source text.
    pub text: String,
    /// Lowercased (and, after the full pipeline, stemmed) form.
    pub normalized: String,
    /// Token classification.
    pub kind: TokenKind,
    /// Ordinal position within the source field.
    pub position: usize,
}

impl Token {
    /// Create a token at the given position.
    pub fn new(
        text: impl Into<String>,
        normalized: impl Into<String>,
        kind: TokenKind,
        position: usize,
    ) -> Self {
        Token {
            text: text.into(),
            normalized: normalized.into(),
            kind,
            position,
        }
    }
}
