//! Text analysis for repository search.
//!
//! This module turns raw field text into normalized, stemmed terms ready for
//! indexing or query matching:
//!
//! ```text
//! Text → Tokenizer → Token Stream → Stop-word Filter → Stemmer → Terms
//! ```
//!
//! # Modules
//!
//! - [`token`]: token representation
//! - [`tokenizer`]: word/number/symbol segmentation
//! - [`stem`]: heuristic suffix stemmer with a bounded LRU cache
//! - [`analyzer`]: the full pipeline plus similarity, n-grams, keyword
//!   extraction and prefix suggestions

pub mod analyzer;
pub mod stem;
pub mod token;
pub mod tokenizer;

pub use analyzer::{Analyzer, Keyword};
pub use stem::{CacheStats, StemCache};
pub use token::{Token, TokenKind};
pub use tokenizer::tokenize;
