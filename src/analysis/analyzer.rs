//! The analysis pipeline: tokenize, filter stop words, stem.
//!
//! Also hosts the lexical utilities built on top of the pipeline: token
//! overlap similarity, n-gram extraction, keyword ranking and vocabulary
//! prefix suggestions. All operations are pure over their arguments except
//! the stem cache, which is owned, bounded state with explicit clearing.

use std::sync::LazyLock;

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use super::stem::{CacheStats, StemCache};
use super::token::{Token, TokenKind};
use super::tokenizer::{normalize, tokenize};

/// Articles, copulas and common prepositions filtered before indexing.
static STOP_WORDS: LazyLock<AHashSet<&'static str>> = LazyLock::new(|| {
    [
        "a", "an", "the", "is", "are", "was", "were", "be", "been", "being", "am", "of", "in",
        "on", "at", "by", "for", "with", "to", "from", "and", "or", "not", "as", "it", "its",
        "this", "that", "these", "those",
    ]
    .into_iter()
    .collect()
});

/// A keyword extracted from text, ranked by a frequency/position score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    /// The stemmed keyword text.
    pub text: String,
    /// Relevance score; higher is more salient.
    pub score: f64,
}

/// Text analyzer combining the tokenizer, stop-word filter and stemmer.
#[derive(Debug, Default)]
pub struct Analyzer {
    stem_cache: StemCache,
}

impl Analyzer {
    /// Create an analyzer with the default stem cache capacity.
    pub fn new() -> Self {
        Analyzer {
            stem_cache: StemCache::new(),
        }
    }

    /// Create an analyzer whose stem cache is bounded to `capacity` entries.
    pub fn with_cache_capacity(capacity: usize) -> Self {
        Analyzer {
            stem_cache: StemCache::with_capacity(capacity),
        }
    }

    /// Split text into tokens. See [`tokenize`].
    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        tokenize(text)
    }

    /// Lowercase and strip punctuation, joining `React.js`-style compounds.
    pub fn normalize(&self, text: &str) -> String {
        normalize(text)
    }

    /// Filter tokens whose normalized form is a stop word.
    pub fn remove_stop_words(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens
            .into_iter()
            .filter(|t| !STOP_WORDS.contains(t.normalized.as_str()))
            .collect()
    }

    /// Stem a single word through the cache.
    pub fn stem(&self, word: &str) -> String {
        self.stem_cache.stem(word)
    }

    /// Drop all cached stems.
    pub fn clear_cache(&self) {
        self.stem_cache.clear();
    }

    /// Inspect the stem cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.stem_cache.stats()
    }

    /// Run the full pipeline: tokenize, drop stop words and symbols, stem.
    ///
    /// The returned tokens carry the stemmed term in `normalized` and keep
    /// their original field positions for phrase matching.
    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let tokens = self.remove_stop_words(tokenize(text));
        tokens
            .into_iter()
            .filter(|t| t.kind != TokenKind::Symbol && !t.normalized.is_empty())
            .map(|mut t| {
                if t.kind == TokenKind::Word {
                    t.normalized = self.stem_cache.stem(&t.normalized);
                }
                t
            })
            .collect()
    }

    /// Analyze a bare query term into its index form.
    pub fn analyze_term(&self, term: &str) -> String {
        let normalized = normalize(term);
        if normalized.is_empty() {
            return normalized;
        }
        self.stem_cache.stem(&normalized)
    }

    /// Token-overlap similarity in `[0, 1]`.
    ///
    /// Jaccard overlap of normalized token sets: more shared tokens never
    /// lowers the similarity for same-length inputs.
    pub fn similarity(&self, a: &str, b: &str) -> f64 {
        let set_a: AHashSet<String> = tokenize(a)
            .into_iter()
            .map(|t| t.normalized)
            .filter(|n| !n.is_empty())
            .collect();
        let set_b: AHashSet<String> = tokenize(b)
            .into_iter()
            .map(|t| t.normalized)
            .filter(|n| !n.is_empty())
            .collect();

        if set_a.is_empty() && set_b.is_empty() {
            return if a.trim() == b.trim() { 1.0 } else { 0.0 };
        }

        let shared = set_a.intersection(&set_b).count();
        let union = set_a.union(&set_b).count();
        if union == 0 {
            0.0
        } else {
            shared as f64 / union as f64
        }
    }

    /// Sliding-window n-grams over the token sequence.
    pub fn ngrams(&self, tokens: &[Token], n: usize) -> Vec<String> {
        if n == 0 || tokens.len() < n {
            return Vec::new();
        }
        tokens
            .windows(n)
            .map(|window| {
                window
                    .iter()
                    .map(|t| t.normalized.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }

    /// Rank the top `k` keywords by frequency and position.
    ///
    /// Earlier occurrences weigh more; the result is sorted by descending
    /// score.
    pub fn keywords(&self, text: &str, k: usize) -> Vec<Keyword> {
        let tokens = self.analyze(text);
        let mut scores: AHashMap<String, f64> = AHashMap::new();
        for token in &tokens {
            let position_bonus = 1.0 / (1.0 + token.position as f64);
            *scores.entry(token.normalized.clone()).or_insert(0.0) += 1.0 + position_bonus;
        }

        let mut ranked: Vec<Keyword> = scores
            .into_iter()
            .map(|(text, score)| Keyword { text, score })
            .collect();
        ranked.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.text.cmp(&b.text))
        });
        ranked.truncate(k);
        ranked
    }

    /// Case-insensitive prefix completion against a supplied vocabulary.
    pub fn suggest_from(&self, prefix: &str, vocabulary: &[String], limit: usize) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        if prefix.is_empty() || limit == 0 {
            return Vec::new();
        }
        vocabulary
            .iter()
            .filter(|word| word.to_lowercase().starts_with(&prefix))
            .take(limit)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_word_removal() {
        let analyzer = Analyzer::new();
        let tokens = analyzer.remove_stop_words(tokenize("the quick fox is fast"));
        let words: Vec<&str> = tokens.iter().map(|t| t.normalized.as_str()).collect();
        assert_eq!(words, vec!["quick", "fox", "fast"]);
    }

    #[test]
    fn test_analyze_stems_words() {
        let analyzer = Analyzer::new();
        let tokens = analyzer.analyze("running tests");
        let terms: Vec<&str> = tokens.iter().map(|t| t.normalized.as_str()).collect();
        assert_eq!(terms, vec!["run", "test"]);
    }

    #[test]
    fn test_similarity_bounds_and_monotonicity() {
        let analyzer = Analyzer::new();
        let identical = analyzer.similarity("react library", "react library");
        let partial = analyzer.similarity("react library", "react framework");
        let disjoint = analyzer.similarity("react library", "vue framework");
        assert!((identical - 1.0).abs() < f64::EPSILON);
        assert!(partial < identical);
        assert!(disjoint < partial);
        assert!((0.0..=1.0).contains(&disjoint));
    }

    #[test]
    fn test_ngram_counts_shrink_with_n() {
        let analyzer = Analyzer::new();
        let tokens = tokenize("React JavaScript library");
        let bigrams = analyzer.ngrams(&tokens, 2);
        let trigrams = analyzer.ngrams(&tokens, 3);
        assert_eq!(bigrams.len(), 2);
        assert_eq!(trigrams.len(), 1);
        assert!(bigrams.len() > trigrams.len());
        assert!(analyzer.ngrams(&tokens, 4).is_empty());
    }

    #[test]
    fn test_keywords_descending_order() {
        let analyzer = Analyzer::new();
        let keywords =
            analyzer.keywords("search engine search index ranking search relevance", 3);
        assert_eq!(keywords.len(), 3);
        assert_eq!(keywords[0].text, "search");
        for pair in keywords.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn test_suggest_from_vocabulary() {
        let analyzer = Analyzer::new();
        let vocabulary: Vec<String> = ["react", "reactive", "redux", "vue"]
            .into_iter()
            .map(String::from)
            .collect();
        let suggestions = analyzer.suggest_from("Rea", &vocabulary, 10);
        assert_eq!(suggestions, vec!["react".to_string(), "reactive".to_string()]);
        assert_eq!(analyzer.suggest_from("rea", &vocabulary, 1).len(), 1);
        assert!(analyzer.suggest_from("zz", &vocabulary, 10).is_empty());
    }

    #[test]
    fn test_cache_lifecycle_through_analyzer() {
        let analyzer = Analyzer::new();
        analyzer.stem("running");
        assert!(analyzer.cache_stats().size >= 1);
        analyzer.clear_cache();
        assert_eq!(analyzer.cache_stats().size, 0);
    }
}
