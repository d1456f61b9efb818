//! Heuristic suffix stemming with a bounded cache.
//!
//! The stemmer is a deliberately simplified suffix stripper, not a full
//! Porter/Snowball implementation. Regular present/gerund variants collapse
//! (`running`/`runs` → `run`) while irregular forms (`ran`) do not; ranking
//! behavior downstream depends on exactly this.

use std::num::NonZeroUsize;

use lru::LruCache;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Default capacity of the stem cache.
pub const DEFAULT_STEM_CACHE_CAPACITY: usize = 4096;

/// Read-only view of the stem cache state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cached entries.
    pub size: usize,
    /// Maximum number of entries.
    pub capacity: usize,
}

/// Apply the stemming rules without caching.
///
/// Deterministic and idempotent: stemming an already-stemmed word is a no-op.
/// Idempotency comes from running the suffix rules to a fixpoint; each pass
/// strictly shortens the word, so the loop always terminates.
pub fn stem_word(word: &str) -> String {
    let mut current = word.to_lowercase();
    loop {
        let next = strip_suffix_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn strip_suffix_once(word: &str) -> String {
    let w = word.to_string();
    if w.len() <= 3 {
        return w;
    }

    // "ies" -> "y": libraries -> library
    if let Some(base) = w.strip_suffix("ies") {
        if base.len() >= 2 {
            return format!("{base}y");
        }
    }

    // gerund: running -> run
    if let Some(base) = w.strip_suffix("ing") {
        if base.len() >= 3 {
            return undouble(base);
        }
    }

    // past tense: stopped -> stop
    if let Some(base) = w.strip_suffix("ed") {
        if base.len() >= 3 {
            return undouble(base);
        }
    }

    // sibilant plural: boxes -> box
    if let Some(base) = w.strip_suffix("es") {
        if base.len() >= 3
            && (base.ends_with('s')
                || base.ends_with('x')
                || base.ends_with('z')
                || base.ends_with("ch")
                || base.ends_with("sh"))
        {
            return base.to_string();
        }
    }

    // simple plural: runs -> run, but not "ss" (class) or "us" (status)
    if w.ends_with('s') && !w.ends_with("ss") && !w.ends_with("us") && !w.ends_with("is") {
        return w[..w.len() - 1].to_string();
    }

    w
}

/// Collapse a trailing doubled consonant (runn -> run). The letters l, s and
/// z keep their doubling (fall, miss, buzz).
fn undouble(base: &str) -> String {
    let chars: Vec<char> = base.chars().collect();
    if chars.len() >= 2 {
        let last = chars[chars.len() - 1];
        let prev = chars[chars.len() - 2];
        if last == prev && last.is_ascii_alphabetic() && !matches!(last, 'l' | 's' | 'z' | 'a' | 'e' | 'i' | 'o' | 'u') {
            return chars[..chars.len() - 1].iter().collect();
        }
    }
    base.to_string()
}

/// A fixed-capacity, thread-safe stem cache.
///
/// Keys are input words; values are their stems. The cache is process-local
/// mutable state with explicit clear and inspection operations.
pub struct StemCache {
    cache: Mutex<LruCache<String, String>>,
}

impl StemCache {
    /// Create a cache with the default capacity.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_STEM_CACHE_CAPACITY)
    }

    /// Create a cache bounded to `capacity` entries (minimum 1).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least 1");
        StemCache {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Stem a word, consulting the cache first.
    pub fn stem(&self, word: &str) -> String {
        let mut cache = self.cache.lock();
        if let Some(stemmed) = cache.get(word) {
            return stemmed.clone();
        }
        let stemmed = stem_word(word);
        cache.put(word.to_string(), stemmed.clone());
        stemmed
    }

    /// Drop all cached entries.
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    /// Current cache size and capacity.
    pub fn stats(&self) -> CacheStats {
        let cache = self.cache.lock();
        CacheStats {
            size: cache.len(),
            capacity: cache.cap().get(),
        }
    }
}

impl Default for StemCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StemCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("StemCache")
            .field("size", &stats.size)
            .field("capacity", &stats.capacity)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_present_gerund_pairs_collapse() {
        assert_eq!(stem_word("running"), stem_word("runs"));
        assert_eq!(stem_word("running"), "run");
        assert_eq!(stem_word("testing"), stem_word("tests"));
    }

    #[test]
    fn test_irregular_forms_stay_apart() {
        // Known limitation of the heuristic stemmer.
        assert_ne!(stem_word("ran"), stem_word("running"));
    }

    #[test]
    fn test_idempotent() {
        for word in ["running", "libraries", "boxes", "stopped", "frameworks"] {
            let once = stem_word(word);
            assert_eq!(stem_word(&once), once, "stem not idempotent for {word}");
        }
    }

    #[test]
    fn test_suffix_rules() {
        assert_eq!(stem_word("libraries"), "library");
        assert_eq!(stem_word("boxes"), "box");
        assert_eq!(stem_word("stopped"), "stop");
        assert_eq!(stem_word("falling"), "fall");
        assert_eq!(stem_word("status"), "status");
        assert_eq!(stem_word("class"), "class");
    }

    #[test]
    fn test_cache_roundtrip_and_clear() {
        let cache = StemCache::with_capacity(8);
        assert_eq!(cache.stem("running"), "run");
        assert_eq!(cache.stem("running"), "run");
        assert_eq!(cache.stats().size, 1);
        cache.clear();
        assert_eq!(cache.stats().size, 0);
        assert_eq!(cache.stats().capacity, 8);
    }

    #[test]
    fn test_eviction_respects_capacity() {
        let cache = StemCache::with_capacity(2);
        cache.stem("alpha");
        cache.stem("beta");
        cache.stem("gamma");
        assert_eq!(cache.stats().size, 2);
    }
}
