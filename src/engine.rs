//! The engine facade: lifecycle, configuration and the public operations.
//!
//! State machine: `Uninitialized → Ready → Disposed`. `initialize` builds
//! the index (idempotent while Ready: rebuilds); `dispose` releases it and
//! is terminal. Query operations are valid only in `Ready` and fail with
//! `NotInitialized` otherwise.
//!
//! Concurrency: the index sits behind a `parking_lot::RwLock`, so searches
//! against an unchanged index run concurrently while `initialize`,
//! `update_index`, `remove_from_index` and `load_index` serialize against
//! readers and each other. All operations complete synchronously.

pub mod config;

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use log::{debug, info};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::analysis::Analyzer;
use crate::data::Repo;
use crate::error::{QuarryError, Result};
use crate::history::{HistoryEntry, HistoryStore};
use crate::index::InvertedIndex;
use crate::query::executor::QueryExecutor;
use crate::query::explain::ExplanationTrace;
use crate::query::parser::QueryParser;
use crate::query::request::{SearchKind, SearchRequest};
use crate::query::result::{SearchResult, Suggestion, SuggestionKind};

use self::config::EngineConfig;

/// Read-only engine aggregates, recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SearchStatistics {
    /// Number of indexed documents.
    pub total_documents: u64,
    /// Number of distinct terms.
    pub total_terms: u64,
    /// Approximate index size in bytes.
    pub index_size: u64,
    /// Wall-clock time of the most recent search.
    pub last_search_ms: f64,
}

enum EngineState {
    Uninitialized,
    Ready(InvertedIndex),
    Disposed,
}

/// The public search engine over a repository corpus.
pub struct Engine {
    config: EngineConfig,
    analyzer: Arc<Analyzer>,
    parser: QueryParser,
    state: RwLock<EngineState>,
    suggestion_cache: Mutex<Option<Arc<Vec<String>>>>,
    history: Option<Arc<dyn HistoryStore>>,
    last_search_ms: Mutex<f64>,
}

impl Engine {
    /// Create an engine with the given configuration (clamped into safe
    /// ranges). The engine starts `Uninitialized`.
    pub fn new(config: EngineConfig) -> Self {
        let config = config.clamped();
        let analyzer = Arc::new(Analyzer::new());
        let parser = QueryParser::new(analyzer.clone());
        Engine {
            config,
            analyzer,
            parser,
            state: RwLock::new(EngineState::Uninitialized),
            suggestion_cache: Mutex::new(None),
            history: None,
            last_search_ms: Mutex::new(0.0),
        }
    }

    /// Attach a search-history collaborator. Non-empty searches are
    /// recorded into it and history/popular suggestions draw from it.
    pub fn with_history(mut self, history: Arc<dyn HistoryStore>) -> Self {
        self.history = Some(history);
        self
    }

    /// The effective (clamped) configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared text analyzer.
    pub fn analyzer(&self) -> &Arc<Analyzer> {
        &self.analyzer
    }

    /// Build the index over a corpus, replacing any existing index.
    ///
    /// Valid from `Uninitialized` (first build) and `Ready` (rebuild);
    /// fails after `dispose`.
    pub fn initialize(&self, corpus: &[Repo]) -> Result<()> {
        let mut state = self.state.write();
        if matches!(*state, EngineState::Disposed) {
            return Err(QuarryError::not_initialized(
                "initialize called after dispose",
            ));
        }

        let mut index = InvertedIndex::new(
            self.analyzer.clone(),
            self.config.indexing.max_documents,
        );
        for batch in corpus.chunks(self.config.indexing.batch_size) {
            for doc in batch {
                index.upsert(doc.clone());
            }
            debug!("indexed batch of {} documents", batch.len());
        }

        let stats = index.stats();
        info!(
            "engine initialized: {} documents, {} terms",
            stats.total_documents, stats.total_terms
        );
        *state = EngineState::Ready(index);
        drop(state);
        self.invalidate_suggestions();
        Ok(())
    }

    /// Release the index and enter the terminal `Disposed` state.
    pub fn dispose(&self) {
        *self.state.write() = EngineState::Disposed;
        self.invalidate_suggestions();
        debug!("engine disposed");
    }

    /// True while the engine holds a built index.
    pub fn is_ready(&self) -> bool {
        matches!(*self.state.read(), EngineState::Ready(_))
    }

    /// Execute a keyword search.
    ///
    /// Validation (kind, emptiness, length) happens before any index
    /// access; a query that fails validation is never recorded into
    /// history because it never enters the ranking path.
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        self.ensure_supported(request.kind)?;
        let started = Instant::now();
        let results = self.read_index("search", |index| {
            let parsed = self.parser.parse(&request.text)?;
            self.executor(index).execute(&parsed, request)
        })?;
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        *self.last_search_ms.lock() = elapsed_ms;

        if let Some(history) = &self.history {
            history.record(HistoryEntry {
                query: request.text.clone(),
                kind: request.kind.as_str().to_string(),
                result_count: results.len(),
                execution_time_ms: elapsed_ms,
                filters: request.filters.clone(),
                timestamp: Utc::now(),
            });
        }
        Ok(results)
    }

    /// Trace a search through its execution steps.
    ///
    /// Runs the real search path, so the ranked order matches
    /// [`search`](Self::search) for the same request.
    pub fn explain(&self, request: &SearchRequest) -> Result<ExplanationTrace> {
        self.ensure_supported(request.kind)?;
        self.read_index("explain", |index| {
            let started = Instant::now();
            let parsed = self.parser.parse(&request.text)?;
            let parse_ms = started.elapsed().as_secs_f64() * 1000.0;
            self.executor(index).explain(&parsed, request, parse_ms)
        })
    }

    /// Case-insensitive prefix completion against the indexed vocabulary,
    /// merged with history and popular suggestions when a history
    /// collaborator is attached.
    ///
    /// Prefixes shorter than two characters yield an empty list, not an
    /// error.
    pub fn suggest(&self, prefix: &str, limit: usize) -> Result<Vec<Suggestion>> {
        let trimmed = prefix.trim();
        if trimmed.chars().count() < 2 || limit == 0 {
            return Ok(Vec::new());
        }
        let needle = trimmed.to_lowercase();

        let mut suggestions = self.read_index("suggest", |index| {
            let vocabulary = self.vocabulary(index);
            let total_docs = index.total_documents().max(1) as f64;
            let mut completions: Vec<Suggestion> = vocabulary
                .iter()
                .filter(|term| term.starts_with(&needle))
                .map(|term| {
                    let df = index
                        .global_postings(term)
                        .map_or(0, |list| list.doc_frequency());
                    Suggestion {
                        text: term.clone(),
                        score: df as f64 / total_docs,
                        kind: SuggestionKind::Completion,
                    }
                })
                .collect();
            completions.sort_by(|a, b| {
                b.score
                    .partial_cmp(&a.score)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then_with(|| a.text.cmp(&b.text))
            });
            completions.truncate(limit);
            Ok(completions)
        })?;

        if let Some(history) = &self.history {
            for entry in history.recent(limit) {
                if entry.query.to_lowercase().starts_with(&needle) {
                    suggestions.push(Suggestion {
                        text: entry.query,
                        score: 0.5,
                        kind: SuggestionKind::History,
                    });
                }
            }
            for (query, count) in history.popular(limit) {
                if query.to_lowercase().starts_with(&needle) {
                    suggestions.push(Suggestion {
                        text: query,
                        score: count as f64,
                        kind: SuggestionKind::Popular,
                    });
                }
            }
        }

        let mut seen = ahash::AHashSet::new();
        suggestions.retain(|s| seen.insert(s.text.clone()));
        suggestions.truncate(limit);
        Ok(suggestions)
    }

    /// Recomputed engine statistics.
    pub fn stats(&self) -> Result<SearchStatistics> {
        let last_search_ms = *self.last_search_ms.lock();
        self.read_index("stats", |index| {
            let stats = index.stats();
            Ok(SearchStatistics {
                total_documents: stats.total_documents,
                total_terms: stats.total_terms,
                index_size: stats.index_size,
                last_search_ms,
            })
        })
    }

    /// Upsert one document: prior postings for its id are removed, then it
    /// is re-analyzed and re-inserted. Invalidates the suggestion cache.
    pub fn update_index(&self, doc: Repo) -> Result<()> {
        self.write_index("update_index", |index| {
            index.upsert(doc);
            Ok(())
        })?;
        self.invalidate_suggestions();
        Ok(())
    }

    /// Remove one document and every posting referencing it. Removing an
    /// unknown id is a no-op. Invalidates the suggestion cache.
    pub fn remove_from_index(&self, doc_id: u64) -> Result<()> {
        self.write_index("remove_from_index", |index| {
            index.remove(doc_id);
            Ok(())
        })?;
        self.invalidate_suggestions();
        Ok(())
    }

    /// Serialize the index into a compact blob for fast reload.
    pub fn serialize_index(&self) -> Result<Vec<u8>> {
        self.read_index("serialize_index", |index| Ok(index.serialize()))
    }

    /// Replace the index with a previously serialized blob.
    ///
    /// The blob is fully verified before any state changes; a corrupt blob
    /// leaves the engine untouched. Valid from `Uninitialized` and
    /// `Ready`.
    pub fn load_index(&self, bytes: &[u8]) -> Result<()> {
        let mut state = self.state.write();
        if matches!(*state, EngineState::Disposed) {
            return Err(QuarryError::not_initialized(
                "load_index called after dispose",
            ));
        }
        let decoded = crate::index::codec::decode(
            bytes,
            self.analyzer.clone(),
            self.config.indexing.max_documents,
        )?;
        *state = EngineState::Ready(decoded);
        drop(state);
        self.invalidate_suggestions();
        Ok(())
    }

    /// Recent history entries, newest first; empty without a collaborator.
    pub fn recent_searches(&self, count: usize) -> Vec<HistoryEntry> {
        self.history
            .as_ref()
            .map_or_else(Vec::new, |h| h.recent(count))
    }

    /// Frequency-ranked queries; empty without a collaborator.
    pub fn popular_searches(&self, count: usize) -> Vec<(String, usize)> {
        self.history
            .as_ref()
            .map_or_else(Vec::new, |h| h.popular(count))
    }

    /// Clear recorded history, if a collaborator is attached.
    pub fn clear_history(&self) {
        if let Some(history) = &self.history {
            history.clear();
        }
    }

    // --- internals ---

    fn ensure_supported(&self, kind: SearchKind) -> Result<()> {
        match kind {
            SearchKind::Keyword => Ok(()),
            SearchKind::Semantic => Err(QuarryError::unsupported_search_type(
                "semantic search is not implemented",
            )),
            SearchKind::Conversational => Err(QuarryError::unsupported_search_type(
                "conversational search is not implemented",
            )),
        }
    }

    fn executor<'a>(&'a self, index: &'a InvertedIndex) -> QueryExecutor<'a> {
        QueryExecutor::new(
            index,
            &self.config.indexing.field_weights,
            self.config.search.fuzzy_threshold,
            self.config.search.default_limit,
            self.config.search.max_limit,
        )
    }

    fn vocabulary(&self, index: &InvertedIndex) -> Arc<Vec<String>> {
        let mut cache = self.suggestion_cache.lock();
        if let Some(vocabulary) = cache.as_ref() {
            return vocabulary.clone();
        }
        let vocabulary = Arc::new(index.all_terms());
        *cache = Some(vocabulary.clone());
        vocabulary
    }

    fn invalidate_suggestions(&self) {
        *self.suggestion_cache.lock() = None;
    }

    fn read_index<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&InvertedIndex) -> Result<T>,
    ) -> Result<T> {
        let state = self.state.read();
        match &*state {
            EngineState::Ready(index) => f(index),
            EngineState::Uninitialized => Err(QuarryError::not_initialized(format!(
                "{operation} requires initialize() first"
            ))),
            EngineState::Disposed => Err(QuarryError::not_initialized(format!(
                "{operation} called after dispose()"
            ))),
        }
    }

    fn write_index<T>(
        &self,
        operation: &str,
        f: impl FnOnce(&mut InvertedIndex) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.state.write();
        match &mut *state {
            EngineState::Ready(index) => f(index),
            EngineState::Uninitialized => Err(QuarryError::not_initialized(format!(
                "{operation} requires initialize() first"
            ))),
            EngineState::Disposed => Err(QuarryError::not_initialized(format!(
                "{operation} called after dispose()"
            ))),
        }
    }
}
