//! The in-memory inverted index over a repository corpus.

use std::sync::Arc;

use ahash::AHashMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::analysis::Analyzer;
use crate::data::{Repo, SearchField};
use crate::error::{QuarryError, Result};

use super::posting::PostingList;

/// Term → posting-list map for one scope (a single field, or the global
/// concatenated text).
#[derive(Debug, Clone, Default)]
pub struct FieldIndex {
    terms: AHashMap<String, PostingList>,
}

impl FieldIndex {
    /// Record one term occurrence.
    pub fn add_occurrence(&mut self, term: &str, doc_id: u64, position: u32) {
        self.terms
            .entry(term.to_string())
            .or_default()
            .add_occurrence(doc_id, position);
    }

    /// Remove every posting for a document, dropping terms that become empty
    /// so no orphaned entries remain.
    pub fn remove_doc(&mut self, doc_id: u64) {
        self.terms.retain(|_, list| {
            list.remove_doc(doc_id);
            !list.is_empty()
        });
    }

    /// The posting list for a term, if the term is indexed.
    pub fn postings(&self, term: &str) -> Option<&PostingList> {
        self.terms.get(term)
    }

    /// Number of distinct terms.
    pub fn term_count(&self) -> usize {
        self.terms.len()
    }

    /// Iterate term/posting pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &PostingList)> {
        self.terms.iter()
    }

    /// Install a fully-formed posting list, used when decoding a blob.
    pub(crate) fn insert_list(&mut self, term: String, list: PostingList) {
        self.terms.insert(term, list);
    }

    /// All terms, sorted for deterministic output.
    pub fn sorted_terms(&self) -> Vec<String> {
        let mut terms: Vec<String> = self.terms.keys().cloned().collect();
        terms.sort();
        terms
    }

    fn approximate_size(&self) -> u64 {
        self.terms
            .iter()
            .map(|(term, list)| {
                term.len() as u64
                    + list
                        .postings
                        .iter()
                        .map(|p| 16 + 4 * p.positions.len() as u64)
                        .sum::<u64>()
            })
            .sum()
    }
}

/// Read-only index aggregates, recomputed on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of indexed documents.
    pub total_documents: u64,
    /// Number of distinct terms in the global index.
    pub total_terms: u64,
    /// Approximate in-memory size of all posting data, in bytes.
    pub index_size: u64,
}

/// Global plus per-field inverted indices over a repository corpus.
///
/// The global index merges the per-field postings: a term's global frequency
/// for a document is the sum of its per-field frequencies, and its global
/// positions are the per-field positions shifted by a per-field offset so
/// they stay ordered like the concatenated searchable text.
pub struct InvertedIndex {
    analyzer: Arc<Analyzer>,
    global: FieldIndex,
    fields: AHashMap<SearchField, FieldIndex>,
    docs: AHashMap<u64, Repo>,
    doc_order: Vec<u64>,
    doc_lengths: AHashMap<u64, u32>,
    max_documents: usize,
}

impl InvertedIndex {
    /// Create an empty index. `max_documents` caps the corpus size;
    /// inserts beyond the cap are ignored with a warning.
    pub fn new(analyzer: Arc<Analyzer>, max_documents: usize) -> Self {
        let mut fields = AHashMap::new();
        for field in SearchField::ALL {
            fields.insert(field, FieldIndex::default());
        }
        InvertedIndex {
            analyzer,
            global: FieldIndex::default(),
            fields,
            docs: AHashMap::new(),
            doc_order: Vec::new(),
            doc_lengths: AHashMap::new(),
            max_documents,
        }
    }

    /// The analyzer used to build postings.
    pub fn analyzer(&self) -> &Arc<Analyzer> {
        &self.analyzer
    }

    /// Clear existing state and index the given corpus.
    ///
    /// An empty corpus yields an empty index without error.
    pub fn build(&mut self, docs: &[Repo]) {
        self.clear();
        for doc in docs {
            self.upsert(doc.clone());
        }
        debug!(
            "index built: {} documents, {} terms",
            self.docs.len(),
            self.global.term_count()
        );
    }

    /// Drop all indexed state.
    pub fn clear(&mut self) {
        self.global = FieldIndex::default();
        for index in self.fields.values_mut() {
            *index = FieldIndex::default();
        }
        self.docs.clear();
        self.doc_order.clear();
        self.doc_lengths.clear();
    }

    /// Insert or replace a document: any prior postings for its id are
    /// removed across every index before re-analysis.
    pub fn upsert(&mut self, doc: Repo) {
        let doc_id = doc.id;
        let existed = self.docs.contains_key(&doc_id);
        if existed {
            self.remove_postings(doc_id);
        } else if self.docs.len() >= self.max_documents {
            warn!("document cap {} reached, ignoring document {doc_id}", self.max_documents);
            return;
        }

        let mut offset = 0u32;
        let mut total_tokens = 0u32;
        for field in SearchField::ALL {
            let text = doc.field_text(field);
            let tokens = self.analyzer.analyze(&text);
            let span = tokens.iter().map(|t| t.position as u32 + 1).max().unwrap_or(0);
            let field_index = self
                .fields
                .get_mut(&field)
                .expect("all searchable fields are pre-registered");
            for token in &tokens {
                field_index.add_occurrence(&token.normalized, doc_id, token.position as u32);
                self.global
                    .add_occurrence(&token.normalized, doc_id, offset + token.position as u32);
            }
            offset += span;
            total_tokens += tokens.len() as u32;
        }

        self.doc_lengths.insert(doc_id, total_tokens);
        if !existed {
            self.doc_order.push(doc_id);
        }
        self.docs.insert(doc_id, doc);
    }

    /// Delete a document and every posting that references it.
    ///
    /// Returns true when the document was present.
    pub fn remove(&mut self, doc_id: u64) -> bool {
        if self.docs.remove(&doc_id).is_none() {
            return false;
        }
        self.remove_postings(doc_id);
        self.doc_order.retain(|id| *id != doc_id);
        self.doc_lengths.remove(&doc_id);
        debug!("removed document {doc_id}");
        true
    }

    fn remove_postings(&mut self, doc_id: u64) {
        self.global.remove_doc(doc_id);
        for index in self.fields.values_mut() {
            index.remove_doc(doc_id);
        }
    }

    /// TF-IDF for a term within a document, over the concatenated
    /// searchable text. Returns 0 for a term absent from the document or
    /// the corpus.
    pub fn tf_idf(&self, term: &str, doc_id: u64) -> f64 {
        let Some(list) = self.global.postings(term) else {
            return 0.0;
        };
        let Some(posting) = list.get(doc_id) else {
            return 0.0;
        };
        posting.term_frequency as f64 * self.idf(list.doc_frequency())
    }

    /// Inverse document frequency with the log argument floored at 1, so a
    /// term occurring in every document contributes 0 rather than a
    /// division-by-zero or negative weight.
    pub fn idf(&self, doc_frequency: usize) -> f64 {
        if doc_frequency == 0 {
            return 0.0;
        }
        (self.docs.len() as f64 / doc_frequency as f64).max(1.0).ln()
    }

    /// All terms of one field index, sorted.
    pub fn field_terms(&self, field: SearchField) -> Vec<String> {
        self.fields
            .get(&field)
            .map(|index| index.sorted_terms())
            .unwrap_or_default()
    }

    /// The posting list for a term within one field.
    pub fn field_postings(&self, field: SearchField, term: &str) -> Option<&PostingList> {
        self.fields.get(&field).and_then(|index| index.postings(term))
    }

    /// The posting list for a term in the global index.
    pub fn global_postings(&self, term: &str) -> Option<&PostingList> {
        self.global.postings(term)
    }

    /// The full term vocabulary, sorted.
    pub fn all_terms(&self) -> Vec<String> {
        self.global.sorted_terms()
    }

    /// Number of indexed documents.
    pub fn total_documents(&self) -> usize {
        self.docs.len()
    }

    /// Whether a document id is indexed.
    pub fn contains(&self, doc_id: u64) -> bool {
        self.docs.contains_key(&doc_id)
    }

    /// The indexed record for a document id.
    pub fn doc(&self, doc_id: u64) -> Option<&Repo> {
        self.docs.get(&doc_id)
    }

    /// Insertion rank of a document, used to break sort ties.
    pub fn insertion_rank(&self, doc_id: u64) -> usize {
        self.doc_order
            .iter()
            .position(|id| *id == doc_id)
            .unwrap_or(usize::MAX)
    }

    /// Documents in insertion order.
    pub fn docs_in_order(&self) -> impl Iterator<Item = &Repo> {
        self.doc_order.iter().filter_map(|id| self.docs.get(id))
    }

    /// Total analyzed token count for a document.
    pub fn doc_length(&self, doc_id: u64) -> u32 {
        self.doc_lengths.get(&doc_id).copied().unwrap_or(0)
    }

    /// Recomputed aggregates for the current index state.
    pub fn stats(&self) -> IndexStats {
        let index_size = self.global.approximate_size()
            + self
                .fields
                .values()
                .map(FieldIndex::approximate_size)
                .sum::<u64>();
        IndexStats {
            total_documents: self.docs.len() as u64,
            total_terms: self.global.term_count() as u64,
            index_size,
        }
    }

    /// Encode the index into a compact, self-describing binary blob.
    pub fn serialize(&self) -> Vec<u8> {
        super::codec::encode(self)
    }

    /// Replace this index with the contents of a serialized blob.
    ///
    /// The blob is fully verified first; on any error the current index is
    /// left untouched.
    pub fn deserialize(&mut self, bytes: &[u8]) -> Result<()> {
        let decoded = super::codec::decode(bytes, self.analyzer.clone(), self.max_documents)?;
        *self = decoded;
        Ok(())
    }

    pub(crate) fn global_index(&self) -> &FieldIndex {
        &self.global
    }

    pub(crate) fn field_index(&self, field: SearchField) -> &FieldIndex {
        self.fields
            .get(&field)
            .expect("all searchable fields are pre-registered")
    }

    pub(crate) fn doc_order(&self) -> &[u64] {
        &self.doc_order
    }

    /// Reassemble an index from decoded parts, verifying that every posting
    /// references a known document.
    pub(crate) fn from_parts(
        analyzer: Arc<Analyzer>,
        global: FieldIndex,
        fields: AHashMap<SearchField, FieldIndex>,
        docs: AHashMap<u64, Repo>,
        doc_order: Vec<u64>,
        max_documents: usize,
    ) -> Result<Self> {
        for (term, list) in global.iter() {
            for posting in &list.postings {
                if !docs.contains_key(&posting.doc_id) {
                    return Err(QuarryError::deserialization(format!(
                        "posting for term {term:?} references unknown document {}",
                        posting.doc_id
                    )));
                }
            }
        }

        let mut doc_lengths = AHashMap::new();
        for (_, list) in global.iter() {
            for posting in &list.postings {
                *doc_lengths.entry(posting.doc_id).or_insert(0u32) += posting.term_frequency;
            }
        }

        Ok(InvertedIndex {
            analyzer,
            global,
            fields,
            docs,
            doc_order,
            doc_lengths,
            max_documents,
        })
    }
}

impl std::fmt::Debug for InvertedIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let stats = self.stats();
        f.debug_struct("InvertedIndex")
            .field("total_documents", &stats.total_documents)
            .field("total_terms", &stats.total_terms)
            .field("max_documents", &self.max_documents)
            .finish()
    }
}
