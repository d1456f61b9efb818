//! Posting lists: per-term occurrence records.

use serde::{Deserialize, Serialize};

/// One (term, document) occurrence record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    /// The document this posting belongs to.
    pub doc_id: u64,
    /// Number of occurrences of the term in the document (scoped to the
    /// index the posting lives in: field-level or global).
    pub term_frequency: u32,
    /// Token positions of each occurrence, ascending.
    pub positions: Vec<u32>,
}

/// All postings for a single term within one index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingList {
    /// Postings in document insertion order.
    pub postings: Vec<Posting>,
}

impl PostingList {
    /// Number of documents containing the term.
    pub fn doc_frequency(&self) -> usize {
        self.postings.len()
    }

    /// The posting for a specific document, if present.
    pub fn get(&self, doc_id: u64) -> Option<&Posting> {
        self.postings.iter().find(|p| p.doc_id == doc_id)
    }

    /// Record one occurrence at `position`, extending an existing posting
    /// for the document or opening a new one.
    pub fn add_occurrence(&mut self, doc_id: u64, position: u32) {
        if let Some(posting) = self.postings.iter_mut().find(|p| p.doc_id == doc_id) {
            posting.term_frequency += 1;
            posting.positions.push(position);
        } else {
            self.postings.push(Posting {
                doc_id,
                term_frequency: 1,
                positions: vec![position],
            });
        }
    }

    /// Remove the posting for a document. Returns true if one was removed.
    pub fn remove_doc(&mut self, doc_id: u64) -> bool {
        let before = self.postings.len();
        self.postings.retain(|p| p.doc_id != doc_id);
        self.postings.len() != before
    }

    /// True when no postings remain.
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}
