//! Query execution: candidate collection, scoring, filtering and ranking.
//!
//! Bare terms are additive: a document matching only a subset of terms is
//! ranked lower, not excluded. Field clauses and structured filters are
//! restrictive. Scores combine per-field TF-IDF weighted by the field
//! weights, then normalize against the best hit into a relative `[0, 1]`
//! scale.

use std::time::Instant;

use ahash::{AHashMap, AHashSet};
use log::debug;

use crate::data::SearchField;
use crate::engine::config::FieldWeights;
use crate::error::Result;
use crate::index::InvertedIndex;

use super::explain::{ExplainStep, ExplanationTrace};
use super::parser::{Clause, ParsedQuery};
use super::request::{DateField, Filters, SearchRequest, SortBy, SortOrder};
use super::result::{RelevanceFactor, ResultMetadata, SearchResult};

/// Upper bound on terms a wildcard or fuzzy clause may expand to.
const MAX_EXPANSIONS: usize = 50;

/// Base contribution for any match, so a hit still scores when IDF is zero
/// (a term occurring in every document of a small corpus).
const MATCH_BONUS: f64 = 0.1;

/// Score multiplier for wildcard-expanded terms.
const WILDCARD_DAMP: f64 = 0.8;

/// Score multiplier for phrase matches, on top of the member terms.
const PHRASE_BONUS: f64 = 1.25;

#[derive(Debug, Default)]
struct DocScore {
    score: f64,
    matched: Vec<SearchField>,
    factors: Vec<RelevanceFactor>,
}

impl DocScore {
    fn add(&mut self, field: SearchField, term: &str, contribution: f64) {
        self.score += contribution;
        if !self.matched.contains(&field) {
            self.matched.push(field);
        }
        self.factors.push(RelevanceFactor {
            term: term.to_string(),
            field,
            contribution,
        });
    }
}

/// Executes parsed queries against an index snapshot.
pub struct QueryExecutor<'a> {
    index: &'a InvertedIndex,
    weights: &'a FieldWeights,
    fuzzy_threshold: f64,
    default_limit: usize,
    max_limit: usize,
}

impl<'a> QueryExecutor<'a> {
    /// Create an executor borrowing the index for the duration of one query.
    pub fn new(
        index: &'a InvertedIndex,
        weights: &'a FieldWeights,
        fuzzy_threshold: f64,
        default_limit: usize,
        max_limit: usize,
    ) -> Self {
        QueryExecutor {
            index,
            weights,
            fuzzy_threshold,
            default_limit,
            max_limit,
        }
    }

    /// Run the full pipeline and return the ranked page of results.
    pub fn execute(&self, parsed: &ParsedQuery, request: &SearchRequest) -> Result<Vec<SearchResult>> {
        let started = Instant::now();
        let scores = self.collect(parsed);
        let scores = self.filter(scores, &request.filters);
        let scored = self.score(scores);
        let mut results = self.rank(scored, request);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        for result in &mut results {
            result.metadata.search_time_ms = elapsed_ms;
        }
        debug!(
            "query {:?}: {} results in {elapsed_ms:.3}ms",
            parsed.raw_text,
            results.len()
        );
        Ok(results)
    }

    /// Run the same pipeline as [`execute`](Self::execute), recording a
    /// timed step trace. `parse_ms` is the time the caller spent parsing.
    pub fn explain(
        &self,
        parsed: &ParsedQuery,
        request: &SearchRequest,
        parse_ms: f64,
    ) -> Result<ExplanationTrace> {
        let mut steps = vec![ExplainStep {
            name: "query_parsing".to_string(),
            description: format!(
                "parsed {:?} into {} clauses",
                parsed.raw_text,
                parsed.clauses.len()
            ),
            elapsed_ms: parse_ms,
        }];

        let started = Instant::now();
        let scores = self.collect(parsed);
        let lookup_ms = started.elapsed().as_secs_f64() * 1000.0;
        steps.push(ExplainStep {
            name: "term_lookup".to_string(),
            description: format!("collected {} candidate documents", scores.len()),
            elapsed_ms: lookup_ms,
        });

        let started = Instant::now();
        let scores = self.filter(scores, &request.filters);
        steps.push(ExplainStep {
            name: "filtering".to_string(),
            description: format!("{} candidates after structured filters", scores.len()),
            elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
        });

        let started = Instant::now();
        let scored = self.score(scores);
        steps.push(ExplainStep {
            name: "scoring".to_string(),
            description: format!("normalized scores for {} documents", scored.len()),
            elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
        });

        let started = Instant::now();
        let results = self.rank(scored, request);
        steps.push(ExplainStep {
            name: "ranking".to_string(),
            description: format!(
                "sorted by {:?} {:?}, returning {} results",
                request.sort_by,
                request.sort_order,
                results.len()
            ),
            elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
        });

        let total_ms = steps.iter().map(|s| s.elapsed_ms).sum();
        Ok(ExplanationTrace {
            steps,
            total_ms,
            results,
        })
    }

    // --- candidate collection ---

    fn collect(&self, parsed: &ParsedQuery) -> AHashMap<u64, DocScore> {
        let mut scores: AHashMap<u64, DocScore> = AHashMap::new();
        let mut restrictions: Vec<AHashSet<u64>> = Vec::new();

        for clause in &parsed.clauses {
            match clause {
                Clause::Term(term) => self.score_term(term, 1.0, &mut scores),
                Clause::Wildcard(prefix) => {
                    for term in self.expand_prefix(prefix) {
                        self.score_term(&term, WILDCARD_DAMP, &mut scores);
                    }
                }
                Clause::Fuzzy { term, max_edits } => {
                    for (candidate, distance) in self.expand_fuzzy(term, *max_edits) {
                        let damp = 1.0 - distance as f64 / (*max_edits as f64 + 1.0);
                        self.score_term(&candidate, damp, &mut scores);
                    }
                }
                Clause::Phrase(terms) => self.score_phrase(terms, &mut scores),
                Clause::Field { field, value } => {
                    restrictions.push(self.score_field_clause(*field, value, &mut scores));
                }
            }
        }

        if !restrictions.is_empty() {
            let mut allowed = restrictions.pop().unwrap_or_default();
            for set in restrictions {
                allowed.retain(|id| set.contains(id));
            }
            scores.retain(|id, _| allowed.contains(id));
        }

        scores
    }

    fn score_term(&self, term: &str, damp: f64, scores: &mut AHashMap<u64, DocScore>) {
        for field in SearchField::ALL {
            let Some(list) = self.index.field_postings(field, term) else {
                continue;
            };
            let idf = self.index.idf(list.doc_frequency());
            let weight = self.weights.weight(field);
            for posting in &list.postings {
                let contribution =
                    damp * weight * (posting.term_frequency as f64 * idf + MATCH_BONUS);
                scores
                    .entry(posting.doc_id)
                    .or_default()
                    .add(field, term, contribution);
            }
        }
    }

    fn score_phrase(&self, terms: &[String], scores: &mut AHashMap<u64, DocScore>) {
        if terms.is_empty() {
            return;
        }
        if terms.len() == 1 {
            self.score_term(&terms[0], PHRASE_BONUS, scores);
            return;
        }

        let phrase_label = terms.join(" ");
        for field in SearchField::ALL {
            let lists: Option<Vec<_>> = terms
                .iter()
                .map(|t| self.index.field_postings(field, t))
                .collect();
            let Some(lists) = lists else {
                continue;
            };

            // Documents containing every phrase term in this field.
            let mut candidates: Vec<u64> = lists[0].postings.iter().map(|p| p.doc_id).collect();
            for list in &lists[1..] {
                candidates.retain(|id| list.get(*id).is_some());
            }

            let weight = self.weights.weight(field);
            for doc_id in candidates {
                if !self.phrase_adjacent(&lists, doc_id) {
                    continue;
                }
                let tf_idf_sum: f64 = lists
                    .iter()
                    .map(|list| {
                        let posting = list.get(doc_id).expect("candidate verified above");
                        posting.term_frequency as f64 * self.index.idf(list.doc_frequency())
                    })
                    .sum();
                let contribution = PHRASE_BONUS * weight * (tf_idf_sum + MATCH_BONUS);
                scores
                    .entry(doc_id)
                    .or_default()
                    .add(field, &phrase_label, contribution);
            }
        }
    }

    /// Positions-based adjacency check: each next term must occur directly
    /// after some occurrence of the previous chain.
    fn phrase_adjacent(&self, lists: &[&crate::index::PostingList], doc_id: u64) -> bool {
        let mut chain: Vec<u32> = match lists[0].get(doc_id) {
            Some(posting) => posting.positions.clone(),
            None => return false,
        };
        for list in &lists[1..] {
            let Some(posting) = list.get(doc_id) else {
                return false;
            };
            chain = chain
                .iter()
                .filter_map(|p| {
                    let next = p + 1;
                    posting.positions.contains(&next).then_some(next)
                })
                .collect();
            if chain.is_empty() {
                return false;
            }
        }
        true
    }

    /// Score a `field:value` clause and return the allowed document set.
    fn score_field_clause(
        &self,
        field: SearchField,
        value: &str,
        scores: &mut AHashMap<u64, DocScore>,
    ) -> AHashSet<u64> {
        let weight = self.weights.weight(field);
        let mut allowed = AHashSet::new();
        for repo in self.index.docs_in_order() {
            let text = crate::analysis::tokenizer::normalize(&repo.field_text(field));
            if text.is_empty() {
                continue;
            }
            let exact = text == value;
            if exact || text.contains(value) {
                allowed.insert(repo.id);
                let contribution = weight * if exact { 1.5 } else { 1.0 };
                scores
                    .entry(repo.id)
                    .or_default()
                    .add(field, value, contribution);
            }
        }
        allowed
    }

    fn expand_prefix(&self, prefix: &str) -> Vec<String> {
        self.index
            .all_terms()
            .into_iter()
            .filter(|term| term.starts_with(prefix))
            .take(MAX_EXPANSIONS)
            .collect()
    }

    fn expand_fuzzy(&self, term: &str, max_edits: u32) -> Vec<(String, u32)> {
        let mut matches: Vec<(String, u32)> = Vec::new();
        for candidate in self.index.all_terms() {
            let Some(distance) = bounded_levenshtein(term, &candidate, max_edits) else {
                continue;
            };
            let longest = term.chars().count().max(candidate.chars().count());
            if longest > 0 {
                let similarity = 1.0 - distance as f64 / longest as f64;
                if distance > 0 && similarity < self.fuzzy_threshold {
                    continue;
                }
            }
            matches.push((candidate, distance));
        }
        // Closest first, then alphabetical for determinism.
        matches.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        matches.truncate(MAX_EXPANSIONS);
        matches
    }

    // --- filtering ---

    fn filter(
        &self,
        mut scores: AHashMap<u64, DocScore>,
        filters: &Filters,
    ) -> AHashMap<u64, DocScore> {
        if filters.is_empty() {
            return scores;
        }
        scores.retain(|doc_id, _| {
            self.index
                .doc(*doc_id)
                .is_some_and(|repo| matches_filters(repo, filters))
        });
        scores
    }

    // --- scoring and ranking ---

    /// Normalize raw scores against the best hit and attach metadata.
    fn score(&self, scores: AHashMap<u64, DocScore>) -> Vec<SearchResult> {
        let max_score = scores
            .values()
            .map(|s| s.score)
            .fold(f64::NEG_INFINITY, f64::max);

        scores
            .into_iter()
            .map(|(doc_id, doc_score)| {
                let relative = if max_score > 0.0 {
                    doc_score.score / max_score
                } else {
                    0.0
                };
                SearchResult {
                    doc_id,
                    score: relative,
                    matched_fields: doc_score.matched.clone(),
                    metadata: ResultMetadata {
                        matched_fields: doc_score.matched,
                        relevance_factors: doc_score.factors,
                        search_time_ms: 0.0,
                        confidence: relative.clamp(0.0, 1.0),
                    },
                }
            })
            .collect()
    }

    /// Sort scored results and cut the requested page.
    fn rank(&self, mut ranked: Vec<SearchResult>, request: &SearchRequest) -> Vec<SearchResult> {
        let descending = request.sort_order == SortOrder::Desc;
        ranked.sort_by(|a, b| {
            let ordering = match request.sort_by {
                SortBy::Relevance => a
                    .score
                    .partial_cmp(&b.score)
                    .unwrap_or(std::cmp::Ordering::Equal),
                SortBy::Stars => self.doc_stars(a.doc_id).cmp(&self.doc_stars(b.doc_id)),
                SortBy::Updated => self
                    .doc_timestamp(a.doc_id, DateField::Updated)
                    .cmp(&self.doc_timestamp(b.doc_id, DateField::Updated)),
                SortBy::Created => self
                    .doc_timestamp(a.doc_id, DateField::Created)
                    .cmp(&self.doc_timestamp(b.doc_id, DateField::Created)),
                SortBy::Name => self.doc_name(a.doc_id).cmp(&self.doc_name(b.doc_id)),
            };
            let ordering = if descending { ordering.reverse() } else { ordering };
            ordering.then_with(|| {
                self.index
                    .insertion_rank(a.doc_id)
                    .cmp(&self.index.insertion_rank(b.doc_id))
            })
        });

        let limit = request
            .limit
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit);
        ranked
            .into_iter()
            .skip(request.offset)
            .take(limit)
            .collect()
    }

    fn doc_stars(&self, doc_id: u64) -> u64 {
        self.index.doc(doc_id).map_or(0, |r| r.stars)
    }

    fn doc_timestamp(&self, doc_id: u64, field: DateField) -> i64 {
        self.index
            .doc(doc_id)
            .and_then(|r| match field {
                DateField::Created => r.created_at,
                DateField::Updated => r.updated_at,
            })
            .map_or(i64::MIN, |dt| dt.timestamp_micros())
    }

    fn doc_name(&self, doc_id: u64) -> String {
        self.index
            .doc(doc_id)
            .map_or_else(String::new, |r| r.name.to_lowercase())
    }
}

fn matches_filters(repo: &crate::data::Repo, filters: &Filters) -> bool {
    if let Some(language) = &filters.language {
        let matches = repo
            .language
            .as_deref()
            .is_some_and(|l| l.eq_ignore_ascii_case(language));
        if !matches {
            return false;
        }
    }
    if let Some(min) = filters.min_stars {
        if repo.stars < min {
            return false;
        }
    }
    if let Some(max) = filters.max_stars {
        if repo.stars > max {
            return false;
        }
    }
    if let Some(range) = &filters.date_range {
        let timestamp = match range.field {
            DateField::Created => repo.created_at,
            DateField::Updated => repo.updated_at,
        };
        let Some(timestamp) = timestamp else {
            return false;
        };
        if let Some(start) = range.start {
            if timestamp < start {
                return false;
            }
        }
        if let Some(end) = range.end {
            if timestamp > end {
                return false;
            }
        }
    }
    if filters.show_archived == Some(false) && repo.archived {
        return false;
    }
    if filters.show_forks == Some(false) && repo.fork {
        return false;
    }
    true
}

/// Levenshtein distance bounded by `max`; returns `None` when the distance
/// exceeds the bound, bailing out early on length difference and row minima.
pub fn bounded_levenshtein(a: &str, b: &str, max: u32) -> Option<u32> {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.len().abs_diff(b.len()) > max as usize {
        return None;
    }
    if a.is_empty() {
        return Some(b.len() as u32);
    }
    if b.is_empty() {
        return Some(a.len() as u32);
    }

    let mut previous: Vec<u32> = (0..=b.len() as u32).collect();
    let mut current = vec![0u32; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        current[0] = i as u32 + 1;
        let mut row_min = current[0];
        for (j, cb) in b.iter().enumerate() {
            let substitution = previous[j] + u32::from(ca != cb);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
            row_min = row_min.min(current[j + 1]);
        }
        if row_min > max {
            return None;
        }
        std::mem::swap(&mut previous, &mut current);
    }

    let distance = previous[b.len()];
    (distance <= max).then_some(distance)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_levenshtein() {
        assert_eq!(bounded_levenshtein("react", "react", 2), Some(0));
        assert_eq!(bounded_levenshtein("raect", "react", 2), Some(2));
        assert_eq!(bounded_levenshtein("kitten", "sitting", 3), Some(3));
        assert_eq!(bounded_levenshtein("react", "angular", 2), None);
        assert_eq!(bounded_levenshtein("", "ab", 2), Some(2));
    }

    #[test]
    fn test_levenshtein_bail_on_length_gap() {
        assert_eq!(bounded_levenshtein("a", "abcdefgh", 2), None);
    }
}
