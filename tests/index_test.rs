use std::sync::Arc;

use quarry::{Analyzer, InvertedIndex, Repo, SearchField};

fn index() -> InvertedIndex {
    let mut index = InvertedIndex::new(Arc::new(Analyzer::new()), 1000);
    index.build(&[
        Repo::new(1, "react")
            .owner("facebook")
            .language("JavaScript")
            .description("A declarative JavaScript library for building user interfaces"),
        Repo::new(2, "vue")
            .owner("vuejs")
            .language("TypeScript")
            .description("Progressive JavaScript framework"),
        Repo::new(3, "rails")
            .owner("rails")
            .language("Ruby")
            .description("Ruby on Rails web application framework"),
    ]);
    index
}

#[test]
fn test_removal_leaves_no_orphaned_postings() {
    let mut index = index();
    assert!(index.remove(2));
    assert!(!index.contains(2));

    for term in index.all_terms() {
        let list = index.global_postings(&term).unwrap();
        assert!(
            list.get(2).is_none(),
            "term {term:?} still references the removed document"
        );
        assert!(!list.is_empty(), "term {term:?} kept an empty posting list");
    }
    for field in SearchField::ALL {
        for term in index.field_terms(field) {
            let list = index.field_postings(field, &term).unwrap();
            assert!(list.get(2).is_none());
        }
    }

    assert!(!index.remove(2));
}

#[test]
fn test_tf_idf_is_zero_for_absent_pairs() {
    let index = index();
    assert_eq!(index.tf_idf("nonexistent", 1), 0.0);
    // "ruby" occurs only in doc 3.
    assert_eq!(index.tf_idf("ruby", 1), 0.0);
    assert!(index.tf_idf("ruby", 3) > 0.0);
}

#[test]
fn test_global_frequency_is_sum_of_field_frequencies() {
    let index = index();
    // "javascript" appears in doc 1's description and language fields.
    let global = index.global_postings("javascript").unwrap();
    let posting = global.get(1).unwrap();

    let field_sum: u32 = SearchField::ALL
        .iter()
        .filter_map(|field| index.field_postings(*field, "javascript"))
        .filter_map(|list| list.get(1))
        .map(|p| p.term_frequency)
        .sum();
    assert!(posting.term_frequency >= 2);
    assert_eq!(posting.term_frequency, field_sum);
}

#[test]
fn test_serialize_roundtrip_preserves_stats_and_postings() {
    let index = index();
    let blob = index.serialize();

    let mut restored = InvertedIndex::new(Arc::new(Analyzer::new()), 1000);
    restored.deserialize(&blob).unwrap();

    assert_eq!(restored.stats(), index.stats());
    assert_eq!(restored.all_terms(), index.all_terms());
    for term in index.all_terms() {
        let original = index.global_postings(&term).unwrap();
        let roundtripped = restored.global_postings(&term).unwrap();
        assert_eq!(roundtripped.doc_frequency(), original.doc_frequency());
    }
    // Insertion order survives, so ranking tie-breaks stay stable.
    let original_ids: Vec<u64> = index.docs_in_order().map(|r| r.id).collect();
    let restored_ids: Vec<u64> = restored.docs_in_order().map(|r| r.id).collect();
    assert_eq!(restored_ids, original_ids);
}

#[test]
fn test_deserialize_rejects_garbage_without_clobbering() {
    let mut index = index();
    let docs_before = index.total_documents();
    assert!(index.deserialize(b"garbage").is_err());
    assert_eq!(index.total_documents(), docs_before);
}

#[test]
fn test_stemmed_variants_share_postings() {
    let mut index = InvertedIndex::new(Arc::new(Analyzer::new()), 1000);
    index.build(&[
        Repo::new(1, "runner").description("running every benchmark"),
        Repo::new(2, "bench").description("runs the benchmarks"),
    ]);

    // "running" and "runs" stem to the same term.
    let analyzer = index.analyzer().clone();
    let stemmed = analyzer.analyze_term("running");
    assert_eq!(stemmed, analyzer.analyze_term("runs"));
    let list = index.global_postings(&stemmed).unwrap();
    assert_eq!(list.doc_frequency(), 2);
}
