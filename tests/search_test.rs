use chrono::{TimeZone, Utc};

use quarry::{
    DateField, DateRange, Engine, EngineConfig, Filters, QuarryError, Repo, SearchRequest, SortBy,
    SortOrder,
};

fn ts(year: i32, month: u32, day: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

fn corpus() -> Vec<Repo> {
    vec![
        Repo::new(1, "react")
            .owner("facebook")
            .language("JavaScript")
            .description("A declarative JavaScript library for building user interfaces")
            .topics(vec!["ui".to_string(), "frontend".to_string()])
            .stars(220_000)
            .created_at(ts(2013, 5, 24))
            .updated_at(ts(2024, 6, 1)),
        Repo::new(2, "vue")
            .owner("vuejs")
            .language("TypeScript")
            .description("Progressive JavaScript framework for building user interfaces")
            .topics(vec!["frontend".to_string()])
            .stars(210_000)
            .created_at(ts(2013, 7, 29))
            .updated_at(ts(2024, 5, 12)),
        Repo::new(3, "angular")
            .owner("angular")
            .language("TypeScript")
            .description("Web framework for building mobile and desktop applications")
            .stars(95_000)
            .created_at(ts(2014, 9, 18))
            .updated_at(ts(2024, 4, 3)),
        Repo::new(4, "rails")
            .owner("rails")
            .language("Ruby")
            .description("Ruby on Rails is a web application framework")
            .stars(55_000)
            .created_at(ts(2008, 4, 11))
            .updated_at(ts(2024, 1, 20)),
        Repo::new(5, "django")
            .owner("django")
            .language("Python")
            .description("The web framework for perfectionists with deadlines")
            .stars(78_000)
            .created_at(ts(2012, 4, 28))
            .updated_at(ts(2024, 3, 8)),
        Repo::new(6, "react-legacy")
            .owner("someone")
            .language("JavaScript")
            .description("Archived fork of react kept for reference")
            .stars(10)
            .created_at(ts(2016, 2, 2))
            .updated_at(ts(2017, 11, 30))
            .archived(true)
            .fork(true),
    ]
}

fn engine() -> Engine {
    let engine = Engine::new(EngineConfig::default());
    engine.initialize(&corpus()).unwrap();
    engine
}

#[test]
fn test_keyword_search_ranks_best_match_first() {
    let engine = engine();
    let results = engine.search(&SearchRequest::keyword("react")).unwrap();
    let ids: Vec<u64> = results.iter().map(|r| r.doc_id).collect();
    assert!(ids.contains(&1));
    assert!(ids.contains(&6));
    assert!(!ids.contains(&2));

    // Relative scores: the best hit is 1.0, everything else in (0, 1].
    assert!((results[0].score - 1.0).abs() < f64::EPSILON);
    for result in &results {
        assert!(result.score > 0.0 && result.score <= 1.0);
        assert!(result.metadata.confidence >= 0.0 && result.metadata.confidence <= 1.0);
        assert!(!result.metadata.relevance_factors.is_empty());
    }
}

#[test]
fn test_no_match_returns_empty() {
    let engine = engine();
    let results = engine.search(&SearchRequest::keyword("kubernetes")).unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_field_clause_restricts_to_matching_owner() {
    let engine = engine();
    let results = engine
        .search(&SearchRequest::keyword("owner:facebook"))
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_id, 1);
}

#[test]
fn test_field_clause_intersects_with_terms() {
    let engine = engine();
    // "react" matches docs 1 and 6; the owner clause keeps only doc 6.
    let results = engine
        .search(&SearchRequest::keyword("react owner:someone"))
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].doc_id, 6);
}

#[test]
fn test_phrase_requires_adjacency() {
    let engine = engine();
    let results = engine
        .search(&SearchRequest::keyword("\"user interfaces\""))
        .unwrap();
    let ids: Vec<u64> = results.iter().map(|r| r.doc_id).collect();
    assert!(ids.contains(&1));
    assert!(ids.contains(&2));
    assert!(!ids.contains(&3));

    // Same words, never adjacent in any document.
    let results = engine
        .search(&SearchRequest::keyword("\"interfaces user\""))
        .unwrap();
    assert!(results.is_empty());
}

#[test]
fn test_wildcard_prefix_expansion() {
    let engine = engine();
    let results = engine.search(&SearchRequest::keyword("rea*")).unwrap();
    let ids: Vec<u64> = results.iter().map(|r| r.doc_id).collect();
    assert!(ids.contains(&1));
    assert!(ids.contains(&6));
}

#[test]
fn test_fuzzy_matches_transposition() {
    let engine = engine();
    let results = engine.search(&SearchRequest::keyword("raect~2")).unwrap();
    let ids: Vec<u64> = results.iter().map(|r| r.doc_id).collect();
    assert!(ids.contains(&1));
}

#[test]
fn test_subset_matches_are_kept() {
    let engine = engine();
    // Doc 3 matches "framework" but not "javascript"; it stays, ranked
    // below documents matching both terms.
    let results = engine
        .search(&SearchRequest::keyword("javascript framework"))
        .unwrap();
    let ids: Vec<u64> = results.iter().map(|r| r.doc_id).collect();
    assert!(ids.contains(&2));
    assert!(ids.contains(&3));
    let vue_rank = ids.iter().position(|id| *id == 2).unwrap();
    let angular_rank = ids.iter().position(|id| *id == 3).unwrap();
    assert!(vue_rank < angular_rank);
}

#[test]
fn test_language_filter_is_case_insensitive() {
    let engine = engine();
    let request = SearchRequest::keyword("framework").filters(Filters {
        language: Some("typescript".to_string()),
        ..Filters::default()
    });
    let ids: Vec<u64> = engine
        .search(&request)
        .unwrap()
        .iter()
        .map(|r| r.doc_id)
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&2));
    assert!(ids.contains(&3));
}

#[test]
fn test_star_range_filter_is_inclusive() {
    let engine = engine();
    let request = SearchRequest::keyword("framework").filters(Filters {
        min_stars: Some(78_000),
        max_stars: Some(95_000),
        ..Filters::default()
    });
    let ids: Vec<u64> = engine
        .search(&request)
        .unwrap()
        .iter()
        .map(|r| r.doc_id)
        .collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&3));
    assert!(ids.contains(&5));
}

#[test]
fn test_date_range_excludes_missing_timestamps() {
    let engine = engine();
    let undated = Repo::new(7, "react-notes").description("notes about react");
    engine.update_index(undated).unwrap();

    let request = SearchRequest::keyword("react").filters(Filters {
        date_range: Some(DateRange {
            field: DateField::Created,
            start: Some(ts(2013, 1, 1)),
            end: Some(ts(2020, 1, 1)),
        }),
        ..Filters::default()
    });
    let ids: Vec<u64> = engine
        .search(&request)
        .unwrap()
        .iter()
        .map(|r| r.doc_id)
        .collect();
    assert!(ids.contains(&1));
    assert!(ids.contains(&6));
    assert!(!ids.contains(&7));
}

#[test]
fn test_archived_and_fork_gates() {
    let engine = engine();
    let request = SearchRequest::keyword("react").filters(Filters {
        show_archived: Some(false),
        ..Filters::default()
    });
    let ids: Vec<u64> = engine
        .search(&request)
        .unwrap()
        .iter()
        .map(|r| r.doc_id)
        .collect();
    assert_eq!(ids, vec![1]);

    let request = SearchRequest::keyword("react").filters(Filters {
        show_forks: Some(false),
        ..Filters::default()
    });
    let ids: Vec<u64> = engine
        .search(&request)
        .unwrap()
        .iter()
        .map(|r| r.doc_id)
        .collect();
    assert_eq!(ids, vec![1]);
}

#[test]
fn test_sort_by_stars_descending_is_monotonic() {
    let engine = engine();
    let request = SearchRequest::keyword("framework").sort(SortBy::Stars, SortOrder::Desc);
    let results = engine.search(&request).unwrap();
    assert_eq!(results.len(), 4);
    let stars: Vec<u64> = results
        .iter()
        .map(|r| {
            corpus()
                .into_iter()
                .find(|repo| repo.id == r.doc_id)
                .unwrap()
                .stars
        })
        .collect();
    assert!(stars.windows(2).all(|pair| pair[0] >= pair[1]));
    assert_eq!(results[0].doc_id, 2);
}

#[test]
fn test_sort_by_name_ascending() {
    let engine = engine();
    let request = SearchRequest::keyword("framework").sort(SortBy::Name, SortOrder::Asc);
    let ids: Vec<u64> = engine
        .search(&request)
        .unwrap()
        .iter()
        .map(|r| r.doc_id)
        .collect();
    // angular, django, rails, vue
    assert_eq!(ids, vec![3, 5, 4, 2]);
}

#[test]
fn test_sort_by_updated_descending() {
    let engine = engine();
    let request = SearchRequest::keyword("framework").sort(SortBy::Updated, SortOrder::Desc);
    let ids: Vec<u64> = engine
        .search(&request)
        .unwrap()
        .iter()
        .map(|r| r.doc_id)
        .collect();
    assert_eq!(ids, vec![2, 3, 5, 4]);
}

#[test]
fn test_pagination_pages_are_disjoint_and_ordered() {
    let engine = engine();
    let base = SearchRequest::keyword("framework").sort(SortBy::Stars, SortOrder::Desc);

    let all = engine.search(&base.clone().limit(10)).unwrap();
    let page1 = engine.search(&base.clone().limit(2)).unwrap();
    let page2 = engine.search(&base.clone().limit(2).offset(2)).unwrap();

    assert_eq!(page1.len(), 2);
    assert_eq!(page2.len(), 2);
    let ids1: Vec<u64> = page1.iter().map(|r| r.doc_id).collect();
    let ids2: Vec<u64> = page2.iter().map(|r| r.doc_id).collect();
    assert!(ids1.iter().all(|id| !ids2.contains(id)));

    let combined: Vec<u64> = ids1.into_iter().chain(ids2).collect();
    let full: Vec<u64> = all.iter().map(|r| r.doc_id).collect();
    assert_eq!(combined, full);

    let beyond = engine.search(&base.clone().offset(100)).unwrap();
    assert!(beyond.is_empty());
}

#[test]
fn test_empty_and_overlong_queries_are_rejected() {
    let engine = engine();
    assert!(matches!(
        engine.search(&SearchRequest::keyword("   ")),
        Err(QuarryError::InvalidQuery(_))
    ));
    assert!(matches!(
        engine.search(&SearchRequest::keyword("a".repeat(1001))),
        Err(QuarryError::InvalidQuery(_))
    ));
    // Exactly at the limit is fine.
    assert!(engine.search(&SearchRequest::keyword("a".repeat(1000))).is_ok());
}

#[test]
fn test_request_deserializes_from_json_with_defaults() {
    let request: SearchRequest = serde_json::from_str(
        r#"{
            "text": "framework",
            "kind": "keyword",
            "filters": { "language": "TypeScript" },
            "sort_by": "stars",
            "sort_order": "asc"
        }"#,
    )
    .unwrap();
    assert_eq!(request.limit, None);
    assert_eq!(request.offset, 0);

    let engine = engine();
    let ids: Vec<u64> = engine
        .search(&request)
        .unwrap()
        .iter()
        .map(|r| r.doc_id)
        .collect();
    // angular then vue, ascending by stars.
    assert_eq!(ids, vec![3, 2]);
}

#[test]
fn test_explain_mirrors_search_order() {
    let engine = engine();
    let request = SearchRequest::keyword("javascript framework");
    let trace = engine.explain(&request).unwrap();

    for name in ["query_parsing", "term_lookup", "filtering", "scoring", "ranking"] {
        let step = trace.step(name).unwrap();
        assert!(step.elapsed_ms >= 0.0);
        assert!(!step.description.is_empty());
    }
    assert!(trace.total_ms >= 0.0);

    let searched: Vec<u64> = engine
        .search(&request)
        .unwrap()
        .iter()
        .map(|r| r.doc_id)
        .collect();
    let explained: Vec<u64> = trace.results.iter().map(|r| r.doc_id).collect();
    assert_eq!(explained, searched);
}
