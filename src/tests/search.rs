//! End-to-end tests for the search pipeline against fake collaborators.
//!
//! The embedder and index are trait objects, so these tests drive the real
//! `ArchiveSearch` with in-memory fakes and inspect what reached the index.

use std::sync::{Arc, Mutex};

use serde_json::{json, Map, Value};

use crate::search::{
    ArchiveSearch, Candidate, Embedder, EmbeddingError, IndexError, IndexStats, SearchRequest,
    VectorIndex, DEFAULT_OVERFETCH_FACTOR,
};

const DIMS: usize = 8;

struct FakeEmbedder {
    /// Dimension the embedder claims to produce
    dimensions: usize,
    /// Dimension of the vectors it actually returns
    output_dimensions: usize,
}

impl FakeEmbedder {
    fn new() -> Self {
        Self {
            dimensions: DIMS,
            output_dimensions: DIMS,
        }
    }

    fn broken() -> Self {
        Self {
            dimensions: DIMS,
            output_dimensions: DIMS + 1,
        }
    }
}

impl Embedder for FakeEmbedder {
    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Ok(vec![0.1; self.output_dimensions])
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

#[derive(Debug, Clone)]
struct RecordedQuery {
    top_k: usize,
    include_metadata: bool,
    filter: Option<Value>,
}

struct FakeIndex {
    candidates: Vec<Candidate>,
    stats: IndexStats,
    last_query: Mutex<Option<RecordedQuery>>,
}

impl FakeIndex {
    fn new(candidates: Vec<Candidate>) -> Arc<Self> {
        Arc::new(Self {
            candidates,
            stats: IndexStats::default(),
            last_query: Mutex::new(None),
        })
    }

    fn with_stats(stats: IndexStats) -> Arc<Self> {
        Arc::new(Self {
            candidates: vec![],
            stats,
            last_query: Mutex::new(None),
        })
    }

    fn last_query(&self) -> Option<RecordedQuery> {
        self.last_query.lock().unwrap().clone()
    }
}

impl VectorIndex for FakeIndex {
    fn query(
        &self,
        _vector: &[f32],
        top_k: usize,
        include_metadata: bool,
        filter: Option<&Value>,
    ) -> Result<Vec<Candidate>, IndexError> {
        *self.last_query.lock().unwrap() = Some(RecordedQuery {
            top_k,
            include_metadata,
            filter: filter.cloned(),
        });

        Ok(self.candidates.iter().take(top_k).cloned().collect())
    }

    fn stats(&self) -> Result<IndexStats, IndexError> {
        Ok(self.stats.clone())
    }
}

fn candidate(id: &str, score: f64, section: &str) -> Candidate {
    let mut metadata = Map::new();
    metadata.insert("section".to_string(), json!(section));
    metadata.insert("designer".to_string(), json!("Yohji Yamamoto"));

    Candidate {
        id: id.to_string(),
        score,
        metadata,
    }
}

fn engine(index: Arc<FakeIndex>) -> ArchiveSearch {
    ArchiveSearch::new(Arc::new(FakeEmbedder::new()), index, DEFAULT_OVERFETCH_FACTOR)
}

fn request(query: &str, top_k: usize) -> SearchRequest {
    SearchRequest {
        query: query.to_string(),
        top_k,
        filters: None,
        gender_preference: None,
    }
}

#[test]
fn results_never_exceed_top_k() {
    let candidates = (0..20)
        .map(|i| candidate(&format!("look-{i}"), 1.0 - i as f64 * 0.01, ""))
        .collect();
    let index = FakeIndex::new(candidates);

    let results = engine(index).search(&request("black tulle", 3)).unwrap();
    assert_eq!(results.len(), 3);
}

#[test]
fn short_result_set_is_not_an_error() {
    let index = FakeIndex::new(vec![candidate("look-0", 0.9, "")]);

    let results = engine(index).search(&request("black tulle", 10)).unwrap();
    assert_eq!(results.len(), 1);
}

#[test]
fn rank_order_survives_gender_filtering() {
    let index = FakeIndex::new(vec![
        candidate("look-0", 0.95, "Womenswear"),
        candidate("look-1", 0.90, "Menswear"),
        candidate("look-2", 0.85, ""),
        candidate("look-3", 0.80, "Men's Spring"),
        candidate("look-4", 0.75, "Women's Couture"),
    ]);

    let mut req = request("draped jersey", 10);
    req.gender_preference = Some("womens".to_string());

    let results = engine(index).search(&req).unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();

    // Menswear candidates drop out; survivors keep the index's order.
    assert_eq!(ids, vec!["look-0", "look-2", "look-4"]);
}

#[test]
fn truncation_happens_after_filtering() {
    let index = FakeIndex::new(vec![
        candidate("look-0", 0.95, "Menswear"),
        candidate("look-1", 0.90, "Womenswear"),
        candidate("look-2", 0.85, "Womenswear"),
        candidate("look-3", 0.80, "Womenswear"),
    ]);

    let mut req = request("draped jersey", 2);
    req.gender_preference = Some("womens".to_string());

    let results = engine(index).search(&req).unwrap();
    let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["look-1", "look-2"]);
}

#[test]
fn overfetch_applies_only_with_a_restrictive_preference() {
    for (preference, expected_fetch) in [
        (None, 5),
        (Some("both".to_string()), 5),
        (Some("unisex".to_string()), 5), // unknown value: no preference
        (Some("womens".to_string()), 5 * DEFAULT_OVERFETCH_FACTOR),
        (Some("mens".to_string()), 5 * DEFAULT_OVERFETCH_FACTOR),
    ] {
        let index = FakeIndex::new(vec![]);
        let mut req = request("safety-pin dress", 5);
        req.gender_preference = preference.clone();

        engine(index.clone()).search(&req).unwrap();

        let recorded = index.last_query().unwrap();
        assert_eq!(
            recorded.top_k, expected_fetch,
            "preference {preference:?} should fetch {expected_fetch}"
        );
        assert!(recorded.include_metadata);
    }
}

#[test]
fn overfetch_factor_is_configurable() {
    let index = FakeIndex::new(vec![]);
    let engine = ArchiveSearch::new(Arc::new(FakeEmbedder::new()), index.clone(), 7);

    let mut req = request("safety-pin dress", 4);
    req.gender_preference = Some("mens".to_string());
    engine.search(&req).unwrap();

    assert_eq!(index.last_query().unwrap().top_k, 28);
}

#[test]
fn translated_predicate_reaches_the_index() {
    let index = FakeIndex::new(vec![]);

    let mut req = request("grunge plaid", 5);
    req.filters = Some(
        json!({ "year": 1993, "city": "Paris" })
            .as_object()
            .unwrap()
            .clone(),
    );

    engine(index.clone()).search(&req).unwrap();

    let recorded = index.last_query().unwrap();
    assert_eq!(
        recorded.filter,
        Some(json!({
            "year": { "$eq": 1993 },
            "city": { "$eq": "Paris" },
        }))
    );
}

#[test]
fn no_filters_means_no_predicate() {
    let index = FakeIndex::new(vec![]);
    engine(index.clone()).search(&request("grunge plaid", 5)).unwrap();

    assert_eq!(index.last_query().unwrap().filter, None);
}

#[test]
fn malformed_filter_fails_before_the_index_is_queried() {
    let index = FakeIndex::new(vec![]);

    let mut req = request("grunge plaid", 5);
    req.filters = Some(
        json!({ "year_range": { "min": 1990 } })
            .as_object()
            .unwrap()
            .clone(),
    );

    let err = engine(index.clone()).search(&req).unwrap_err();
    assert!(matches!(err, crate::search::SearchError::Filter(_)));
    assert!(index.last_query().is_none(), "index must not be called");
}

#[test]
fn wrong_embedding_dimension_is_an_embedding_error() {
    let index = FakeIndex::new(vec![]);
    let engine = ArchiveSearch::new(
        Arc::new(FakeEmbedder::broken()),
        index.clone(),
        DEFAULT_OVERFETCH_FACTOR,
    );

    let err = engine.search(&request("bias-cut slip", 5)).unwrap_err();
    assert!(matches!(
        err,
        crate::search::SearchError::Embedding(EmbeddingError::DimensionMismatch {
            expected: DIMS,
            got: 9,
        })
    ));
    assert!(index.last_query().is_none());
}

#[test]
fn metadata_passes_through_unchanged() {
    let mut metadata = Map::new();
    metadata.insert("section".to_string(), json!("Ready-to-Wear"));
    metadata.insert("image_url".to_string(), json!("https://cdn.example/look.jpg"));
    metadata.insert("aesthetic_score".to_string(), json!(7.2));

    let index = FakeIndex::new(vec![Candidate {
        id: "look-42".to_string(),
        score: 0.66,
        metadata: metadata.clone(),
    }]);

    let results = engine(index).search(&request("archive look", 5)).unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].id, "look-42");
    assert!((results[0].score - 0.66).abs() < f64::EPSILON);
    assert_eq!(results[0].metadata, metadata);
}

#[test]
fn candidate_without_section_survives_gender_filtering() {
    let index = FakeIndex::new(vec![Candidate {
        id: "look-7".to_string(),
        score: 0.5,
        metadata: Map::new(),
    }]);

    let mut req = request("archive look", 5);
    req.gender_preference = Some("mens".to_string());

    let results = engine(index).search(&req).unwrap();
    assert_eq!(results.len(), 1);
}

#[test]
fn stats_defaults_substitute_omitted_fields() {
    let index = FakeIndex::with_stats(IndexStats::default());
    let stats = engine(index).stats().unwrap();

    assert_eq!(stats.total_vectors, 0);
    assert_eq!(stats.dimension, 384);
    assert_eq!(stats.index_fullness, 0.0);
}

#[test]
fn stats_pass_through_reported_fields() {
    let index = FakeIndex::with_stats(IndexStats {
        total_vector_count: Some(125_000),
        dimension: Some(512),
        index_fullness: Some(0.37),
    });

    let stats = engine(index).stats().unwrap();
    assert_eq!(stats.total_vectors, 125_000);
    assert_eq!(stats.dimension, 512);
    assert!((stats.index_fullness - 0.37).abs() < f64::EPSILON);
}

#[test]
fn index_failure_surfaces_unchanged() {
    struct FailingIndex;

    impl VectorIndex for FailingIndex {
        fn query(
            &self,
            _vector: &[f32],
            _top_k: usize,
            _include_metadata: bool,
            _filter: Option<&Value>,
        ) -> Result<Vec<Candidate>, IndexError> {
            Err(IndexError::Service("upstream unavailable".to_string()))
        }

        fn stats(&self) -> Result<IndexStats, IndexError> {
            Err(IndexError::Service("upstream unavailable".to_string()))
        }
    }

    let engine = ArchiveSearch::new(
        Arc::new(FakeEmbedder::new()),
        Arc::new(FailingIndex),
        DEFAULT_OVERFETCH_FACTOR,
    );

    assert!(matches!(
        engine.search(&request("archive look", 5)),
        Err(crate::search::SearchError::Index(_))
    ));
    assert!(matches!(
        engine.stats(),
        Err(crate::search::SearchError::Index(_))
    ));
}
