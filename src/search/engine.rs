//! The search pipeline: enrich, embed, translate filters, query, post-filter.
//!
//! Per request the flow is strictly linear. The embedder and index handles
//! are injected once at construction and shared read-only across requests;
//! both external calls are synchronous and are not retried here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::search::embedding::{Embedder, EmbeddingError};
use crate::search::filter::{translate_filters, FilterError};
use crate::search::gender::section_matches;
use crate::search::index::{IndexError, VectorIndex};
use crate::search::query::{enrich_query, GenderPreference, SearchRequest};

/// Dimension reported when the index service omits it.
const FALLBACK_DIMENSION: usize = 384;

/// Errors that can fail a search request.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    #[error("filter error: {0}")]
    Filter(#[from] FilterError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

/// One search hit, in the public output shape. Metadata is the candidate's
/// metadata passed through unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub score: f64,
    pub metadata: Map<String, Value>,
}

/// Index statistics with service-omitted fields defaulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveStats {
    pub total_vectors: u64,
    pub dimension: usize,
    pub index_fullness: f64,
}

/// Semantic search over the fashion archive.
pub struct ArchiveSearch {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    overfetch_factor: usize,
}

impl ArchiveSearch {
    /// Create a search engine from its two collaborators.
    ///
    /// `overfetch_factor` scales the index fetch when a gender preference
    /// will discard candidates post-hoc (factor 1 disables over-fetching).
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        overfetch_factor: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            overfetch_factor: overfetch_factor.max(1),
        }
    }

    /// Run one search request and return up to `top_k` results, best first.
    ///
    /// The result set may be shorter than `top_k` when the gender
    /// post-filter discards more candidates than the over-fetch covered;
    /// that is a valid outcome, not an error.
    pub fn search(&self, request: &SearchRequest) -> Result<Vec<SearchResult>, SearchError> {
        let preference = GenderPreference::parse(request.gender_preference.as_deref());
        let gender_filter = preference.filter(|p| p.is_restrictive());

        let enriched = enrich_query(&request.query, preference);

        let embedding = self.embedder.embed(&enriched)?;
        if embedding.len() != self.embedder.dimensions() {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.embedder.dimensions(),
                got: embedding.len(),
            }
            .into());
        }

        let predicate = translate_filters(request.filters.as_ref())?;

        // Gender lives in a free-text label the index cannot filter on, so
        // over-fetch and discard after the fact. The factor is a heuristic:
        // a heavily gendered neighborhood can still come up short.
        let fetch_k = if gender_filter.is_some() {
            request.top_k * self.overfetch_factor
        } else {
            request.top_k
        };

        log::debug!(
            "search query={:?} top_k={} fetch_k={fetch_k} predicate={predicate:?}",
            request.query,
            request.top_k,
        );

        let candidates = self.index.query(&embedding, fetch_k, true, predicate.as_ref())?;

        let mut results = Vec::with_capacity(request.top_k);
        for candidate in candidates {
            if let Some(preference) = gender_filter {
                let section = candidate
                    .metadata
                    .get("section")
                    .and_then(Value::as_str)
                    .unwrap_or_default();

                if !section_matches(section, preference) {
                    continue;
                }
            }

            results.push(SearchResult {
                id: candidate.id,
                score: candidate.score,
                metadata: candidate.metadata,
            });

            // Candidates past the cutoff are never evaluated.
            if results.len() >= request.top_k {
                break;
            }
        }

        Ok(results)
    }

    /// Index statistics, with defaults substituted for omitted fields.
    pub fn stats(&self) -> Result<ArchiveStats, SearchError> {
        let raw = self.index.stats()?;

        Ok(ArchiveStats {
            total_vectors: raw.total_vector_count.unwrap_or(0),
            dimension: raw.dimension.unwrap_or(FALLBACK_DIMENSION),
            index_fullness: raw.index_fullness.unwrap_or(0.0),
        })
    }
}
