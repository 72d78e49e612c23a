//! Semantic search over the fashion archive.
//!
//! # Architecture
//!
//! - `query`: request types and gender-aware query enrichment
//! - `filter`: structured filters → index predicate translation
//! - `gender`: section-label classifier backing the gender post-filter
//! - `embedding`: embedding model boundary (fastembed / CLIP)
//! - `index`: vector index service boundary and HTTP client
//! - `engine`: the pipeline tying the stages together

pub mod embedding;
mod engine;
mod filter;
mod gender;
mod index;
mod query;

pub use embedding::{Embedder, EmbeddingError, TextEmbedder};
pub use engine::{ArchiveSearch, ArchiveStats, SearchError, SearchResult};
pub use filter::{translate_filters, FilterError};
pub use gender::section_matches;
pub use index::{Candidate, IndexError, IndexStats, RemoteIndex, VectorIndex};
pub use query::{enrich_query, GenderPreference, SearchRequest, DEFAULT_TOP_K};

/// Default embedding model (CLIP text encoder; shares the image space the
/// archive was indexed in)
pub const DEFAULT_MODEL: &str = "clip-vit-b-32";

/// Default fetch multiplier compensating for gender post-filter losses
pub const DEFAULT_OVERFETCH_FACTOR: usize = 3;
