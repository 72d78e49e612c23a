//! Embedding model boundary and its fastembed-backed implementation.
//!
//! The search pipeline only depends on the [`Embedder`] trait, so tests
//! substitute an in-memory fake. The production implementation wraps
//! fastembed's `TextEmbedding` with the CLIP text encoder, whose embeddings
//! live in the same space the archive images were indexed in. Input
//! truncation (CLIP caps at 77 tokens) happens inside the model.

use fastembed::{InitOptions, TextEmbedding};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

/// Default download timeout for model files (5 minutes)
const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Error type for embedding operations
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("Model initialization failed: {0}")]
    InitFailed(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),

    #[error("Invalid model name: {0}")]
    InvalidModel(String),

    #[error("Embedding has dimension {got}, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

/// A text embedding model.
///
/// Implementations must be safe to share across concurrent requests.
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// The fixed dimension every embedding must have.
    fn dimensions(&self) -> usize;
}

/// Wrapper around fastembed's TextEmbedding model.
/// Uses a Mutex because fastembed's embed() requires &mut self.
pub struct TextEmbedder {
    model: Mutex<TextEmbedding>,
    model_name: String,
    dimensions: usize,
}

impl TextEmbedder {
    /// Create a new embedding model with the given name.
    ///
    /// The model is downloaded on first use if not cached. Models are
    /// cached in the `models/` subdirectory of `cache_dir`.
    ///
    /// # Arguments
    /// * `model_name` - Name of the model (e.g., "clip-vit-b-32")
    /// * `cache_dir` - Directory to cache downloaded models
    /// * `download_timeout` - Optional timeout for model download
    pub fn new(
        model_name: &str,
        cache_dir: PathBuf,
        download_timeout: Option<Duration>,
    ) -> Result<Self, EmbeddingError> {
        let model_enum = Self::parse_model_name(model_name)?;
        let _timeout = download_timeout.unwrap_or(DEFAULT_DOWNLOAD_TIMEOUT);

        let models_dir = cache_dir.join("models");
        std::fs::create_dir_all(&models_dir).map_err(|e| {
            EmbeddingError::InitFailed(format!("Failed to create models directory: {}", e))
        })?;

        let options = InitOptions::new(model_enum)
            .with_cache_dir(models_dir)
            .with_show_download_progress(true);

        let mut model = TextEmbedding::try_new(options)
            .map_err(|e| EmbeddingError::InitFailed(e.to_string()))?;

        let dimensions = Self::probe_dimensions(&mut model)?;

        log::info!("embedding model '{model_name}' ready ({dimensions} dims)");

        Ok(Self {
            model: Mutex::new(model),
            model_name: model_name.to_string(),
            dimensions,
        })
    }

    /// Get the model name
    pub fn name(&self) -> &str {
        &self.model_name
    }

    /// Parse model name string to fastembed enum.
    fn parse_model_name(name: &str) -> Result<fastembed::EmbeddingModel, EmbeddingError> {
        match name.to_lowercase().as_str() {
            "clip-vit-b-32" | "clipvitb32" => Ok(fastembed::EmbeddingModel::ClipVitB32),
            "all-minilm-l6-v2" | "allminiml6v2" => Ok(fastembed::EmbeddingModel::AllMiniLML6V2),
            "bge-small-en-v1.5" | "bgesmallenv15" => {
                Ok(fastembed::EmbeddingModel::BGESmallENV15)
            }
            _ => Err(EmbeddingError::InvalidModel(format!(
                "Unknown model: {}. Supported models: clip-vit-b-32, all-MiniLM-L6-v2, bge-small-en-v1.5",
                name
            ))),
        }
    }

    /// Probe the model to determine embedding dimensions.
    fn probe_dimensions(model: &mut TextEmbedding) -> Result<usize, EmbeddingError> {
        let test_embeddings = model.embed(vec!["test"], None).map_err(|e| {
            EmbeddingError::InitFailed(format!("Failed to probe dimensions: {}", e))
        })?;

        test_embeddings
            .first()
            .map(|v| v.len())
            .ok_or_else(|| EmbeddingError::InitFailed("Model returned no embedding".to_string()))
    }
}

impl Embedder for TextEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut model = self.model.lock().map_err(|e| {
            EmbeddingError::EmbeddingFailed(format!("Failed to acquire model lock: {}", e))
        })?;

        let embeddings = model
            .embed(vec![text], None)
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))?;

        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| EmbeddingError::EmbeddingFailed("No embedding returned".to_string()))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
