//! Vector index service client.
//!
//! The nearest-neighbor store is an external service; this module defines
//! the [`VectorIndex`] boundary the pipeline depends on, plus `RemoteIndex`,
//! a blocking HTTP client for the Pinecone-compatible REST protocol
//! (`POST /query`, `POST /describe_index_stats`).

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Errors from the index service boundary. Never retried here.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("reqwest error: {0:?}")]
    Reqwest(#[from] reqwest::Error),

    #[error("index service error: {0}")]
    Service(String),
}

/// One raw match returned by the index, in descending-similarity order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

/// Raw statistics reported by the index service.
///
/// Fields the service omits stay `None`; defaults are substituted by the
/// stats accessor, not here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexStats {
    #[serde(default)]
    pub total_vector_count: Option<u64>,
    #[serde(default)]
    pub dimension: Option<usize>,
    #[serde(default)]
    pub index_fullness: Option<f64>,
}

/// A nearest-neighbor store over the archive embeddings.
///
/// Implementations must be safe to share across concurrent requests.
pub trait VectorIndex: Send + Sync {
    /// Return up to `top_k` nearest neighbors to `vector`, best first,
    /// optionally restricted by an index-side predicate.
    fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
        filter: Option<&Value>,
    ) -> Result<Vec<Candidate>, IndexError>;

    /// Raw index statistics.
    fn stats(&self) -> Result<IndexStats, IndexError>;
}

/// HTTP client for a remote vector index.
pub struct RemoteIndex {
    endpoint: String,
    api_key: String,
}

impl RemoteIndex {
    pub fn new(endpoint: &str, api_key: &str) -> RemoteIndex {
        let endpoint = endpoint.strip_suffix('/').unwrap_or(endpoint).to_string();

        RemoteIndex {
            endpoint,
            api_key: api_key.to_string(),
        }
    }

    fn post(&self, path: &str) -> reqwest::blocking::RequestBuilder {
        log::debug!("{}{}", self.endpoint, path);
        let url = format!("{}{}", self.endpoint, path);

        reqwest::blocking::Client::new()
            .post(&url)
            .header("Api-Key", &self.api_key)
    }
}

#[derive(Deserialize, Debug)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<Candidate>,
}

fn handle_response<T>(response: reqwest::blocking::Response) -> Result<T, IndexError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let text = response.text()?;

    if !status.is_success() {
        return Err(IndexError::Service(format!("{status}: {text}")));
    }

    serde_json::from_str::<T>(&text).map_err(|err| {
        log::error!("{err}. tried to parse: {text:?}");
        IndexError::Service(format!("malformed response: {err}"))
    })
}

impl VectorIndex for RemoteIndex {
    fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        include_metadata: bool,
        filter: Option<&Value>,
    ) -> Result<Vec<Candidate>, IndexError> {
        let mut body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": include_metadata,
        });
        if let Some(filter) = filter {
            body["filter"] = filter.clone();
        }

        let resp = self.post("/query").json(&body).send()?;
        let resp: QueryResponse = handle_response(resp)?;

        Ok(resp.matches)
    }

    fn stats(&self) -> Result<IndexStats, IndexError> {
        let resp = self.post("/describe_index_stats").json(&json!({})).send()?;

        handle_response(resp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_parses_full_match() {
        let candidate: Candidate = serde_json::from_str(
            r#"{
                "id": "look-1993-comme-042",
                "score": 0.83,
                "metadata": {
                    "designer": "Comme des Garçons",
                    "section": "Women's Ready-to-Wear",
                    "year": 1993
                }
            }"#,
        )
        .unwrap();

        assert_eq!(candidate.id, "look-1993-comme-042");
        assert!((candidate.score - 0.83).abs() < f64::EPSILON);
        assert_eq!(candidate.metadata["year"], json!(1993));
    }

    #[test]
    fn candidate_defaults_missing_score_and_metadata() {
        let candidate: Candidate = serde_json::from_str(r#"{"id": "look-x"}"#).unwrap();
        assert_eq!(candidate.score, 0.0);
        assert!(candidate.metadata.is_empty());
    }

    #[test]
    fn query_response_defaults_to_empty_matches() {
        let resp: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.matches.is_empty());

        let resp: QueryResponse =
            serde_json::from_str(r#"{"matches": [{"id": "a", "score": 0.5}]}"#).unwrap();
        assert_eq!(resp.matches.len(), 1);
    }

    #[test]
    fn stats_parse_with_omitted_fields() {
        let stats: IndexStats =
            serde_json::from_str(r#"{"total_vector_count": 1200}"#).unwrap();
        assert_eq!(stats.total_vector_count, Some(1200));
        assert_eq!(stats.dimension, None);
        assert_eq!(stats.index_fullness, None);
    }

    #[test]
    fn remote_index_strips_trailing_slash() {
        let index = RemoteIndex::new("https://archive-index.example.io/", "key");
        assert_eq!(index.endpoint, "https://archive-index.example.io");

        let index = RemoteIndex::new("https://archive-index.example.io", "key");
        assert_eq!(index.endpoint, "https://archive-index.example.io");
    }
}
