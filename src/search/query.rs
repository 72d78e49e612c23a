//! Search request types and gender-aware query enrichment.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Default number of results returned by a search.
pub const DEFAULT_TOP_K: usize = 10;

/// Gender preference for a search request.
///
/// `Both` is equivalent to no preference at all: neither query enrichment
/// nor post-filtering is applied for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenderPreference {
    Womens,
    Mens,
    Both,
}

impl GenderPreference {
    /// Parse a user-supplied preference string.
    ///
    /// Unknown values map to `None` and are treated as "no preference"
    /// rather than failing the request.
    pub fn parse(value: Option<&str>) -> Option<GenderPreference> {
        match value {
            Some("womens") => Some(GenderPreference::Womens),
            Some("mens") => Some(GenderPreference::Mens),
            Some("both") => Some(GenderPreference::Both),
            _ => None,
        }
    }

    /// Whether this preference actually narrows the result set.
    pub fn is_restrictive(self) -> bool {
        !matches!(self, GenderPreference::Both)
    }
}

/// A single archive search request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchRequest {
    /// Free-text query
    pub query: String,

    /// Maximum number of results to return
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Structured metadata filters (year, designer, category, ...).
    /// Unrecognized keys are ignored.
    #[serde(default)]
    pub filters: Option<Map<String, Value>>,

    /// "womens", "mens" or "both". Anything else means no preference.
    #[serde(default)]
    pub gender_preference: Option<String>,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

/// Append a gender hint to the query text.
///
/// The CLIP text encoder associates "womenswear"/"menswear" with gendered
/// fashion imagery, so the suffix pulls the query embedding toward the
/// preferred side of the archive before any filtering happens.
pub fn enrich_query(query: &str, preference: Option<GenderPreference>) -> String {
    match preference {
        Some(GenderPreference::Womens) => format!("{query} womenswear"),
        Some(GenderPreference::Mens) => format!("{query} menswear"),
        _ => query.to_string(),
    }
}
