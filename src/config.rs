use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::search::{DEFAULT_MODEL, DEFAULT_OVERFETCH_FACTOR, DEFAULT_TOP_K};

/// Environment variable overriding `index.api_key` from the config file.
pub const API_KEY_ENV: &str = "VOGUE_ARCHIVE_API_KEY";

/// Default model download timeout in seconds
const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300;

/// Connection settings for the vector index service
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Base URL of the index service (e.g. "https://archive-index.example.io")
    #[serde(default)]
    pub endpoint: String,

    /// API key. Prefer the VOGUE_ARCHIVE_API_KEY environment variable over
    /// storing the key in the file.
    #[serde(default)]
    pub api_key: String,
}

impl IndexConfig {
    /// Resolve the API key, preferring the environment over the file.
    pub fn resolve_api_key(&self) -> String {
        std::env::var(API_KEY_ENV).unwrap_or_else(|_| self.api_key.clone())
    }
}

/// Search pipeline settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Embedding model name (e.g. "clip-vit-b-32")
    #[serde(default = "default_model")]
    pub model: String,

    /// Results returned when a request does not specify top_k
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,

    /// Fetch multiplier applied when a gender preference will discard
    /// candidates after the index query
    #[serde(default = "default_overfetch_factor")]
    pub gender_overfetch_factor: usize,

    /// Timeout for model download in seconds
    #[serde(default = "default_download_timeout_secs")]
    pub download_timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            default_top_k: DEFAULT_TOP_K,
            gender_overfetch_factor: DEFAULT_OVERFETCH_FACTOR,
            download_timeout_secs: DEFAULT_DOWNLOAD_TIMEOUT_SECS,
        }
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

fn default_overfetch_factor() -> usize {
    DEFAULT_OVERFETCH_FACTOR
}

fn default_download_timeout_secs() -> u64 {
    DEFAULT_DOWNLOAD_TIMEOUT_SECS
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

impl Config {
    fn validate(&self) {
        if self.search.model.is_empty() {
            panic!("search.model must not be empty");
        }

        if self.search.default_top_k == 0 {
            panic!("search.default_top_k must be greater than 0");
        }

        if self.search.gender_overfetch_factor == 0 {
            panic!("search.gender_overfetch_factor must be greater than 0");
        }

        if self.search.download_timeout_secs == 0 {
            panic!("search.download_timeout_secs must be greater than 0");
        }
    }

    /// Base directory holding config.yaml and the model cache.
    pub fn default_base_path() -> anyhow::Result<PathBuf> {
        match homedir::my_home() {
            Ok(Some(home)) => Ok(home.join(".vogue-archive")),
            _ => anyhow::bail!("cannot resolve home directory; pass --base-path"),
        }
    }

    pub fn load_with(base_path: &Path) -> Self {
        std::fs::create_dir_all(base_path).expect("cannot create base directory");
        let config_path = base_path.join("config.yaml");

        // create new if does not exist
        if !config_path.exists() {
            std::fs::write(
                &config_path,
                serde_yml::to_string(&Self::default()).unwrap().as_bytes(),
            )
            .expect("cannot write default config");
        }

        let config_str =
            std::fs::read_to_string(&config_path).expect("config file is not valid utf8");
        let config: Self = serde_yml::from_str(&config_str).expect("config is malformed");

        config.validate();

        config
    }
}
