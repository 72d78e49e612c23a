use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::bail;
use clap::Parser;
use serde_json::{json, Map};

mod cli;
mod config;
mod search;
#[cfg(test)]
mod tests;
mod web;

use config::Config;
use search::{ArchiveSearch, RemoteIndex, SearchRequest, TextEmbedder};

fn build_engine(config: &Config, base_path: &Path) -> anyhow::Result<ArchiveSearch> {
    if config.index.endpoint.is_empty() {
        bail!(
            "index.endpoint is not configured (edit {})",
            base_path.join("config.yaml").display()
        );
    }

    let api_key = config.index.resolve_api_key();
    if api_key.is_empty() {
        bail!(
            "no index API key; set {} or index.api_key in config.yaml",
            config::API_KEY_ENV
        );
    }

    let timeout = Duration::from_secs(config.search.download_timeout_secs);
    let embedder = TextEmbedder::new(&config.search.model, base_path.to_path_buf(), Some(timeout))?;
    let index = RemoteIndex::new(&config.index.endpoint, &api_key);

    Ok(ArchiveSearch::new(
        Arc::new(embedder),
        Arc::new(index),
        config.search.gender_overfetch_factor,
    ))
}

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    let base_path = match &args.base_path {
        Some(path) => PathBuf::from(path),
        None => Config::default_base_path()?,
    };
    let config = Config::load_with(&base_path);

    match args.command {
        cli::Command::Daemon {} => {
            let engine = build_engine(&config, &base_path)?;
            web::start_daemon(engine);
            Ok(())
        }

        cli::Command::Search {
            query,
            top_k,
            year,
            year_from,
            year_to,
            designer,
            category,
            season,
            city,
            min_aesthetic,
            gender,
        } => {
            let mut filters = Map::new();

            if let Some(year) = year {
                filters.insert("year".to_string(), json!(year));
            }

            match (year_from, year_to) {
                (Some(min), Some(max)) => {
                    filters.insert("year_range".to_string(), json!({ "min": min, "max": max }));
                }
                (None, None) => {}
                _ => bail!("--year-from and --year-to must be used together"),
            }

            if let Some(designer) = designer {
                filters.insert("designer".to_string(), json!(designer));
            }
            if let Some(category) = category {
                filters.insert("category".to_string(), json!(category));
            }
            if let Some(season) = season {
                filters.insert("season".to_string(), json!(season));
            }
            if let Some(city) = city {
                filters.insert("city".to_string(), json!(city));
            }
            if let Some(min_aesthetic) = min_aesthetic {
                filters.insert("min_aesthetic".to_string(), json!(min_aesthetic));
            }

            let request = SearchRequest {
                query,
                top_k: top_k.unwrap_or(config.search.default_top_k),
                filters: (!filters.is_empty()).then_some(filters),
                gender_preference: gender,
            };

            let engine = build_engine(&config, &base_path)?;
            let results = engine.search(&request)?;
            println!("{}", serde_json::to_string_pretty(&results)?);
            Ok(())
        }

        cli::Command::Stats {} => {
            let engine = build_engine(&config, &base_path)?;
            let stats = engine.stats()?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
    }
}
