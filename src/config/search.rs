use std::path::Path;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub asset_path: String,
    pub collection: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            asset_path: "search.json".to_string(),
            collection: "blog".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StatsConfig {
    pub asset_path: String,
    pub daily_window: u32,
    pub top_posts: usize,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            asset_path: "stats.json".to_string(),
            daily_window: 30,
            top_posts: 10,
        }
    }
}

pub fn validate_search_config(
    search: &SearchConfig,
    stats: &StatsConfig,
    collections: &[String],
    origin: &Path,
) -> Result<()> {
    validate_asset_path("search.asset_path", &search.asset_path, origin)?;
    validate_asset_path("stats.asset_path", &stats.asset_path, origin)?;

    if search.asset_path.trim_start_matches('/') == stats.asset_path.trim_start_matches('/') {
        bail!(
            "{}: search.asset_path and stats.asset_path must differ",
            origin.display()
        );
    }

    if !collections.iter().any(|name| name == &search.collection) {
        bail!(
            "{}: search.collection '{}' not found in collections",
            origin.display(),
            search.collection
        );
    }

    if stats.daily_window == 0 {
        bail!(
            "{}: stats.daily_window must be greater than zero",
            origin.display()
        );
    }

    Ok(())
}

fn validate_asset_path(key: &str, value: &str, origin: &Path) -> Result<()> {
    let trimmed = value.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        bail!("{}: {} must not be empty", origin.display(), key);
    }
    if trimmed.split('/').any(|part| part == "..") {
        bail!(
            "{}: {} '{}' must stay inside the output directory",
            origin.display(),
            key,
            value
        );
    }
    Ok(())
}
