use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use time::UtcOffset;
use url::Url;

use super::date_format::parse_format;
use super::og::{OgConfig, validate_og_config};
use super::search::{SearchConfig, StatsConfig, validate_search_config};
use super::tags::TagConfig;
use super::timezone::parse_timezone;

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub title: String,
    pub description: String,
    pub base_url: String,
    pub base_path: String,
    pub timezone: String,
    pub date_format: String,
    pub include_drafts: bool,
    pub collections: Vec<String>,
    pub search: SearchConfig,
    pub stats: StatsConfig,
    pub og: OgConfig,
    pub tags: TagConfig,
    pub markdown: MarkdownConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MarkdownConfig {
    pub tweet_cta: String,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            tweet_cta: "Xで見る".to_string(),
        }
    }
}

impl Config {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config =
            serde_yaml::from_str(&raw).with_context(|| invalid_yaml_message(path))?;
        config.validate(path)?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)
            .with_context(|| format!("failed to write config file {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self, origin: &Path) -> Result<()> {
        if self.title.trim().is_empty() {
            bail!("{}: title must not be empty", origin.display());
        }
        validate_url(&self.base_url, origin)?;
        validate_base_path(&self.base_path, origin)?;
        validate_format(&self.date_format, origin)?;
        validate_timezone(&self.timezone, origin)?;
        validate_collections(&self.collections, origin)?;
        validate_search_config(&self.search, &self.stats, &self.collections, origin)?;
        validate_og_config(&self.og, origin)?;
        Ok(())
    }

    pub fn offset(&self) -> Result<UtcOffset> {
        parse_timezone(&self.timezone)
    }

    /// The base path with exactly one leading and one trailing slash.
    pub fn normalized_base_path(&self) -> String {
        let trimmed = self.base_path.trim().trim_matches('/');
        if trimmed.is_empty() {
            "/".to_string()
        } else {
            format!("/{trimmed}/")
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "Blog".to_string(),
            description: "Notes and projects".to_string(),
            base_url: "https://example.com".to_string(),
            base_path: "/".to_string(),
            timezone: "+09:00".to_string(),
            date_format: "[year]/[month]/[day]".to_string(),
            include_drafts: false,
            collections: vec!["blog".to_string(), "projects".to_string()],
            search: SearchConfig::default(),
            stats: StatsConfig::default(),
            og: OgConfig::default(),
            tags: TagConfig::default(),
            markdown: MarkdownConfig::default(),
        }
    }
}

fn invalid_yaml_message(path: &Path) -> String {
    format!("{}: invalid YAML", path.display())
}

fn validate_url(value: &str, origin: &Path) -> Result<()> {
    if value.trim().is_empty() {
        bail!("{}: base_url must not be empty", origin.display());
    }
    let url = Url::parse(value)
        .with_context(|| format!("{}: base_url must be an absolute URL", origin.display()))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("{}: base_url must use http or https", origin.display());
    }
    Ok(())
}

fn validate_base_path(value: &str, origin: &Path) -> Result<()> {
    let trimmed = value.trim();
    if !trimmed.starts_with('/') {
        bail!("{}: base_path must start with '/'", origin.display());
    }
    if trimmed.contains(['?', '#']) || trimmed.split('/').any(|part| part == "..") {
        bail!(
            "{}: base_path '{}' must be a plain path",
            origin.display(),
            value
        );
    }
    Ok(())
}

fn validate_format(value: &str, origin: &Path) -> Result<()> {
    parse_format(value).with_context(|| {
        format!(
            "{}: date_format '{}' is invalid (see https://docs.rs/time/latest/time/format_description)",
            origin.display(), value
        )
    })?;
    Ok(())
}

fn validate_timezone(value: &str, origin: &Path) -> Result<()> {
    parse_timezone(value).with_context(|| {
        format!(
            "{}: timezone '{}' is invalid (expected offset like +09:00)",
            origin.display(),
            value
        )
    })?;
    Ok(())
}

fn validate_collections(collections: &[String], origin: &Path) -> Result<()> {
    if collections.is_empty() {
        bail!(
            "{}: collections must name at least one directory",
            origin.display()
        );
    }
    let mut seen = std::collections::BTreeSet::new();
    for name in collections {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '-' | '_'));
        if !valid {
            bail!(
                "{}: collection '{}' may only contain lowercase letters, digits, '-' or '_'",
                origin.display(),
                name
            );
        }
        if !seen.insert(name.as_str()) {
            bail!(
                "{}: duplicate collection '{}'",
                origin.display(),
                name
            );
        }
    }
    Ok(())
}
