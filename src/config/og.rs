use std::path::Path;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct OgConfig {
    /// Font files, relative to the project root.
    pub regular_font: String,
    pub bold_font: String,
    pub font_family: String,
    pub category_label: String,
    pub output_dir: String,
}

impl Default for OgConfig {
    fn default() -> Self {
        Self {
            regular_font: "assets/fonts/regular.otf".to_string(),
            bold_font: "assets/fonts/bold.otf".to_string(),
            font_family: "OgSans".to_string(),
            category_label: "Article".to_string(),
            output_dir: "og-image".to_string(),
        }
    }
}

pub fn validate_og_config(config: &OgConfig, origin: &Path) -> Result<()> {
    for (key, value) in [
        ("og.regular_font", &config.regular_font),
        ("og.bold_font", &config.bold_font),
        ("og.font_family", &config.font_family),
        ("og.output_dir", &config.output_dir),
    ] {
        if value.trim().is_empty() {
            bail!("{}: {} must not be empty", origin.display(), key);
        }
    }

    if config
        .output_dir
        .trim_matches('/')
        .split('/')
        .any(|part| part == ".." || part.is_empty())
    {
        bail!(
            "{}: og.output_dir '{}' must be a relative directory name",
            origin.display(),
            config.output_dir
        );
    }

    Ok(())
}
