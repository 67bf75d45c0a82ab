use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use usvg::fontdb::Database;

/// Regular (400) and bold (700) faces used for every preview image.
///
/// Loaded once before the build starts and shared read-only afterwards.
#[derive(Clone)]
pub struct FontAssets {
    regular_family: String,
    bold_family: String,
    database: Arc<Database>,
}

impl FontAssets {
    /// Reads both font files, failing before any build work if either is
    /// missing or holds no usable face.
    pub fn load(regular: &Path, bold: &Path, fallback_family: &str) -> Result<Self> {
        for path in [regular, bold] {
            if !path.is_file() {
                bail!(
                    "OG font not found: {} (configure og.regular_font / og.bold_font)",
                    path.display()
                );
            }
        }

        let regular_data = fs::read(regular)
            .with_context(|| format!("failed to read font {}", regular.display()))?;
        let bold_data =
            fs::read(bold).with_context(|| format!("failed to read font {}", bold.display()))?;

        for (path, data) in [(regular, &regular_data), (bold, &bold_data)] {
            if family_of(data).is_none() {
                bail!("{}: file contains no usable font face", path.display());
            }
        }

        Ok(Self::from_bytes(regular_data, bold_data, fallback_family))
    }

    /// Builds the assets from raw font data. Faces that cannot be parsed are
    /// skipped and `fallback_family` is used as their family name.
    pub fn from_bytes(regular: Vec<u8>, bold: Vec<u8>, fallback_family: &str) -> Self {
        let regular_family = family_of(&regular).unwrap_or_else(|| fallback_family.to_string());
        let bold_family = family_of(&bold).unwrap_or_else(|| fallback_family.to_string());

        let mut database = Database::new();
        database.load_font_data(regular);
        database.load_font_data(bold);

        Self {
            regular_family,
            bold_family,
            database: Arc::new(database),
        }
    }

    pub fn regular_family(&self) -> &str {
        &self.regular_family
    }

    /// Family to request for `weight`; 600 and above map to the bold file.
    pub fn family_for(&self, weight: u16) -> &str {
        if weight >= 600 {
            &self.bold_family
        } else {
            &self.regular_family
        }
    }

    pub fn database(&self) -> Arc<Database> {
        Arc::clone(&self.database)
    }
}

impl fmt::Debug for FontAssets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FontAssets")
            .field("regular_family", &self.regular_family)
            .field("bold_family", &self.bold_family)
            .field("faces", &self.database.len())
            .finish()
    }
}

fn family_of(data: &[u8]) -> Option<String> {
    let mut scratch = Database::new();
    scratch.load_font_data(data.to_vec());
    scratch
        .faces()
        .next()
        .and_then(|face| face.families.first())
        .map(|(name, _)| name.clone())
}
