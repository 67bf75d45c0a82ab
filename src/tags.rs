use std::collections::BTreeMap;

use crate::config::TagConfig;

/// Maps a tag to the glyph shown next to it in listings.
pub trait TagGlyphs: Send + Sync {
    fn glyph(&self, tag: &str) -> &str;

    fn decorate(&self, tag: &str) -> String {
        format!("{} #{}", self.glyph(tag), tag)
    }
}

/// Glyph table read from `tags.emoji` in the site config.
#[derive(Debug, Clone)]
pub struct ConfiguredGlyphs {
    glyphs: BTreeMap<String, String>,
    default_glyph: String,
}

impl ConfiguredGlyphs {
    pub fn new(config: &TagConfig) -> Self {
        let glyphs = config
            .emoji
            .iter()
            .map(|(tag, glyph)| (tag.trim().to_lowercase(), glyph.clone()))
            .collect();
        Self {
            glyphs,
            default_glyph: config.default_glyph.clone(),
        }
    }
}

impl TagGlyphs for ConfiguredGlyphs {
    fn glyph(&self, tag: &str) -> &str {
        self.glyphs
            .get(&tag.trim().to_lowercase())
            .map(String::as_str)
            .unwrap_or(&self.default_glyph)
    }
}
