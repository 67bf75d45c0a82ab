use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TagConfig {
    pub default_glyph: String,
    pub emoji: BTreeMap<String, String>,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            default_glyph: "🏷️".to_string(),
            emoji: BTreeMap::new(),
        }
    }
}
