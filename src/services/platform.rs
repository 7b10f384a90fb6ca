//! Platform canonicalization and display metadata
//!
//! Raw platform labels come from the path segment after the ROM marker.
//! An immutable rename table maps them to the canonical catalogue
//! category; short labels and badge colors feed the renderer.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::types::{Result, ShelfError};

/// Badge color used when a platform has no entry in the color table
pub const DEFAULT_COLOR: &str = "#666";

/// Immutable platform lookup configuration.
///
/// Ships with defaults matching the muOS catalogue; any table can be
/// overridden by loading a JSON file with `renames`, `short_labels`
/// and/or `colors` keys.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlatformMap {
    renames: HashMap<String, String>,
    short_labels: HashMap<String, String>,
    colors: HashMap<String, String>,
}

impl Default for PlatformMap {
    fn default() -> Self {
        let renames = HashMap::from([
            ("Ports".to_string(), "External - Ports".to_string()),
            ("Symbian".to_string(), "Java J2ME".to_string()),
        ]);

        let short_labels = HashMap::from([
            ("Nintendo NES - Famicom".to_string(), "NES".to_string()),
            ("Nintendo SNES - SFC".to_string(), "SNES".to_string()),
            ("Nintendo Game Boy".to_string(), "Game Boy".to_string()),
            ("Nintendo Game Boy Color".to_string(), "GBC".to_string()),
            ("Nintendo Game Boy Advance".to_string(), "GBA".to_string()),
            ("Nintendo DS".to_string(), "NDS".to_string()),
            ("Nintendo N64".to_string(), "N64".to_string()),
            ("Sega Mega Drive - Genesis".to_string(), "Genesis".to_string()),
            ("Sega Pico".to_string(), "Pico-8".to_string()),
            ("Sony PlayStation".to_string(), "PS1".to_string()),
            ("Sony PlayStation Portable".to_string(), "PSP".to_string()),
            ("External - Ports".to_string(), "Ports".to_string()),
            ("Java J2ME".to_string(), "J2ME".to_string()),
        ]);

        let colors = HashMap::from([
            ("Nintendo NES - Famicom".to_string(), "#c4272e".to_string()),
            ("Nintendo SNES - SFC".to_string(), "#7b5ea7".to_string()),
            ("Nintendo Game Boy".to_string(), "#2f6b3a".to_string()),
            ("Nintendo Game Boy Color".to_string(), "#5b3a8c".to_string()),
            ("Nintendo Game Boy Advance".to_string(), "#354fa0".to_string()),
            ("Nintendo DS".to_string(), "#999999".to_string()),
            ("Nintendo N64".to_string(), "#009e42".to_string()),
            ("Sega Mega Drive - Genesis".to_string(), "#1a6eb5".to_string()),
            ("Sega Pico".to_string(), "#1a6eb5".to_string()),
            ("Sony PlayStation".to_string(), "#003087".to_string()),
            ("Sony PlayStation Portable".to_string(), "#003087".to_string()),
            ("External - Ports".to_string(), "#e07020".to_string()),
            ("Java J2ME".to_string(), "#5382a1".to_string()),
        ]);

        Self {
            renames,
            short_labels,
            colors,
        }
    }
}

impl PlatformMap {
    /// Load overrides from a JSON file. Unspecified tables keep defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            ShelfError::Config(format!("invalid platform map {}: {}", path.display(), e))
        })
    }

    /// Canonical category for a raw platform label (identity when unmapped)
    pub fn canonical<'a>(&'a self, raw: &'a str) -> &'a str {
        self.renames.get(raw).map(String::as_str).unwrap_or(raw)
    }

    /// Short display label for a canonical platform (identity when unmapped)
    pub fn short_label<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.short_labels
            .get(canonical)
            .map(String::as_str)
            .unwrap_or(canonical)
    }

    /// Badge color for a canonical platform
    pub fn color(&self, canonical: &str) -> &str {
        self.colors
            .get(canonical)
            .map(String::as_str)
            .unwrap_or(DEFAULT_COLOR)
    }
}
