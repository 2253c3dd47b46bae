use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::dedup::FuzzyThreshold;
use crate::error::Result;

/// Root configuration, loaded from `~/.config/shelvd/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DedupConfig {
    pub detection: DetectionConfig,
    pub catalog: CatalogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub fuzzy_threshold: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Records requested per page when loading the full collection.
    pub page_size: usize,
    /// Ids sent per call to the removal collaborator.
    pub delete_batch_size: usize,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            fuzzy_threshold: FuzzyThreshold::DEFAULT,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: 1000,
            delete_batch_size: 100,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl DedupConfig {
    /// Standard config file path: `~/.config/shelvd/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("SHELVD_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("shelvd")
            .join("config.toml")
    }

    /// Load config from disk, falling back to defaults if the file doesn't exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// The configured threshold, rejected rather than clamped when out of range.
    pub fn fuzzy_threshold(&self) -> Result<FuzzyThreshold> {
        FuzzyThreshold::new(self.detection.fuzzy_threshold)
    }
}
