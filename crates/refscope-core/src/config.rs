use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::DatabaseMode;

/// Root application configuration, loaded from `~/.config/refscope/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub core: CoreConfig,
    pub import: ImportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// JSON file holding the default library.
    pub library_path: String,
    /// Mode used when a new library file is created.
    pub default_mode: DatabaseMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportConfig {
    /// Offer manual entry creation when an import by ID fails.
    pub offer_manual_entry: bool,
    /// Hide the identifier popover once an entry was imported.
    pub hide_popover_on_success: bool,
}

// ─── Defaults ──────────────────────────────────────────────

impl Default for CoreConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("refscope");

        Self {
            library_path: data_dir.join("library.json").to_string_lossy().to_string(),
            default_mode: DatabaseMode::BibTeX,
        }
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            offer_manual_entry: true,
            hide_popover_on_success: true,
        }
    }
}

// ─── Load / Save ───────────────────────────────────────────

impl AppConfig {
    /// Standard config directory: `~/.config/refscope`
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("refscope")
    }

    /// Standard config file path: `~/.config/refscope/config.toml`
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("REFSCOPE_CONFIG") {
            return PathBuf::from(path);
        }

        Self::config_dir().join("config.toml")
    }

    /// Load config from disk, falling back to defaults if file doesn't exist.
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        Self::load_from(&path)
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

    pub fn library_path(&self) -> PathBuf {
        PathBuf::from(&self.core.library_path)
    }
}
