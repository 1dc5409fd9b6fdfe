use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, ScienceError};

/// Settings for the metadata services, read from `science.toml` next to the
/// application config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScienceConfig {
    /// Sent to Crossref so requests land in the polite pool.
    pub polite_pool_email: Option<String>,
    pub crossref_base_url: String,
    pub arxiv_base_url: String,
    pub openlibrary_base_url: String,
    pub cache: CacheConfig,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    pub crossref_interval_ms: u64,
    pub arxiv_interval_ms: u64,
    pub openlibrary_interval_ms: u64,
}

impl Default for ScienceConfig {
    fn default() -> Self {
        Self {
            polite_pool_email: None,
            crossref_base_url: crate::sources::crossref::DEFAULT_BASE_URL.to_string(),
            arxiv_base_url: crate::arxiv::client::DEFAULT_BASE_URL.to_string(),
            openlibrary_base_url: crate::sources::openlibrary::DEFAULT_BASE_URL.to_string(),
            cache: CacheConfig::default(),
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_secs: 7 * 24 * 60 * 60,
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            crossref_interval_ms: 100,
            arxiv_interval_ms: 3000,
            openlibrary_interval_ms: 350,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl ScienceConfig {
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("refscope")
            .join("science.toml")
    }

    /// Loads `~/.config/refscope/science.toml`, falling back to defaults
    /// when the file does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| ScienceError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&content)
            .map_err(|e| ScienceError::Config(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = ScienceConfig::load_from(&dir.path().join("science.toml")).unwrap();
        assert_eq!(config.crossref_base_url, "https://api.crossref.org");
        assert!(config.cache.enabled);
        assert_eq!(config.rate_limit.arxiv_interval_ms, 3000);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("science.toml");
        std::fs::write(
            &path,
            r#"
polite_pool_email = "me@example.org"

[cache]
enabled = false
"#,
        )
        .unwrap();

        let config = ScienceConfig::load_from(&path).unwrap();
        assert_eq!(config.polite_pool_email.as_deref(), Some("me@example.org"));
        assert!(!config.cache.enabled);
        assert_eq!(config.cache.ttl_secs, 7 * 24 * 60 * 60);
        assert_eq!(config.openlibrary_base_url, "https://openlibrary.org");
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("science.toml");
        std::fs::write(&path, "cache = 3").unwrap();
        assert!(matches!(
            ScienceConfig::load_from(&path),
            Err(ScienceError::Config(_))
        ));
    }
}
