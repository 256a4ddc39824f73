//! Pipeline configuration.
//!
//! Configuration can be built in code, loaded from TOML, YAML or JSON files,
//! or discovered by walking up from the working directory looking for
//! `docsift.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::DEFAULT_SWEEP_THRESHOLD;
use crate::core::mime::DEFAULT_MAX_PAYLOAD_BYTES;
use crate::error::{DocsiftError, Result};

pub const CONFIG_FILE_NAME: &str = "docsift.toml";
pub const DEFAULT_MAX_CONCURRENCY: usize = 5;
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 3600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Upper bound on recognition calls in flight during a batch.
    pub max_concurrency: usize,
    pub max_payload_bytes: usize,
    pub cache: CacheConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
            cache: CacheConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
    /// Entry count at which a write also sweeps expired entries.
    pub sweep_threshold: usize,
    /// Store entries on disk here instead of in memory.
    pub directory: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: DEFAULT_CACHE_TTL_SECONDS,
            sweep_threshold: DEFAULT_SWEEP_THRESHOLD,
            directory: None,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl PipelineConfig {
    /// Check values that deserialize fine but make no sense.
    ///
    /// # Errors
    ///
    /// Returns `DocsiftError::Validation` describing the first bad value.
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(DocsiftError::validation("max_concurrency must be at least 1"));
        }
        if self.max_payload_bytes == 0 {
            return Err(DocsiftError::validation("max_payload_bytes must be greater than 0"));
        }
        if self.cache.sweep_threshold == 0 {
            return Err(DocsiftError::validation("cache.sweep_threshold must be at least 1"));
        }
        Ok(())
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `DocsiftError::Validation` if the file can't be read, isn't
    /// valid TOML, or fails [`validate`](Self::validate).
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| DocsiftError::validation(format!("Invalid TOML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_yaml_ng::from_str(&content)
            .map_err(|e| DocsiftError::validation(format!("Invalid YAML in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = read_config(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| DocsiftError::validation(format!("Invalid JSON in {}: {}", path.as_ref().display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration, picking the format from the file extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("toml") => Self::from_toml_file(path),
            Some("yaml") | Some("yml") => Self::from_yaml_file(path),
            Some("json") => Self::from_json_file(path),
            _ => Err(DocsiftError::validation(format!(
                "Unsupported config file format: {}. Supported formats: .toml, .yaml, .yml, .json",
                path.display()
            ))),
        }
    }

    /// Discover `docsift.toml` in the current directory or any parent.
    ///
    /// # Returns
    ///
    /// - `Some(config)` if found
    /// - `None` if no config file found
    pub fn discover() -> Result<Option<Self>> {
        let current = std::env::current_dir().map_err(DocsiftError::Io)?;
        Self::discover_from(current)
    }

    /// Like [`discover`](Self::discover), starting from `start`.
    pub fn discover_from(start: impl AsRef<Path>) -> Result<Option<Self>> {
        let mut current = Some(start.as_ref());

        while let Some(dir) = current {
            let candidate = dir.join(CONFIG_FILE_NAME);
            if candidate.is_file() {
                tracing::debug!(path = %candidate.display(), "Discovered pipeline config");
                return Ok(Some(Self::from_toml_file(candidate)?));
            }
            current = dir.parent();
        }

        Ok(None)
    }
}

fn read_config(path: &Path) -> Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| DocsiftError::validation(format!("Failed to read config file {}: {}", path.display(), e)))
}
