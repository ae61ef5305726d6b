//! CLI configuration
//!
//! Loaded from a TOML file (default `chunkdoc.toml`), then overridden by
//! environment variables and command-line flags, in that order.
//!
//! ```toml
//! [chunking]
//! average = 1024
//! minimum = 256
//! maximum = 2048
//!
//! [lifecycle]
//! materialize_every = 16
//! key_prefix = "chunkdoc"
//!
//! [storage]
//! data_dir = "./chunkdoc_data"
//! flush_on_commit = true
//! ```

use chunkdoc_core::ChunkingConfig;
use chunkdoc_engine::{EngineConfig, MaterializePolicy, DEFAULT_KEY_PREFIX, DEFAULT_MATERIALIZE_EVERY};
use chunkdoc_storage::StorageConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Complete CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Chunk size bounds
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Update lifecycle
    #[serde(default)]
    pub lifecycle: LifecycleSettings,

    /// Sled store location
    #[serde(default)]
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LifecycleSettings {
    /// Writes between materializations (0 = only on compact)
    #[serde(default = "default_materialize_every")]
    pub materialize_every: u64,

    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            materialize_every: default_materialize_every(),
            key_prefix: default_key_prefix(),
        }
    }
}

fn default_materialize_every() -> u64 {
    DEFAULT_MATERIALIZE_EVERY
}

fn default_key_prefix() -> String {
    DEFAULT_KEY_PREFIX.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Flush sled after every commit
    #[serde(default = "default_flush_on_commit")]
    pub flush_on_commit: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            flush_on_commit: default_flush_on_commit(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./chunkdoc_data")
}

fn default_flush_on_commit() -> bool {
    true
}

impl CliConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: CliConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Self::default();
        }

        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load config, using defaults");
                Self::default()
            }
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking
            .validate()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        let prefix = &self.lifecycle.key_prefix;
        if prefix.is_empty() || prefix.contains('/') {
            return Err(ConfigError::ValidationError(format!(
                "key_prefix {prefix:?} must be non-empty and contain no '/'"
            )));
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = data_dir {
            self.storage.data_dir = dir;
        }
        self
    }

    /// Override config with `CHUNKDOC_*` environment variables
    pub fn with_env_overrides(self) -> Self {
        self.with_vars(|name| std::env::var(name).ok())
    }

    fn with_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(dir) = var("CHUNKDOC_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }

        if let Some(every) = var("CHUNKDOC_MATERIALIZE_EVERY") {
            match every.parse::<u64>() {
                Ok(n) => self.lifecycle.materialize_every = n,
                Err(e) => tracing::warn!(value = %every, error = %e, "Ignoring CHUNKDOC_MATERIALIZE_EVERY"),
            }
        }

        self
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_chunking(self.chunking)
            .with_materialize(MaterializePolicy::every(self.lifecycle.materialize_every))
            .with_key_prefix(self.lifecycle.key_prefix.clone())
    }

    pub fn storage_config(&self) -> StorageConfig {
        StorageConfig::new(&self.storage.data_dir).with_flush_on_commit(self.storage.flush_on_commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.chunking.average, 1024);
        assert_eq!(config.lifecycle.materialize_every, 16);
        assert_eq!(config.lifecycle.key_prefix, "chunkdoc");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file() {
        let config: CliConfig = toml::from_str(
            r#"
            [chunking]
            average = 4096
            maximum = 16384

            [storage]
            data_dir = "/tmp/docs"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.average, 4096);
        assert_eq!(config.chunking.minimum, 256);
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/docs"));
        assert!(config.storage.flush_on_commit);
        assert_eq!(config.engine_config().chunking.maximum, 16384);
    }

    #[test]
    fn test_from_file_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chunkdoc.toml");
        std::fs::write(&path, "[chunking]\naverage = 64\n").unwrap();

        let err = CliConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));

        // falls back instead of failing
        let config = CliConfig::load_or_default(&path);
        assert_eq!(config.chunking.average, 1024);
    }

    #[test]
    fn test_env_and_flag_overrides() {
        let vars: HashMap<&str, &str> = [
            ("CHUNKDOC_DATA_DIR", "/env/dir"),
            ("CHUNKDOC_MATERIALIZE_EVERY", "0"),
        ]
        .into_iter()
        .collect();

        let config = CliConfig::default().with_vars(|k| vars.get(k).map(|v| v.to_string()));
        assert_eq!(config.storage.data_dir, PathBuf::from("/env/dir"));
        assert_eq!(config.engine_config().materialize, MaterializePolicy::never());

        let config = config.with_overrides(Some(PathBuf::from("/flag/dir")));
        assert_eq!(config.storage.data_dir, PathBuf::from("/flag/dir"));
    }

    #[test]
    fn test_bad_env_value_ignored() {
        let config = CliConfig::default().with_vars(|k| {
            (k == "CHUNKDOC_MATERIALIZE_EVERY").then(|| "often".to_string())
        });
        assert_eq!(config.lifecycle.materialize_every, 16);
    }
}
