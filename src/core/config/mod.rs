//! core::config
//!
//! Configuration schema and loading.
//!
//! # Locations
//!
//! Searched in order, first existing file wins:
//! 1. `$SEQGEN_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/seqgen/config.toml`
//! 3. `~/.seqgen/config.toml` (canonical write location)
//!
//! A missing file is not an error; defaults are used.
//!
//! # Example
//!
//! ```no_run
//! use seqgen::core::config::Config;
//!
//! let config = Config::load().unwrap();
//! println!("provider: {}", config.store_provider());
//! println!("namespace: {}", config.store_namespace());
//! let options = config.registry_options();
//! ```

pub mod schema;

pub use schema::{CacheConfig, FileConfig, IdsConfig, StoreConfig};

use std::fs;
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::paths::SeqgenPaths;
use crate::sequence::{CachePolicy, OverflowPolicy, RegistryOptions, DEFAULT_CACHE_CAPACITY};

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Default store namespace.
pub const DEFAULT_NAMESPACE: &str = "sequence";

/// Loaded configuration with defaulting accessors.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Parsed file contents
    pub file: FileConfig,
    /// Path the file was loaded from, if any
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load configuration from the default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::find_config_file() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, parsed or validated.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file: FileConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        file.validate()?;

        Ok(Self {
            file,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    /// First existing config file in search order.
    fn find_config_file() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("SEQGEN_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("seqgen/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        SeqgenPaths::from_home()
            .map(|paths| paths.config_path())
            .filter(|path| path.exists())
    }

    /// Get the canonical path for the config file.
    ///
    /// Returns `~/.seqgen/config.toml`.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(home_paths()?.config_path())
    }

    /// Write a config file atomically.
    ///
    /// Creates parent directories if needed. Uses atomic write
    /// (write to temp file, then rename) to prevent corruption.
    pub fn write(path: &Path, file: &FileConfig) -> Result<(), ConfigError> {
        file.validate()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let contents =
            toml::to_string_pretty(file).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

        let temp_path = path.with_extension("toml.tmp");
        let mut out = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        out.write_all(contents.as_bytes())
            .map_err(|e| ConfigError::WriteError {
                path: temp_path.clone(),
                source: e,
            })?;

        out.sync_all().map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

        fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;

        Ok(())
    }

    // =========================================================================
    // Accessor methods with defaults
    // =========================================================================

    /// Get the store provider.
    ///
    /// Defaults to "file" if not configured.
    pub fn store_provider(&self) -> &str {
        self.file
            .store
            .as_ref()
            .and_then(|s| s.provider.as_deref())
            .unwrap_or(crate::store::DEFAULT_PROVIDER)
    }

    /// Get the store namespace.
    ///
    /// Defaults to "sequence" if not configured.
    pub fn store_namespace(&self) -> &str {
        self.file
            .store
            .as_ref()
            .and_then(|s| s.namespace.as_deref())
            .unwrap_or(DEFAULT_NAMESPACE)
    }

    /// Get the store data directory.
    ///
    /// Defaults to `~/.seqgen/store` if not configured.
    pub fn store_dir(&self) -> Result<PathBuf, ConfigError> {
        match self.file.store.as_ref().and_then(|s| s.path.as_deref()) {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(home_paths()?.store_dir()),
        }
    }

    /// Get the cache policy.
    ///
    /// Defaults to LRU with 1024 entries.
    pub fn cache_policy(&self) -> CachePolicy {
        let cache = self.file.cache.as_ref();
        match cache.and_then(|c| c.policy.as_deref()) {
            Some("unreferenced") => CachePolicy::Unreferenced,
            _ => CachePolicy::Lru {
                capacity: cache
                    .and_then(|c| c.capacity)
                    .and_then(NonZeroUsize::new)
                    .unwrap_or(DEFAULT_CACHE_CAPACITY),
            },
        }
    }

    /// Get the id-allocation overflow policy.
    ///
    /// Defaults to wrap.
    pub fn overflow_policy(&self) -> OverflowPolicy {
        match self.file.ids.as_ref().and_then(|i| i.overflow.as_deref()) {
            Some("fail") => OverflowPolicy::Fail,
            _ => OverflowPolicy::Wrap,
        }
    }

    /// Registry options derived from this configuration.
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            cache: self.cache_policy(),
            overflow: self.overflow_policy(),
        }
    }

    /// Get the path the configuration was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}

fn home_paths() -> Result<SeqgenPaths, ConfigError> {
    SeqgenPaths::from_home().ok_or(ConfigError::NoHomeDir)
}
