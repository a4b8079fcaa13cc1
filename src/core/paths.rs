//! core::paths
//!
//! Centralized path routing for seqgen storage locations.
//!
//! # Storage Layout
//!
//! Everything lives under one root, `~/.seqgen/` by default:
//! - `config.toml` - Configuration
//! - `store/<namespace>.toml` - Durable sequence values
//! - `store/<namespace>.lock` - Writer lock for that namespace
//!
//! # Example
//!
//! ```
//! use seqgen::core::paths::SeqgenPaths;
//! use std::path::PathBuf;
//!
//! let paths = SeqgenPaths::new(PathBuf::from("/home/me/.seqgen"));
//! assert_eq!(paths.config_path(), PathBuf::from("/home/me/.seqgen/config.toml"));
//! assert_eq!(paths.store_dir(), PathBuf::from("/home/me/.seqgen/store"));
//! ```

use std::path::{Path, PathBuf};

/// Root directory name under the user's home.
const ROOT_DIR_NAME: &str = ".seqgen";

/// Path routing for seqgen storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeqgenPaths {
    root: PathBuf,
}

impl SeqgenPaths {
    /// Create paths rooted at `root`.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Paths rooted at `~/.seqgen`, or `None` without a home directory.
    pub fn from_home() -> Option<Self> {
        dirs::home_dir().map(|home| Self::new(home.join(ROOT_DIR_NAME)))
    }

    /// The root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Canonical config file.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Default data directory for the file store.
    pub fn store_dir(&self) -> PathBuf {
        self.root.join("store")
    }
}
