//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Validation
//!
//! Values are validated after parsing: providers and policies must be known
//! names, the namespace must be a safe file stem, and the cache capacity
//! must be positive.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::store::VALID_PROVIDERS;

/// Root configuration file.
///
/// # Example
///
/// ```toml
/// [store]
/// provider = "file"
/// namespace = "orders"
/// path = "/var/lib/seqgen"
///
/// [cache]
/// policy = "lru"
/// capacity = 256
///
/// [ids]
/// overflow = "fail"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Durable store settings
    pub store: Option<StoreConfig>,

    /// Generator cache settings
    pub cache: Option<CacheConfig>,

    /// Id allocation settings
    pub ids: Option<IdsConfig>,
}

impl FileConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(store) = &self.store {
            store.validate()?;
        }
        if let Some(cache) = &self.cache {
            cache.validate()?;
        }
        if let Some(ids) = &self.ids {
            ids.validate()?;
        }
        Ok(())
    }
}

/// Store configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Provider to use ("file" or "memory")
    pub provider: Option<String>,

    /// Namespace; becomes the data file stem
    pub namespace: Option<String>,

    /// Data directory override
    pub path: Option<String>,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(provider) = &self.provider {
            check_one_of("store provider", provider, VALID_PROVIDERS)?;
        }

        if let Some(namespace) = &self.namespace {
            let valid = !namespace.is_empty()
                && namespace
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
            if !valid {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid store namespace '{}', use letters, digits, '-' or '_'",
                    namespace
                )));
            }
        }

        if let Some(path) = &self.path {
            if path.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "store path cannot be empty".to_string(),
                ));
            }
        }

        Ok(())
    }
}

/// Generator cache configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Eviction policy ("lru" or "unreferenced")
    pub policy: Option<String>,

    /// Maximum cached generators for the "lru" policy
    pub capacity: Option<usize>,
}

impl CacheConfig {
    /// Valid cache policies.
    pub const VALID_POLICIES: &'static [&'static str] = &["lru", "unreferenced"];

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(policy) = &self.policy {
            check_one_of("cache policy", policy, Self::VALID_POLICIES)?;
        }
        if self.capacity == Some(0) {
            return Err(ConfigError::InvalidValue(
                "cache capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Id allocation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct IdsConfig {
    /// Behaviour at the end of the id space ("wrap" or "fail")
    pub overflow: Option<String>,
}

impl IdsConfig {
    /// Valid overflow policies.
    pub const VALID_OVERFLOW: &'static [&'static str] = &["wrap", "fail"];

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(overflow) = &self.overflow {
            check_one_of("overflow policy", overflow, Self::VALID_OVERFLOW)?;
        }
        Ok(())
    }
}

fn check_one_of(what: &str, value: &str, valid: &[&str]) -> Result<(), ConfigError> {
    if valid.contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(format!(
            "invalid {} '{}', must be one of: {}",
            what,
            value,
            valid.join(", ")
        )))
    }
}
