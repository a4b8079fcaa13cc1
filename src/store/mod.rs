//! store
//!
//! Durable key/value storage backing the sequence registry.
//!
//! # Architecture
//!
//! Values are stored through the `KeyValueStore` trait, which has
//! multiple implementations:
//!
//! - [`FileStore`]: TOML file per namespace under the data directory (default)
//! - [`MemoryStore`]: in-process map, for tests and embedding
//!
//! # Provider Selection
//!
//! Use [`create_store`] to create a store based on configuration:
//!
//! ```no_run
//! use seqgen::store::create_store;
//! use std::path::Path;
//!
//! let store = create_store("file", Path::new("/var/lib/seqgen"), "sequence").unwrap();
//! store.put("seq_id", "1").unwrap();
//! ```

mod file_store;
mod lock;
mod memory_store;
mod traits;

pub use file_store::FileStore;
pub use lock::{StoreLock, DEFAULT_LOCK_TIMEOUT};
pub use memory_store::{FailOn, MemoryStore};
pub use traits::{KeyValueStore, StoreError};

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// The default store provider name.
pub const DEFAULT_PROVIDER: &str = "file";

/// Valid store provider names.
pub const VALID_PROVIDERS: &[&str] = &["file", "memory"];

/// Create a store based on the provider name.
///
/// # Providers
///
/// - `"file"` (default): [`FileStore`] at `<dir>/<namespace>.toml`
/// - `"memory"`: [`MemoryStore`]; `dir` and `namespace` are ignored
///
/// # Errors
///
/// Returns [`StoreError::ProviderNotAvailable`] for an unknown provider.
pub fn create_store(
    provider: &str,
    dir: &Path,
    namespace: &str,
) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    match provider {
        "file" => Ok(Arc::new(FileStore::new(dir.to_path_buf(), namespace))),
        "memory" => Ok(Arc::new(MemoryStore::new())),
        other => Err(unknown_provider(other)),
    }
}

/// Take the session lock of a namespace.
///
/// Holding it for a registry's whole lifetime keeps other processes from
/// opening the same namespace until the registry has flushed, so two
/// processes never hand out the same value or mint the same id. Providers
/// without state shared between processes need no lock and return `None`.
///
/// # Errors
///
/// - [`StoreError::LockError`] if the lock is not acquired within `timeout`
/// - [`StoreError::ProviderNotAvailable`] for an unknown provider
pub fn lock_namespace(
    provider: &str,
    dir: &Path,
    namespace: &str,
    timeout: Duration,
) -> Result<Option<StoreLock>, StoreError> {
    match provider {
        "file" => {
            let path = dir.join(format!("{}.session.lock", namespace));
            StoreLock::acquire(&path, timeout).map(Some)
        }
        "memory" => Ok(None),
        other => Err(unknown_provider(other)),
    }
}

fn unknown_provider(provider: &str) -> StoreError {
    StoreError::ProviderNotAvailable(format!(
        "unknown store provider: '{}' (valid: {})",
        provider,
        VALID_PROVIDERS.join(", ")
    ))
}
