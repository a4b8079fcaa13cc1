//! store::traits
//!
//! Durable key/value store trait definition.
//!
//! # Design
//!
//! The `KeyValueStore` trait is a small string-keyed interface scoped to a
//! single namespace. The sequence registry uses these keys:
//!
//! - `seq_id` - next id the registry will mint
//! - `seq_0` - value of the default generator
//! - `seq_<id>` - value of generator `<id>`
//!
//! Values are decimal encodings of integers; the store itself does not
//! interpret them.
//!
//! # Example
//!
//! ```
//! use seqgen::store::{KeyValueStore, MemoryStore, StoreError};
//!
//! fn bump(store: &dyn KeyValueStore) -> Result<(), StoreError> {
//!     store.put("seq_7", "8")?;
//!     assert_eq!(store.get("seq_7")?.as_deref(), Some("8"));
//!     Ok(())
//! }
//!
//! bump(&MemoryStore::new()).unwrap();
//! ```

use thiserror::Error;

/// Errors from durable store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// Failed to read from the store.
    #[error("failed to read from store: {0}")]
    ReadError(String),

    /// Failed to write to the store.
    #[error("failed to write to store: {0}")]
    WriteError(String),

    /// Failed to acquire or release the store lock.
    #[error("store lock error: {0}")]
    LockError(String),

    /// Provider not available or not configured.
    #[error("store provider not available: {0}")]
    ProviderNotAvailable(String),
}

/// Trait for durable key/value storage.
///
/// Implementations must be thread-safe (Send + Sync). A `put` must be
/// visible to every later `get` on the same store, including `get`s from
/// a fresh store instance opened over the same backing location.
pub trait KeyValueStore: Send + Sync {
    /// Get a value by key.
    ///
    /// Returns `Ok(Some(value))` if the key exists.
    /// Returns `Ok(None)` if the key does not exist.
    /// Returns `Err` if there was an error accessing the store.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Put a value.
    ///
    /// Overwrites any existing value for the key.
    fn put(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value.
    ///
    /// Returns `Ok(())` even if the key did not exist.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Check if a key exists.
    ///
    /// Default implementation uses `get()` and checks for `Some`.
    fn exists(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}
