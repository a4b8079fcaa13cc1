//! store::memory_store
//!
//! In-process store for tests and embedders that do not need durability.
//!
//! Clones share the same map, so a "fresh" registry opened over a clone
//! sees everything an earlier registry wrote. Failures can be injected
//! per key with [`FailOn`].
//!
//! # Example
//!
//! ```
//! use seqgen::store::{FailOn, KeyValueStore, MemoryStore};
//!
//! let store = MemoryStore::new().fail_on(FailOn::PutKey("seq_3".into()));
//! assert!(store.put("seq_3", "1").is_err());
//! assert!(store.put("seq_4", "1").is_ok());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use super::traits::{KeyValueStore, StoreError};

/// In-memory key/value store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryStoreInner>>,
}

#[derive(Debug, Default)]
struct MemoryStoreInner {
    entries: HashMap<String, String>,
    fail_on: Vec<FailOn>,
}

/// Configuration for which operation should fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailOn {
    /// Fail reads of this key.
    GetKey(String),
    /// Fail writes of this key.
    PutKey(String),
    /// Fail every write.
    AnyPut,
}

impl FailOn {
    fn matches_get(&self, key: &str) -> bool {
        matches!(self, FailOn::GetKey(k) if k == key)
    }

    fn matches_put(&self, key: &str) -> bool {
        match self {
            FailOn::PutKey(k) => k == key,
            FailOn::AnyPut => true,
            FailOn::GetKey(_) => false,
        }
    }
}

impl MemoryStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with entries.
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        {
            let mut inner = store.lock();
            inner.entries = entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect();
        }
        store
    }

    /// Add a failure rule.
    pub fn fail_on(self, fail_on: FailOn) -> Self {
        self.lock().fail_on.push(fail_on);
        self
    }

    /// Remove all failure rules.
    pub fn clear_fail_on(&self) {
        self.lock().fail_on.clear();
    }

    /// Copy of all entries currently stored.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.lock().entries.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MemoryStoreInner> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let inner = self.lock();
        if inner.fail_on.iter().any(|f| f.matches_get(key)) {
            return Err(StoreError::ReadError(format!("injected failure reading {}", key)));
        }
        Ok(inner.entries.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.fail_on.iter().any(|f| f.matches_put(key)) {
            return Err(StoreError::WriteError(format!("injected failure writing {}", key)));
        }
        inner.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.lock();
        if inner.fail_on.iter().any(|f| f.matches_put(key)) {
            return Err(StoreError::WriteError(format!("injected failure deleting {}", key)));
        }
        inner.entries.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_entries() {
        let store = MemoryStore::new();
        let other = store.clone();

        store.put("seq_1", "3").expect("put");
        assert_eq!(other.get("seq_1").expect("get"), Some("3".to_string()));
    }

    #[test]
    fn with_entries_prepopulates() {
        let store = MemoryStore::with_entries([("seq_id", "5"), ("seq_0", "11")]);
        assert_eq!(store.get("seq_id").expect("get"), Some("5".to_string()));
        assert_eq!(store.snapshot().len(), 2);
    }

    #[test]
    fn injected_put_failure_is_scoped_to_key() {
        let store = MemoryStore::new().fail_on(FailOn::PutKey("seq_2".into()));

        assert!(matches!(
            store.put("seq_2", "1"),
            Err(StoreError::WriteError(_))
        ));
        store.put("seq_3", "1").expect("other key still writable");

        store.clear_fail_on();
        store.put("seq_2", "1").expect("writable after clear");
    }

    #[test]
    fn injected_get_failure() {
        let store = MemoryStore::with_entries([("seq_9", "1")])
            .fail_on(FailOn::GetKey("seq_9".into()));
        assert!(matches!(store.get("seq_9"), Err(StoreError::ReadError(_))));
    }

    #[test]
    fn any_put_blocks_delete() {
        let store = MemoryStore::with_entries([("seq_1", "1")]).fail_on(FailOn::AnyPut);
        assert!(store.delete("seq_1").is_err());
        assert!(store.exists("seq_1").expect("exists"));
    }
}
