//! sequence::generator
//!
//! A single identified, thread-safe monotonic counter.
//!
//! # Invariants
//!
//! - `sequence_id` never changes after construction
//! - The counter only moves through atomic fetch-and-increment, so every
//!   caller of [`SequenceGenerator::next_id`] observes a distinct value
//! - Equality and hashing use `sequence_id` alone
//! - Dropping a flagged generator whose value differs from the last one
//!   written persists it, so a reclaimed generator never loses its value
//!
//! # Overflow
//!
//! `next_id` wraps from `i64::MAX` to `i64::MIN` with two's complement
//! arithmetic. Callers that must never see a wrapped value use
//! [`SequenceGenerator::try_next_id`].

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use log::{debug, warn};

use super::errors::SequenceError;
use super::value_key;
use crate::store::KeyValueStore;

/// Monotonic counter with an optional write-back to durable storage.
///
/// Obtained from a [`SequenceRegistry`](super::SequenceRegistry); shared as
/// `Arc<SequenceGenerator>`.
pub struct SequenceGenerator {
    sequence_id: i64,
    counter: AtomicI64,
    persist_on_exit: AtomicBool,
    /// Last value known to be in the store, valid while `stored` is set.
    stored_value: AtomicI64,
    stored: AtomicBool,
    store: Arc<dyn KeyValueStore>,
}

impl SequenceGenerator {
    /// A generator whose value is not yet in the store.
    pub(crate) fn new(sequence_id: i64, initial_value: i64, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            sequence_id,
            counter: AtomicI64::new(initial_value),
            persist_on_exit: AtomicBool::new(false),
            stored_value: AtomicI64::new(initial_value),
            stored: AtomicBool::new(false),
            store,
        }
    }

    /// A generator seeded from a value read back from the store.
    pub(crate) fn from_stored(sequence_id: i64, value: i64, store: Arc<dyn KeyValueStore>) -> Self {
        let generator = Self::new(sequence_id, value, store);
        generator.stored.store(true, Ordering::SeqCst);
        generator
    }

    /// Return the current value and advance the counter by one.
    ///
    /// Lock-free. Wraps on overflow.
    pub fn next_id(&self) -> i64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Like [`next_id`](Self::next_id), but refuses to wrap.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Overflow`] when the counter is at `i64::MAX`;
    /// the counter is left unchanged.
    pub fn try_next_id(&self) -> Result<i64, SequenceError> {
        self.counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                current.checked_add(1)
            })
            .map_err(|_| SequenceError::Overflow {
                sequence_id: self.sequence_id,
            })
    }

    /// Read the value the next call to `next_id` will return.
    pub fn current_id(&self) -> i64 {
        self.counter.load(Ordering::SeqCst)
    }

    /// The immutable identity of this generator.
    pub fn sequence_id(&self) -> i64 {
        self.sequence_id
    }

    /// Whether the value is written back at shutdown, eviction or release.
    pub fn is_persist_on_exit(&self) -> bool {
        self.persist_on_exit.load(Ordering::SeqCst)
    }

    /// Set the persist-on-exit flag.
    pub fn set_persist_on_exit(&self, persist_on_exit: bool) {
        self.persist_on_exit.store(persist_on_exit, Ordering::SeqCst);
    }

    /// Write the current value to `seq_<sequence_id>`.
    ///
    /// Idempotent; overwrites any earlier value.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Store`] if the write fails.
    pub fn persist(&self) -> Result<(), SequenceError> {
        let key = value_key(self.sequence_id);
        let value = self.current_id();
        self.store.put(&key, &value.to_string())?;
        self.stored_value.store(value, Ordering::SeqCst);
        self.stored.store(true, Ordering::SeqCst);
        debug!("persisted {} = {}", key, value);
        Ok(())
    }

    /// Whether the store may hold a different value than the counter.
    fn is_dirty(&self) -> bool {
        !self.stored.load(Ordering::SeqCst)
            || self.stored_value.load(Ordering::SeqCst) != self.current_id()
    }
}

impl Drop for SequenceGenerator {
    fn drop(&mut self) {
        if self.is_persist_on_exit() && self.is_dirty() {
            if let Err(e) = self.persist() {
                warn!(
                    "failed to persist sequence {} on drop: {}",
                    self.sequence_id, e
                );
            }
        }
    }
}

impl PartialEq for SequenceGenerator {
    fn eq(&self, other: &Self) -> bool {
        self.sequence_id == other.sequence_id
    }
}

impl Eq for SequenceGenerator {}

impl Hash for SequenceGenerator {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.sequence_id.hash(state);
    }
}

impl fmt::Display for SequenceGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{counter={}, seq={}}}", self.current_id(), self.sequence_id)
    }
}

impl fmt::Debug for SequenceGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceGenerator")
            .field("sequence_id", &self.sequence_id)
            .field("counter", &self.current_id())
            .field("persist_on_exit", &self.is_persist_on_exit())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FailOn, MemoryStore};
    use std::collections::HashSet;
    use std::thread;

    fn generator(id: i64, initial: i64) -> (MemoryStore, SequenceGenerator) {
        let store = MemoryStore::new();
        let generator = SequenceGenerator::new(id, initial, Arc::new(store.clone()));
        (store, generator)
    }

    #[test]
    fn next_id_returns_pre_increment_value() {
        let (_store, gen) = generator(7, 5);

        assert_eq!(gen.next_id(), 5);
        assert_eq!(gen.next_id(), 6);
        assert_eq!(gen.current_id(), 7);
        assert_eq!(gen.sequence_id(), 7);
    }

    #[test]
    fn current_id_does_not_mutate() {
        let (_store, gen) = generator(1, 10);
        assert_eq!(gen.current_id(), 10);
        assert_eq!(gen.current_id(), 10);
        assert_eq!(gen.next_id(), 10);
    }

    #[test]
    fn concurrent_next_id_yields_consecutive_distinct_values() {
        let (_store, gen) = generator(3, 100);
        let gen = Arc::new(gen);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let gen = Arc::clone(&gen);
                thread::spawn(move || (0..500).map(|_| gen.next_id()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for value in handle.join().expect("join") {
                assert!(seen.insert(value), "duplicate id {}", value);
            }
        }

        assert_eq!(seen.len(), 4000);
        assert_eq!(*seen.iter().min().expect("min"), 100);
        assert_eq!(*seen.iter().max().expect("max"), 4099);
        assert_eq!(gen.current_id(), 4100);
    }

    #[test]
    fn next_id_wraps_at_max() {
        let (_store, gen) = generator(1, i64::MAX);
        assert_eq!(gen.next_id(), i64::MAX);
        assert_eq!(gen.current_id(), i64::MIN);
    }

    #[test]
    fn try_next_id_refuses_to_wrap() {
        let (_store, gen) = generator(4, i64::MAX - 1);

        assert_eq!(gen.try_next_id(), Ok(i64::MAX - 1));
        assert_eq!(
            gen.try_next_id(),
            Err(SequenceError::Overflow { sequence_id: 4 })
        );
        assert_eq!(gen.current_id(), i64::MAX);
    }

    #[test]
    fn persist_flag_defaults_off_and_toggles() {
        let (_store, gen) = generator(2, 1);
        assert!(!gen.is_persist_on_exit());

        gen.set_persist_on_exit(true);
        assert!(gen.is_persist_on_exit());
        gen.set_persist_on_exit(false);
        assert!(!gen.is_persist_on_exit());
    }

    #[test]
    fn persist_writes_decimal_value_under_derived_key() {
        let (store, gen) = generator(12, 40);
        gen.next_id();
        gen.next_id();

        gen.persist().expect("persist");
        assert_eq!(store.get("seq_12").expect("get"), Some("42".to_string()));

        gen.persist().expect("persist again");
        assert_eq!(store.get("seq_12").expect("get"), Some("42".to_string()));
    }

    #[test]
    fn persist_reports_store_failure() {
        let store = MemoryStore::new().fail_on(FailOn::PutKey("seq_5".into()));
        let gen = SequenceGenerator::new(5, 1, Arc::new(store));

        assert!(matches!(gen.persist(), Err(SequenceError::Store(_))));
    }

    #[test]
    fn dropping_flagged_generator_persists_it() {
        let (store, gen) = generator(6, 5);
        gen.set_persist_on_exit(true);
        gen.next_id();
        gen.next_id();

        drop(gen);
        assert_eq!(store.get("seq_6").expect("get"), Some("7".to_string()));
    }

    #[test]
    fn dropping_unflagged_generator_writes_nothing() {
        let (store, gen) = generator(6, 5);
        gen.next_id();

        drop(gen);
        assert_eq!(store.get("seq_6").expect("get"), None);
    }

    #[test]
    fn drop_skips_write_when_loaded_value_is_unchanged() {
        let store = MemoryStore::with_entries([("seq_8", "3")]);
        let gen = SequenceGenerator::from_stored(8, 3, Arc::new(store.clone()));
        gen.set_persist_on_exit(true);
        store.put("seq_8", "50").expect("overwrite");

        drop(gen);
        assert_eq!(store.get("seq_8").expect("get"), Some("50".to_string()));
    }

    #[test]
    fn drop_after_explicit_persist_writes_only_later_advances() {
        let (store, gen) = generator(2, 1);
        gen.set_persist_on_exit(true);
        gen.persist().expect("persist");
        store.put("seq_2", "99").expect("overwrite");

        // Unchanged since the last write, so the external value stays.
        drop(gen);
        assert_eq!(store.get("seq_2").expect("get"), Some("99".to_string()));
    }

    #[test]
    fn equality_and_hash_use_sequence_id_only() {
        let (_s1, a) = generator(9, 1);
        let (_s2, b) = generator(9, 500);
        let (_s3, c) = generator(10, 1);

        assert_eq!(a, b);
        assert_ne!(a, c);

        let set: HashSet<&SequenceGenerator> = [&a, &b, &c].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn display_shows_counter_and_id() {
        let (_store, gen) = generator(3, 8);
        assert_eq!(gen.to_string(), "{counter=8, seq=3}");
        assert!(format!("{:?}", gen).contains("sequence_id: 3"));
    }
}
