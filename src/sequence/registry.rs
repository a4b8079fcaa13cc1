//! sequence::registry
//!
//! The process-scoped directory of sequence generators.
//!
//! # Design
//!
//! `SequenceRegistry` is an explicitly constructed context object: open one
//! per store namespace at startup and share it (usually as
//! `Arc<SequenceRegistry>`) with every component that needs ids. It owns:
//!
//! - the default generator (id 0), seeded from `seq_0`, never evicted
//! - the id-allocation counter, seeded from `seq_id`
//! - a [`GeneratorCache`] of generators by id
//!
//! The cache mutex only guards the lookup/insert decision. Store reads
//! happen outside it; when two threads cold-load the same id concurrently,
//! the first insert wins and both callers get that instance.
//!
//! Registries do not coordinate with each other. When several processes
//! share a namespace, hold [`lock_namespace`](crate::store::lock_namespace)
//! for each registry's whole lifetime.
//!
//! # Shutdown
//!
//! [`SequenceRegistry::shutdown`] runs the flush described in
//! [`flush`](super::flush) at most once. Dropping the registry calls it if
//! it has not run yet, so keeping the registry alive for the lifetime of
//! the process ties the flush to process termination.
//!
//! A flagged generator that leaves the cache early (evicted, released, or
//! dropped by its last holder under [`CachePolicy::Unreferenced`]) is
//! persisted at that point instead.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use seqgen::sequence::SequenceRegistry;
//! use seqgen::store::{KeyValueStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! let registry = SequenceRegistry::open(Arc::new(store.clone())).unwrap();
//!
//! let orders = registry.create().unwrap();
//! assert_eq!(orders.next_id(), 1);
//! orders.set_persist_on_exit(true);
//!
//! let id = orders.sequence_id();
//! drop(registry);
//! assert_eq!(store.get(&format!("seq_{}", id)).unwrap().as_deref(), Some("2"));
//! ```

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, warn};

use super::cache::{CachePolicy, GeneratorCache};
use super::errors::SequenceError;
use super::flush::{flush_all, FlushReport};
use super::generator::SequenceGenerator;
use super::{read_value, value_key, DEFAULT_INITIAL_VALUE, DEFAULT_SEQUENCE_ID, ID_ALLOCATION_KEY};
use crate::store::KeyValueStore;

/// What minting does once the id-allocation counter reaches `i64::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Restart at 1. Ids are no longer unique against very old generators.
    #[default]
    Wrap,
    /// Refuse to mint with [`SequenceError::IdSpaceExhausted`].
    Fail,
}

/// Tunables for a registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegistryOptions {
    pub cache: CachePolicy,
    pub overflow: OverflowPolicy,
}

/// Directory of sequence generators backed by one durable store.
pub struct SequenceRegistry {
    store: Arc<dyn KeyValueStore>,
    default_generator: Arc<SequenceGenerator>,
    next_sequence_id: AtomicI64,
    cache: Mutex<GeneratorCache>,
    options: RegistryOptions,
    flushed: AtomicBool,
}

impl SequenceRegistry {
    /// Open a registry with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if `seq_id` or `seq_0` cannot be read or parsed.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Result<Self, SequenceError> {
        Self::with_options(store, RegistryOptions::default())
    }

    /// Open a registry, seeding the id-allocation counter and the default
    /// generator from the store.
    ///
    /// # Errors
    ///
    /// Returns an error if `seq_id` or `seq_0` cannot be read or parsed.
    pub fn with_options(
        store: Arc<dyn KeyValueStore>,
        options: RegistryOptions,
    ) -> Result<Self, SequenceError> {
        let next_sequence_id = read_value(store.as_ref(), ID_ALLOCATION_KEY)?
            .unwrap_or(DEFAULT_INITIAL_VALUE)
            .max(1);
        let default_generator = seeded(
            DEFAULT_SEQUENCE_ID,
            read_value(store.as_ref(), &value_key(DEFAULT_SEQUENCE_ID))?,
            DEFAULT_INITIAL_VALUE,
            &store,
        );

        debug!(
            "opened registry: next id {}, default generator at {}, {:?}",
            next_sequence_id,
            default_generator.current_id(),
            options
        );

        Ok(Self {
            default_generator: Arc::new(default_generator),
            store,
            next_sequence_id: AtomicI64::new(next_sequence_id),
            cache: Mutex::new(GeneratorCache::new(options.cache)),
            options,
            flushed: AtomicBool::new(false),
        })
    }

    /// The reserved id-0 generator.
    pub fn default_generator(&self) -> Arc<SequenceGenerator> {
        Arc::clone(&self.default_generator)
    }

    /// Look up a generator by id.
    ///
    /// Id 0 is the default generator. Other ids are served from the cache
    /// or, on a miss, re-materialized from `seq_<id>`. An id with no stored
    /// value is `Ok(None)`; `get` never creates a new sequence.
    ///
    /// # Errors
    ///
    /// - [`SequenceError::InvalidArgument`] if `sequence_id < 0`
    /// - [`SequenceError::Corrupt`] if the stored value is not an integer
    /// - [`SequenceError::Store`] if the store read fails
    pub fn get(&self, sequence_id: i64) -> Result<Option<Arc<SequenceGenerator>>, SequenceError> {
        if sequence_id < 0 {
            return Err(SequenceError::InvalidArgument(sequence_id));
        }
        if sequence_id == DEFAULT_SEQUENCE_ID {
            return Ok(Some(self.default_generator()));
        }
        if let Some(generator) = self.cache().lookup(sequence_id) {
            return Ok(Some(generator));
        }

        let Some(value) = read_value(self.store.as_ref(), &value_key(sequence_id))? else {
            debug!("no stored value for sequence {}", sequence_id);
            return Ok(None);
        };

        debug!("materialized sequence {} at {}", sequence_id, value);
        let candidate = Arc::new(SequenceGenerator::from_stored(
            sequence_id,
            value,
            Arc::clone(&self.store),
        ));
        Ok(Some(self.insert_or_existing(candidate)))
    }

    /// Create a new sequence starting at 1.
    ///
    /// # Errors
    ///
    /// See [`create_starting_at`](Self::create_starting_at).
    pub fn create(&self) -> Result<Arc<SequenceGenerator>, SequenceError> {
        self.create_starting_at(DEFAULT_INITIAL_VALUE)
    }

    /// Mint a fresh id and create a sequence starting at `initial_value`.
    ///
    /// If the store already holds a value for the minted id (for example
    /// after the id space wrapped), that value wins over `initial_value`.
    ///
    /// # Errors
    ///
    /// - [`SequenceError::IdSpaceExhausted`] under [`OverflowPolicy::Fail`]
    /// - [`SequenceError::Corrupt`] / [`SequenceError::Store`] if the
    ///   stored value for the minted id cannot be read
    pub fn create_starting_at(
        &self,
        initial_value: i64,
    ) -> Result<Arc<SequenceGenerator>, SequenceError> {
        let sequence_id = self.mint_unused_id()?;
        let stored = read_value(self.store.as_ref(), &value_key(sequence_id))?;
        let generator = Arc::new(seeded(sequence_id, stored, initial_value, &self.store));
        debug!("created sequence {} at {}", sequence_id, generator.current_id());

        let evicted = self.cache().insert(Arc::clone(&generator));
        self.persist_evicted(evicted);
        Ok(generator)
    }

    /// Drop a generator from the registry early.
    ///
    /// Removes its cache entry (unless a newer instance has replaced it) and
    /// persists it if persist-on-exit is set. The default generator is never
    /// removed, only persisted.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::Store`] if persisting fails; the entry is
    /// removed regardless.
    pub fn release(&self, generator: &Arc<SequenceGenerator>) -> Result<(), SequenceError> {
        if generator.sequence_id() != DEFAULT_SEQUENCE_ID {
            let removed = self.cache().remove_if_same(generator);
            debug!(
                "released sequence {} (cache entry removed: {})",
                generator.sequence_id(),
                removed
            );
        }
        if generator.is_persist_on_exit() {
            generator.persist()?;
        }
        Ok(())
    }

    /// Flush flagged generators and the id-allocation counter.
    ///
    /// Runs at most once; later calls return a report with
    /// `already_flushed` set and write nothing.
    pub fn shutdown(&self) -> FlushReport {
        if self.flushed.swap(true, Ordering::SeqCst) {
            return FlushReport {
                already_flushed: true,
                ..FlushReport::default()
            };
        }

        let cached = self.cache().live();
        flush_all(
            cached,
            &self.default_generator,
            self.store.as_ref(),
            self.next_sequence_id(),
        )
    }

    /// Whether [`shutdown`](Self::shutdown) has run.
    pub fn is_shut_down(&self) -> bool {
        self.flushed.load(Ordering::SeqCst)
    }

    /// The id the next `create` will mint.
    pub fn next_sequence_id(&self) -> i64 {
        self.next_sequence_id.load(Ordering::SeqCst)
    }

    /// Ids of all generators currently reachable through the cache.
    pub fn cached_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = self
            .cache()
            .live()
            .iter()
            .map(|generator| generator.sequence_id())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of live generators in the cache, excluding the default.
    pub fn cached_len(&self) -> usize {
        self.cache().live().len()
    }

    fn mint_id(&self) -> Result<i64, SequenceError> {
        let overflow = self.options.overflow;
        self.next_sequence_id
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| match overflow {
                OverflowPolicy::Wrap => Some(if current == i64::MAX { 1 } else { current + 1 }),
                OverflowPolicy::Fail => current.checked_add(1),
            })
            .map_err(|_| SequenceError::IdSpaceExhausted)
    }

    /// Mint ids until one is not held by a live cached generator.
    ///
    /// Only matters once minting has wrapped under [`OverflowPolicy::Wrap`].
    fn mint_unused_id(&self) -> Result<i64, SequenceError> {
        loop {
            let sequence_id = self.mint_id()?;
            let live = self.cache().lookup(sequence_id);
            if live.is_none() {
                return Ok(sequence_id);
            }
            debug!("skipping sequence id {}: still live after wrap", sequence_id);
        }
    }

    fn insert_or_existing(&self, candidate: Arc<SequenceGenerator>) -> Arc<SequenceGenerator> {
        let evicted = {
            let mut cache = self.cache();
            if let Some(existing) = cache.lookup(candidate.sequence_id()) {
                return existing;
            }
            cache.insert(Arc::clone(&candidate))
        };
        self.persist_evicted(evicted);
        candidate
    }

    /// Persist a generator pushed out of the cache, or replaced in it,
    /// outside the cache lock.
    fn persist_evicted(&self, evicted: Option<Arc<SequenceGenerator>>) {
        let Some(generator) = evicted else {
            return;
        };
        debug!("evicted sequence {}", generator.sequence_id());
        if generator.is_persist_on_exit() {
            if let Err(e) = generator.persist() {
                warn!(
                    "failed to persist evicted sequence {}: {}",
                    generator.sequence_id(),
                    e
                );
            }
        }
    }

    fn cache(&self) -> MutexGuard<'_, GeneratorCache> {
        // Cache operations never leave it half-updated, so a poisoned lock is safe to reuse.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Build a generator from an optional stored value, falling back to `initial_value`.
fn seeded(
    sequence_id: i64,
    stored: Option<i64>,
    initial_value: i64,
    store: &Arc<dyn KeyValueStore>,
) -> SequenceGenerator {
    match stored {
        Some(value) => SequenceGenerator::from_stored(sequence_id, value, Arc::clone(store)),
        None => SequenceGenerator::new(sequence_id, initial_value, Arc::clone(store)),
    }
}

impl fmt::Debug for SequenceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceRegistry")
            .field("default_generator", &self.default_generator)
            .field("next_sequence_id", &self.next_sequence_id())
            .field("options", &self.options)
            .field("flushed", &self.is_shut_down())
            .finish()
    }
}

impl Drop for SequenceRegistry {
    fn drop(&mut self) {
        if !self.is_shut_down() {
            self.shutdown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{FailOn, MemoryStore};
    use std::num::NonZeroUsize;

    fn open(store: &MemoryStore) -> SequenceRegistry {
        SequenceRegistry::open(Arc::new(store.clone())).expect("open registry")
    }

    fn open_lru(store: &MemoryStore, capacity: usize) -> SequenceRegistry {
        let options = RegistryOptions {
            cache: CachePolicy::Lru {
                capacity: NonZeroUsize::new(capacity).expect("non-zero"),
            },
            ..RegistryOptions::default()
        };
        SequenceRegistry::with_options(Arc::new(store.clone()), options).expect("open registry")
    }

    #[test]
    fn fresh_store_seeds_defaults() {
        let store = MemoryStore::new();
        let registry = open(&store);

        assert_eq!(registry.next_sequence_id(), 1);
        let default = registry.default_generator();
        assert_eq!(default.sequence_id(), 0);
        assert_eq!(default.current_id(), 1);
    }

    #[test]
    fn seeds_from_stored_values() {
        let store = MemoryStore::with_entries([("seq_id", "40"), ("seq_0", "900")]);
        let registry = open(&store);

        assert_eq!(registry.next_sequence_id(), 40);
        assert_eq!(registry.default_generator().next_id(), 900);
    }

    #[test]
    fn non_positive_stored_allocation_counter_is_clamped() {
        let store = MemoryStore::with_entries([("seq_id", "-3")]);
        let registry = open(&store);
        assert_eq!(registry.create().expect("create").sequence_id(), 1);
    }

    #[test]
    fn corrupt_seed_fails_open() {
        let store = MemoryStore::with_entries([("seq_id", "lots")]);
        let err = SequenceRegistry::open(Arc::new(store)).expect_err("corrupt");
        assert!(matches!(err, SequenceError::Corrupt { .. }));
    }

    #[test]
    fn default_generator_is_shared() {
        let store = MemoryStore::new();
        let registry = open(&store);

        let a = registry.default_generator();
        let b = registry.get(0).expect("get").expect("default");
        assert!(Arc::ptr_eq(&a, &b));

        a.next_id();
        assert_eq!(b.current_id(), 2);
    }

    #[test]
    fn get_negative_is_invalid_argument() {
        let registry = open(&MemoryStore::new());
        assert_eq!(
            registry.get(-1).expect_err("negative"),
            SequenceError::InvalidArgument(-1)
        );
    }

    #[test]
    fn get_unknown_is_absent() {
        let registry = open(&MemoryStore::new());
        assert!(registry.get(12).expect("get").is_none());
        assert!(registry.cached_ids().is_empty());
    }

    #[test]
    fn get_returns_cached_instance() {
        let registry = open(&MemoryStore::new());
        let created = registry.create().expect("create");

        let found = registry
            .get(created.sequence_id())
            .expect("get")
            .expect("present");
        assert!(Arc::ptr_eq(&created, &found));
    }

    #[test]
    fn get_materializes_from_store() {
        let store = MemoryStore::with_entries([("seq_5", "31")]);
        let registry = open(&store);

        let gen = registry.get(5).expect("get").expect("present");
        assert_eq!(gen.next_id(), 31);
        assert_eq!(registry.cached_ids(), vec![5]);
    }

    #[test]
    fn get_with_corrupt_value_reports_corrupt() {
        let store = MemoryStore::with_entries([("seq_5", "3x")]);
        let registry = open(&store);

        assert_eq!(
            registry.get(5).expect_err("corrupt"),
            SequenceError::Corrupt {
                key: "seq_5".into(),
                value: "3x".into()
            }
        );
    }

    #[test]
    fn get_surfaces_store_read_failure() {
        let store = MemoryStore::new().fail_on(FailOn::GetKey("seq_3".into()));
        let registry = open(&store);
        assert!(matches!(registry.get(3), Err(SequenceError::Store(_))));
    }

    #[test]
    fn create_defaults_to_one_and_mints_distinct_ids() {
        let registry = open(&MemoryStore::new());

        let a = registry.create().expect("create a");
        let b = registry.create_starting_at(100).expect("create b");

        assert_ne!(a.sequence_id(), b.sequence_id());
        assert_eq!(a.next_id(), 1);
        assert_eq!(b.next_id(), 100);
        assert_eq!(registry.next_sequence_id(), 3);
    }

    #[test]
    fn create_prefers_persisted_value_for_minted_id() {
        let store = MemoryStore::with_entries([("seq_id", "4"), ("seq_4", "60")]);
        let registry = open(&store);

        let gen = registry.create_starting_at(1).expect("create");
        assert_eq!(gen.sequence_id(), 4);
        assert_eq!(gen.current_id(), 60);
    }

    #[test]
    fn minting_wraps_to_one() {
        let store = MemoryStore::with_entries([("seq_id", i64::MAX.to_string())]);
        let registry = open(&store);

        assert_eq!(registry.create().expect("create").sequence_id(), i64::MAX);
        assert_eq!(registry.next_sequence_id(), 1);
        assert_eq!(registry.create().expect("create").sequence_id(), 1);
    }

    #[test]
    fn minting_fails_when_configured() {
        let store = MemoryStore::with_entries([("seq_id", i64::MAX.to_string())]);
        let options = RegistryOptions {
            overflow: OverflowPolicy::Fail,
            ..RegistryOptions::default()
        };
        let registry =
            SequenceRegistry::with_options(Arc::new(store), options).expect("open registry");

        assert_eq!(
            registry.create().expect_err("exhausted"),
            SequenceError::IdSpaceExhausted
        );
        assert_eq!(registry.next_sequence_id(), i64::MAX);
    }

    #[test]
    fn lru_eviction_rematerializes_from_store() {
        let store = MemoryStore::new();
        let registry = open_lru(&store, 1);

        let first = registry.create_starting_at(10).expect("create first");
        first.next_id();
        first.persist().expect("persist");
        let first_id = first.sequence_id();

        registry.create().expect("create second evicts first");
        assert_eq!(registry.cached_len(), 1);

        // Advances after persist are invisible to the re-materialized instance.
        first.next_id();
        let again = registry.get(first_id).expect("get").expect("present");
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(again.current_id(), 11);
        assert_eq!(first.current_id(), 12);
    }

    #[test]
    fn lru_eviction_persists_flagged_generator() {
        let store = MemoryStore::new();
        let registry = open_lru(&store, 1);

        let first = registry.create_starting_at(20).expect("create");
        first.set_persist_on_exit(true);
        first.next_id();
        let key = value_key(first.sequence_id());
        drop(first);

        registry.create().expect("evicting create");
        assert_eq!(store.get(&key).expect("get"), Some("21".to_string()));
    }

    #[test]
    fn unreferenced_policy_forgets_dropped_generators() {
        let store = MemoryStore::new();
        let options = RegistryOptions {
            cache: CachePolicy::Unreferenced,
            ..RegistryOptions::default()
        };
        let registry =
            SequenceRegistry::with_options(Arc::new(store.clone()), options).expect("open");

        let gen = registry.create().expect("create");
        let id = gen.sequence_id();
        assert_eq!(registry.cached_ids(), vec![id]);

        drop(gen);
        assert!(registry.cached_ids().is_empty());
        // Never persisted, so there is nothing to come back to.
        assert!(registry.get(id).expect("get").is_none());
    }

    #[test]
    fn unreferenced_policy_persists_flagged_generator_on_last_drop() {
        let store = MemoryStore::new();
        let options = RegistryOptions {
            cache: CachePolicy::Unreferenced,
            ..RegistryOptions::default()
        };
        let registry =
            SequenceRegistry::with_options(Arc::new(store.clone()), options).expect("open");

        let gen = registry.create_starting_at(5).expect("create");
        gen.set_persist_on_exit(true);
        assert_eq!(gen.next_id(), 5);
        assert_eq!(gen.next_id(), 6);
        let key = value_key(gen.sequence_id());
        drop(gen);

        let report = registry.shutdown();
        assert!(report.is_clean());
        assert_eq!(store.get(&key).expect("get"), Some("7".to_string()));

        let reopened = open(&store);
        let again = reopened.get(1).expect("get").expect("persisted");
        assert_eq!(again.next_id(), 7);
    }

    #[test]
    fn wrapped_minting_skips_live_ids() {
        let store = MemoryStore::new();
        let registry = open(&store);

        let live = registry.create_starting_at(30).expect("create");
        live.set_persist_on_exit(true);
        live.next_id();
        assert_eq!(live.sequence_id(), 1);

        registry.next_sequence_id.store(i64::MAX, Ordering::SeqCst);
        assert_eq!(registry.create().expect("create").sequence_id(), i64::MAX);
        assert_eq!(registry.create().expect("create").sequence_id(), 2);

        let cached = registry.get(1).expect("get").expect("still cached");
        assert!(Arc::ptr_eq(&cached, &live));
        assert_eq!(cached.current_id(), 31);
    }

    #[test]
    fn release_removes_entry_and_persists_flagged() {
        let store = MemoryStore::new();
        let registry = open(&store);

        let gen = registry.create_starting_at(3).expect("create");
        gen.set_persist_on_exit(true);
        gen.next_id();
        registry.release(&gen).expect("release");

        assert!(registry.cached_ids().is_empty());
        assert_eq!(
            store.get(&value_key(gen.sequence_id())).expect("get"),
            Some("4".to_string())
        );
        // Still usable after release.
        assert_eq!(gen.next_id(), 4);
    }

    #[test]
    fn release_of_default_keeps_it_registered() {
        let store = MemoryStore::new();
        let registry = open(&store);
        let default = registry.default_generator();
        default.set_persist_on_exit(true);

        registry.release(&default).expect("release");
        assert!(Arc::ptr_eq(&default, &registry.default_generator()));
        assert_eq!(store.get("seq_0").expect("get"), Some("1".to_string()));
    }

    #[test]
    fn shutdown_runs_once() {
        let store = MemoryStore::new();
        let registry = open(&store);
        registry.create().expect("create");

        let first = registry.shutdown();
        assert!(first.id_allocation_saved);
        assert!(!first.already_flushed);
        assert!(registry.is_shut_down());

        store.delete("seq_id").expect("delete");
        let second = registry.shutdown();
        assert!(second.already_flushed);
        assert!(store.get("seq_id").expect("get").is_none());
    }

    #[test]
    fn drop_flushes_flagged_generators() {
        let store = MemoryStore::with_entries([("seq_id", "7")]);
        {
            let registry = open(&store);
            let gen = registry.create_starting_at(5).expect("create");
            assert_eq!(gen.sequence_id(), 7);
            assert_eq!(gen.next_id(), 5);
            assert_eq!(gen.next_id(), 6);
            assert_eq!(gen.current_id(), 7);
            gen.set_persist_on_exit(true);
        }
        assert_eq!(store.get("seq_7").expect("get"), Some("7".to_string()));
        assert_eq!(store.get("seq_id").expect("get"), Some("8".to_string()));
    }

    #[test]
    fn debug_output_mentions_next_id() {
        let registry = open(&MemoryStore::new());
        assert!(format!("{:?}", registry).contains("next_sequence_id: 1"));
    }
}
