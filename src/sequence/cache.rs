//! sequence::cache
//!
//! Generator cache with a configurable eviction policy.
//!
//! # Policies
//!
//! - [`CachePolicy::Lru`]: the cache owns an `Arc` per entry and evicts the
//!   least recently used entry once `capacity` is reached.
//! - [`CachePolicy::Unreferenced`]: the cache holds only `Weak` handles; an
//!   entry disappears as soon as the last caller drops its `Arc`.
//!
//! Either way an evicted generator keeps working for anyone still holding
//! it, and the registry re-materializes a fresh instance from storage on
//! the next lookup.

use std::num::NonZeroUsize;
use std::sync::{Arc, Weak};

use lru::LruCache;

use super::generator::SequenceGenerator;

/// Default number of generators kept by the LRU policy.
pub const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1024) {
    Some(n) => n,
    None => unreachable!(),
};

/// How the registry decides which generators to drop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Keep at most `capacity` generators, evicting the least recently used.
    Lru { capacity: NonZeroUsize },
    /// Keep a generator only while some caller holds it.
    Unreferenced,
}

impl Default for CachePolicy {
    fn default() -> Self {
        CachePolicy::Lru {
            capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

enum Slot {
    Held(Arc<SequenceGenerator>),
    Weak(Weak<SequenceGenerator>),
}

impl Slot {
    fn upgrade(&self) -> Option<Arc<SequenceGenerator>> {
        match self {
            Slot::Held(generator) => Some(Arc::clone(generator)),
            Slot::Weak(weak) => weak.upgrade(),
        }
    }
}

/// Map from sequence id to live generator.
///
/// Not synchronized; the registry wraps it in a mutex.
pub(crate) struct GeneratorCache {
    policy: CachePolicy,
    entries: LruCache<i64, Slot>,
}

impl GeneratorCache {
    pub(crate) fn new(policy: CachePolicy) -> Self {
        let entries = match policy {
            CachePolicy::Lru { capacity } => LruCache::new(capacity),
            CachePolicy::Unreferenced => LruCache::unbounded(),
        };
        Self { policy, entries }
    }

    /// Find a live generator, dropping the slot if it has been reclaimed.
    pub(crate) fn lookup(&mut self, sequence_id: i64) -> Option<Arc<SequenceGenerator>> {
        let found = self.entries.get(&sequence_id).map(Slot::upgrade)?;
        if found.is_none() {
            self.entries.pop(&sequence_id);
        }
        found
    }

    /// Insert a generator, replacing any slot with the same id.
    ///
    /// Returns the generator pushed out to make room, or the live generator
    /// previously cached under the same id, if any.
    pub(crate) fn insert(
        &mut self,
        generator: Arc<SequenceGenerator>,
    ) -> Option<Arc<SequenceGenerator>> {
        let sequence_id = generator.sequence_id();
        let slot = match self.policy {
            CachePolicy::Lru { .. } => Slot::Held(generator),
            CachePolicy::Unreferenced => {
                self.prune();
                Slot::Weak(Arc::downgrade(&generator))
            }
        };

        match self.entries.push(sequence_id, slot) {
            Some((_, slot)) => slot.upgrade(),
            None => None,
        }
    }

    /// Remove the slot for `sequence_id` if it still refers to `generator`.
    pub(crate) fn remove_if_same(&mut self, generator: &Arc<SequenceGenerator>) -> bool {
        let sequence_id = generator.sequence_id();
        let same = match self.entries.peek(&sequence_id).and_then(Slot::upgrade) {
            Some(cached) => Arc::ptr_eq(&cached, generator),
            None => false,
        };
        if same {
            self.entries.pop(&sequence_id);
        }
        same
    }

    /// All generators still reachable through the cache.
    pub(crate) fn live(&self) -> Vec<Arc<SequenceGenerator>> {
        self.entries.iter().filter_map(|(_, slot)| slot.upgrade()).collect()
    }

    /// Drop slots whose generator has been reclaimed.
    fn prune(&mut self) {
        let dead: Vec<i64> = self
            .entries
            .iter()
            .filter(|(_, slot)| slot.upgrade().is_none())
            .map(|(id, _)| *id)
            .collect();
        for id in dead {
            self.entries.pop(&id);
        }
    }
}
