//! sequence
//!
//! Persistent, thread-safe monotonic sequence generators.
//!
//! # Modules
//!
//! - [`generator`] - A single identified counter
//! - [`registry`] - Lookup, creation and shutdown of generators
//! - [`cache`] - Eviction policies for the registry's generator cache
//! - [`flush`] - Shutdown flush and its report
//! - [`errors`] - Error types
//!
//! # Storage Keys
//!
//! - `seq_id` - the next id the registry will mint
//! - `seq_0` - the default generator's value
//! - `seq_<id>` - the value of generator `<id>`

pub mod cache;
pub mod errors;
pub mod flush;
pub mod generator;
pub mod registry;

pub use cache::{CachePolicy, DEFAULT_CACHE_CAPACITY};
pub use errors::SequenceError;
pub use flush::{FlushFailure, FlushReport, FlushTarget};
pub use generator::SequenceGenerator;
pub use registry::{OverflowPolicy, RegistryOptions, SequenceRegistry};

use crate::store::KeyValueStore;

/// Store key holding the next id to mint.
pub const ID_ALLOCATION_KEY: &str = "seq_id";

/// Id of the reserved default generator.
pub const DEFAULT_SEQUENCE_ID: i64 = 0;

/// Starting value for new sequences and for an empty store.
pub const DEFAULT_INITIAL_VALUE: i64 = 1;

/// Store key holding the value of generator `sequence_id`.
pub fn value_key(sequence_id: i64) -> String {
    format!("seq_{}", sequence_id)
}

/// Read and parse an integer value; absent keys are `Ok(None)`.
pub(crate) fn read_value(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Option<i64>, SequenceError> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    raw.trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|_| SequenceError::Corrupt {
            key: key.to_string(),
            value: raw,
        })
}
