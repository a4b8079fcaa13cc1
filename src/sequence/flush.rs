//! sequence::flush
//!
//! Shutdown flush of generator values and the id-allocation counter.
//!
//! # Order
//!
//! 1. Every cached generator with persist-on-exit set, in id order
//! 2. The default generator, if flagged
//! 3. The id-allocation counter under `seq_id`
//!
//! A failure at any step is recorded in the [`FlushReport`] and logged; it
//! never stops the remaining steps.

use std::sync::Arc;

use log::{debug, warn};

use super::errors::SequenceError;
use super::generator::SequenceGenerator;
use super::ID_ALLOCATION_KEY;
use crate::store::KeyValueStore;

/// What a flush step was writing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTarget {
    /// A generator value, by sequence id.
    Generator(i64),
    /// The id-allocation counter.
    IdAllocation,
}

/// A single failed flush step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushFailure {
    pub target: FlushTarget,
    pub error: SequenceError,
}

/// Outcome of a registry shutdown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlushReport {
    /// Sequence ids whose values were written.
    pub persisted: Vec<i64>,
    /// Steps that failed.
    pub failures: Vec<FlushFailure>,
    /// Whether `seq_id` was written.
    pub id_allocation_saved: bool,
    /// Set when the registry had already been flushed; nothing was written.
    pub already_flushed: bool,
}

impl FlushReport {
    /// True when every attempted step succeeded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, target: FlushTarget, result: Result<(), SequenceError>) {
        match (target, result) {
            (FlushTarget::Generator(id), Ok(())) => self.persisted.push(id),
            (FlushTarget::IdAllocation, Ok(())) => self.id_allocation_saved = true,
            (target, Err(error)) => {
                warn!("flush of {:?} failed: {}", target, error);
                self.failures.push(FlushFailure { target, error });
            }
        }
    }
}

/// Run all three flush steps.
pub(crate) fn flush_all(
    mut cached: Vec<Arc<SequenceGenerator>>,
    default_generator: &SequenceGenerator,
    store: &dyn KeyValueStore,
    next_sequence_id: i64,
) -> FlushReport {
    let mut report = FlushReport::default();

    cached.sort_by_key(|generator| generator.sequence_id());
    for generator in cached.iter().filter(|g| g.is_persist_on_exit()) {
        report.record(
            FlushTarget::Generator(generator.sequence_id()),
            generator.persist(),
        );
    }

    if default_generator.is_persist_on_exit() {
        report.record(
            FlushTarget::Generator(default_generator.sequence_id()),
            default_generator.persist(),
        );
    }

    let saved = store
        .put(ID_ALLOCATION_KEY, &next_sequence_id.to_string())
        .map_err(SequenceError::from);
    report.record(FlushTarget::IdAllocation, saved);

    debug!(
        "flush complete: {} persisted, {} failed, next id {}",
        report.persisted.len(),
        report.failures.len(),
        next_sequence_id
    );
    report
}
