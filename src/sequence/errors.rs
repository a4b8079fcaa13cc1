//! sequence::errors
//!
//! Error types for generator and registry operations.

use thiserror::Error;

use crate::store::StoreError;

/// Errors from sequence operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SequenceError {
    /// A negative sequence id was passed to a lookup.
    #[error("invalid sequence id {0}: must be >= 0")]
    InvalidArgument(i64),

    /// A stored value could not be parsed as an integer.
    #[error("stored value for '{key}' is not an integer: '{value}'")]
    Corrupt { key: String, value: String },

    /// A checked increment would have wrapped past `i64::MAX`.
    #[error("sequence {sequence_id} would overflow")]
    Overflow { sequence_id: i64 },

    /// The id-allocation counter reached `i64::MAX` under the fail policy.
    #[error("sequence id space exhausted")]
    IdSpaceExhausted,

    /// The durable store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}
