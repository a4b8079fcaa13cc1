//! seqgen - persistent monotonic sequence generators
//!
//! Each sequence is a thread-safe 64-bit counter identified by a
//! non-negative id. Values survive restarts through a pluggable key-value
//! store, and new sequence ids are handed out by a persisted allocation
//! counter so an id is never minted twice.
//!
//! # Architecture
//!
//! - [`sequence`] - Generators, the registry that owns them, and the shutdown flush
//! - [`store`] - Key-value storage abstraction with file and in-memory backends
//! - [`core`] - Configuration schema, loading and path routing
//! - [`cli`] - Command-line interface layer (parses args, delegates to the registry)
//! - [`ui`] - Output formatting and the stderr log sink
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use seqgen::sequence::SequenceRegistry;
//! use seqgen::store::MemoryStore;
//!
//! let registry = SequenceRegistry::open(Arc::new(MemoryStore::new())).unwrap();
//! let orders = registry.create_starting_at(1000).unwrap();
//! assert_eq!(orders.next_id(), 1000);
//! assert_eq!(orders.next_id(), 1001);
//! ```

pub mod cli;
pub mod core;
pub mod sequence;
pub mod store;
pub mod ui;
