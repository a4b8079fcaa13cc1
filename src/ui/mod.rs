//! ui
//!
//! User-facing output.
//!
//! # Modules
//!
//! - [`output`] - Output formatting, verbosity and the stderr log sink

pub mod output;
