//! core
//!
//! Configuration and storage locations for seqgen.
//!
//! # Modules
//!
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Centralized path routing for seqgen storage

pub mod config;
pub mod paths;
