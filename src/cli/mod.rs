//! cli
//!
//! Command-line interface layer for seqgen.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the stderr log sink at the requested verbosity
//! - Load configuration and delegate to command handlers
//!
//! Every handler opens its own [`SequenceRegistry`](crate::sequence::SequenceRegistry)
//! and shuts it down before returning, so one invocation is one registry
//! lifetime.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};
pub use commands::Context;

use crate::core::config::Config;
use crate::ui::output::{self, Verbosity};
use anyhow::{Context as _, Result};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    let verbosity = Verbosity::from_flags(cli.quiet, cli.debug);
    output::init_logging(verbosity).context("Failed to initialize logging")?;

    let config = match &cli.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    let ctx = Context {
        verbosity,
        config,
        store_dir: cli.store.clone(),
        namespace: cli.namespace.clone(),
    };

    commands::dispatch(cli.command, &ctx)
}
