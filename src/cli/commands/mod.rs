//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Opens a [`Session`] from the [`Context`]: the namespace session lock
//!    plus a registry over the store
//! 2. Performs its sequence operations
//! 3. Shuts the registry down with [`finish`], failing the command if any
//!    value could not be written back
//!
//! The session lock is held until the registry has flushed, so concurrent
//! invocations on one namespace run one after another.

mod completion;
mod config_cmd;
mod create;
mod current;
mod next;
mod persist;

pub use completion::{completion, write_completion};
pub use config_cmd::{path as config_path, show as config_show};
pub use create::create;
pub use current::current;
pub use next::next;
pub use persist::persist;

use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context as _, Result};

use super::args::{Command, ConfigAction};
use crate::core::config::{Config, StoreConfig};
use crate::sequence::{SequenceGenerator, SequenceRegistry};
use crate::store::{create_store, lock_namespace, StoreLock, DEFAULT_LOCK_TIMEOUT};
use crate::ui::output::Verbosity;

/// Execution context for commands.
///
/// Contains settings derived from CLI flags and configuration.
#[derive(Debug, Clone)]
pub struct Context {
    /// Output verbosity.
    pub verbosity: Verbosity,
    /// Loaded configuration.
    pub config: Config,
    /// Store directory override from `--store`.
    pub store_dir: Option<PathBuf>,
    /// Namespace override from `--namespace`.
    pub namespace: Option<String>,
}

impl Context {
    /// Store directory after applying the `--store` override.
    pub fn store_dir(&self) -> Result<PathBuf> {
        match &self.store_dir {
            Some(dir) => Ok(dir.clone()),
            None => self
                .config
                .store_dir()
                .context("Cannot determine store directory"),
        }
    }

    /// Namespace after applying the `--namespace` override.
    pub fn namespace(&self) -> &str {
        self.namespace
            .as_deref()
            .unwrap_or_else(|| self.config.store_namespace())
    }

    /// Lock the namespace and open a registry over the configured store.
    ///
    /// Waits up to [`DEFAULT_LOCK_TIMEOUT`] for another session on the same
    /// namespace to finish.
    pub fn open_registry(&self) -> Result<Session> {
        let namespace = self.namespace();
        StoreConfig {
            namespace: Some(namespace.to_string()),
            ..Default::default()
        }
        .validate()?;

        let provider = self.config.store_provider();
        let dir = self.store_dir()?;
        let lock = lock_namespace(provider, &dir, namespace, DEFAULT_LOCK_TIMEOUT)
            .with_context(|| format!("Namespace '{}' is busy", namespace))?;

        let store = create_store(provider, &dir, namespace)?;
        let registry = SequenceRegistry::with_options(store, self.config.registry_options())
            .context("Failed to open sequence registry")?;
        Ok(Session {
            registry,
            _lock: lock,
        })
    }
}

/// A registry that holds its namespace's session lock.
///
/// Fields drop in declaration order: the registry flushes before the lock
/// is released.
pub struct Session {
    registry: SequenceRegistry,
    _lock: Option<StoreLock>,
}

impl Deref for Session {
    type Target = SequenceRegistry;

    fn deref(&self) -> &SequenceRegistry {
        &self.registry
    }
}

/// Resolve an optional id to a generator; `None` is the default sequence.
pub(crate) fn resolve(
    registry: &SequenceRegistry,
    id: Option<i64>,
) -> Result<Arc<SequenceGenerator>> {
    match id {
        None => Ok(registry.default_generator()),
        Some(id) => registry
            .get(id)?
            .ok_or_else(|| anyhow!("Unknown sequence {}. Create one with 'seqgen create'.", id)),
    }
}

/// Shut the registry down, failing if any write-back failed.
pub(crate) fn finish(registry: &SequenceRegistry) -> Result<()> {
    let report = registry.shutdown();
    if !report.is_clean() {
        let details: Vec<String> = report
            .failures
            .iter()
            .map(|f| format!("{:?}: {}", f.target, f.error))
            .collect();
        bail!(
            "Failed to persist {} value(s): {}",
            report.failures.len(),
            details.join("; ")
        );
    }
    Ok(())
}

/// Dispatch a parsed command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Next {
            id,
            count,
            no_persist,
        } => next::next(ctx, id, count, no_persist),
        Command::Current { id } => current::current(ctx, id),
        Command::Create {
            initial,
            no_persist,
        } => create::create(ctx, initial, no_persist),
        Command::Persist { id } => persist::persist(ctx, id),
        Command::Config { action } => match action {
            ConfigAction::Show { json } => config_cmd::show(ctx, json),
            ConfigAction::Path => config_cmd::path(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}
