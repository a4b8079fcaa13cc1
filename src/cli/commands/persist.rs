//! persist command - Write a sequence's value to the store immediately

use super::{finish, resolve, Context};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Persist the current value of sequence `id`.
pub fn persist(ctx: &Context, id: i64) -> Result<()> {
    let registry = ctx.open_registry()?;
    let generator = resolve(&registry, Some(id))?;
    generator
        .persist()
        .with_context(|| format!("Failed to persist sequence {}", id))?;

    output::print(
        format!(
            "Persisted sequence {} at {}",
            generator.sequence_id(),
            generator.current_id()
        ),
        ctx.verbosity,
    );
    finish(&registry)
}
