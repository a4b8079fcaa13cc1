//! create command - Mint a new sequence

use super::{finish, Context};
use crate::ui::output;
use anyhow::{Context as _, Result};

/// Create a sequence starting at `initial` and print its id.
///
/// The sequence's starting value is written back on exit unless
/// `no_persist` is set. The id allocation counter is always saved, so the
/// id is never handed out twice.
pub fn create(ctx: &Context, initial: i64, no_persist: bool) -> Result<()> {
    let registry = ctx.open_registry()?;
    let generator = registry
        .create_starting_at(initial)
        .context("Failed to create sequence")?;
    if !no_persist {
        generator.set_persist_on_exit(true);
    }

    output::value(generator.sequence_id());
    finish(&registry)?;
    drop(generator);
    Ok(())
}
