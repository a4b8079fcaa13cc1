//! next command - Draw values from a sequence

use super::{finish, resolve, Context};
use crate::ui::output;
use anyhow::Result;
use log::debug;

/// Print the next `count` values of a sequence.
///
/// The advanced counter is written back on exit unless `no_persist` is set.
pub fn next(ctx: &Context, id: Option<i64>, count: u32, no_persist: bool) -> Result<()> {
    let registry = ctx.open_registry()?;
    let generator = resolve(&registry, id)?;
    if !no_persist {
        generator.set_persist_on_exit(true);
    }

    for _ in 0..count {
        output::value(generator.try_next_id()?);
    }
    debug!("{}", generator);

    // The generator must still be alive here so the unreferenced cache
    // policy sees it during the flush.
    finish(&registry)?;
    drop(generator);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::temp_context;
    use super::*;

    #[test]
    fn advances_and_persists_default_sequence() {
        let (_temp, ctx) = temp_context();
        next(&ctx, None, 3, false).unwrap();

        let registry = ctx.open_registry().unwrap();
        assert_eq!(registry.default_generator().current_id(), 4);
    }

    #[test]
    fn no_persist_leaves_store_untouched() {
        let (_temp, ctx) = temp_context();
        next(&ctx, None, 3, true).unwrap();

        let registry = ctx.open_registry().unwrap();
        assert_eq!(registry.default_generator().current_id(), 1);
    }

    #[test]
    fn unknown_sequence_fails() {
        let (_temp, ctx) = temp_context();
        assert!(next(&ctx, Some(9), 1, false).is_err());
    }
}
