//! current command - Show a sequence's value without advancing it

use super::{finish, resolve, Context};
use crate::ui::output;
use anyhow::Result;

/// Print the current value of a sequence.
pub fn current(ctx: &Context, id: Option<i64>) -> Result<()> {
    let registry = ctx.open_registry()?;
    let generator = resolve(&registry, id)?;
    output::value(generator.current_id());
    finish(&registry)
}

#[cfg(test)]
mod tests {
    use super::super::test_support::temp_context;
    use super::*;

    #[test]
    fn current_does_not_advance() {
        let (_temp, ctx) = temp_context();
        current(&ctx, None).unwrap();
        current(&ctx, None).unwrap();

        let registry = ctx.open_registry().unwrap();
        assert_eq!(registry.default_generator().current_id(), 1);
    }

    #[test]
    fn negative_id_rejected() {
        let (_temp, ctx) = temp_context();
        let err = current(&ctx, Some(-5)).unwrap_err();
        assert!(format!("{:#}", err).contains("-5"));
    }
}
