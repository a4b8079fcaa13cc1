//! config command - Show the effective configuration

use super::Context;
use crate::core::config::Config;
use crate::sequence::{CachePolicy, OverflowPolicy};
use crate::ui::output;
use anyhow::{Context as _, Result};
use serde_json::{json, Value};

/// Effective settings after defaults and CLI overrides, as JSON.
fn effective(ctx: &Context) -> Result<Value> {
    let (policy, capacity) = match ctx.config.cache_policy() {
        CachePolicy::Lru { capacity } => ("lru", Some(capacity.get())),
        CachePolicy::Unreferenced => ("unreferenced", None),
    };
    let overflow = match ctx.config.overflow_policy() {
        OverflowPolicy::Wrap => "wrap",
        OverflowPolicy::Fail => "fail",
    };

    Ok(json!({
        "config_file": ctx.config.loaded_from().map(|p| p.display().to_string()),
        "store": {
            "provider": ctx.config.store_provider(),
            "namespace": ctx.namespace(),
            "path": ctx.store_dir()?.display().to_string(),
        },
        "cache": {
            "policy": policy,
            "capacity": capacity,
        },
        "ids": {
            "overflow": overflow,
        },
    }))
}

/// Print the effective configuration.
pub fn show(ctx: &Context, as_json: bool) -> Result<()> {
    let settings = effective(ctx)?;

    if as_json {
        output::value(serde_json::to_string_pretty(&settings)?);
        return Ok(());
    }

    let text = |v: &Value| match v {
        Value::String(s) => s.clone(),
        Value::Null => "(none)".to_string(),
        other => other.to_string(),
    };
    output::value(format!("config_file     = {}", text(&settings["config_file"])));
    for section in ["store", "cache", "ids"] {
        if let Value::Object(fields) = &settings[section] {
            for (key, v) in fields {
                output::value(format!("{:<15} = {}", format!("{}.{}", section, key), text(v)));
            }
        }
    }
    Ok(())
}

/// Print the config file in use, or the canonical location if none was found.
pub fn path(ctx: &Context) -> Result<()> {
    let path = match ctx.config.loaded_from() {
        Some(path) => path.to_path_buf(),
        None => Config::config_path().context("Cannot determine config path")?,
    };
    output::value(path.display());
    Ok(())
}
