//! CLI subcommands.

pub mod args;
pub mod check;
pub mod split;

use anyhow::{Context, Result};
use serde::Serialize;

/// Writes `value` to stdout as pretty JSON.
fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{json}");
    Ok(())
}
