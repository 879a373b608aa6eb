//! Args command implementation.

use super::print_json;
use abl_config::{parse_module_args, FsResolver};
use anyhow::{Context, Result};
use tracing::info;

/// Runs the args command.
pub fn run(tokens: &[String], base: Option<&str>) -> Result<()> {
    let resolver = base.map_or_else(FsResolver::new, FsResolver::with_base);

    let args = parse_module_args(tokens, &resolver)
        .with_context(|| "Failed to parse module options")?;

    info!("Module actions: {}", args.actions);
    if args.actions.is_empty() {
        info!("No check_* or log_* option given; the module will do nothing");
    }

    print_json(&args)
}
