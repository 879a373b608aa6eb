//! Check command implementation.

use super::print_json;
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Runs the check command.
pub fn run(path: &str) -> Result<()> {
    info!("Checking config file: {path}");

    let config = abl_config::load_config(path)
        .with_context(|| format!("Failed to load config file: {path}"))?;

    for (name, subject) in [("host", &config.host), ("user", &config.user)] {
        if subject.rule.is_none() {
            warn!("No {name}_rule set; {name}s will never be blocked");
        }
        if !subject.clear_cmd.is_empty() && subject.block_cmd.is_empty() {
            warn!("{name}_clr_cmd is set without {name}_blk_cmd");
        }
    }

    print_json(&config)
}
