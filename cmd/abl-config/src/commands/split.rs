//! Split command implementation.

use super::print_json;
use abl_config::{Directive, Substitutions};
use anyhow::{Context, Result};
use tracing::info;

/// Runs the split command.
pub fn run(
    raw: &str,
    user: Option<&str>,
    host: Option<&str>,
    service: Option<&str>,
) -> Result<()> {
    let directive = Directive::parse(raw).with_context(|| format!("Failed to parse directive: {raw}"))?;

    info!("Parsed directive with {} fields", directive.len());

    if user.is_none() && host.is_none() && service.is_none() {
        return print_json(&directive);
    }

    let subs = Substitutions {
        user,
        host,
        service,
    };
    let expanded = directive
        .expand(&subs)
        .with_context(|| "Failed to expand placeholders")?;

    print_json(&expanded)
}
