//! abl-config CLI - validate abl configuration.
//!
//! Commands:
//! - `abl-config split` - Split a command directive into fields
//! - `abl-config args` - Parse PAM module options
//! - `abl-config check` - Parse a config file

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "abl-config")]
#[command(about = "Validate abl module options, command directives and config files")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a bracketed command directive into its fields
    Split {
        /// Raw directive, e.g. "[iptables] [-I] [INPUT] [-s] [%h]"
        raw: String,

        /// Expand %u with this user name
        #[arg(long)]
        user: Option<String>,

        /// Expand %h with this host
        #[arg(long)]
        host: Option<String>,

        /// Expand %s with this service name
        #[arg(long)]
        service: Option<String>,
    },

    /// Parse PAM module options
    Args {
        /// Module options, e.g. check_both log_host config=/etc/security/pam_abl.conf
        tokens: Vec<String>,

        /// Directory that relative config= paths are resolved against
        #[arg(long)]
        base: Option<String>,
    },

    /// Parse a config file
    Check {
        /// Path to the config file
        #[arg(default_value = "/etc/security/pam_abl.conf")]
        path: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for JSON output
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Split {
            raw,
            user,
            host,
            service,
        } => commands::split::run(&raw, user.as_deref(), host.as_deref(), service.as_deref()),
        Commands::Args { tokens, base } => commands::args::run(&tokens, base.as_deref()),
        Commands::Check { path } => commands::check::run(&path),
    }
}
