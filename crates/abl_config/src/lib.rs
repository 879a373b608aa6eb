//! Configuration parsing for the abl blacklisting PAM module.
//!
//! This crate provides:
//! - A bracket directive tokenizer for configured commands
//! - Module option parsing into an action bitmask
//! - Config file parsing into a typed model
//!
//! The tokenizer and option parser are pure. File access is confined to
//! [`FsResolver`] and [`load_config`].
//!
//! # Example
//!
//! ```rust,ignore
//! use abl_config::{parse_module_args, split_command, FsResolver};
//!
//! let args = parse_module_args(&["check_both", "config=/etc/security/pam_abl.conf"], &FsResolver::new())?;
//! let cmd = split_command("[iptables] [-I] [INPUT] [-s] [%h] [-j] [DROP]")?;
//! assert_eq!(cmd[0], "iptables");
//! ```

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod command;
pub mod config;
pub mod error;
pub mod module_args;
pub mod resolver;

pub use command::{count_fields, split_command, Directive, Substitutions};
pub use config::{parse_config, parse_duration, AblConfig, Limits, SubjectConfig};
pub use error::{Error, Result};
pub use module_args::{parse_module_args, ConfigResolver, Keyword, ModuleAction, ModuleArgs, NoConfig};
pub use resolver::{load_config, FsResolver};
