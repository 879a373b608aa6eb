//! Module option parsing.
//!
//! The PAM module receives options such as:
//!
//! ```text
//! auth required pam_abl.so check_both log_host debug config=/etc/security/pam_abl.conf
//! ```
//!
//! Each keyword adds bits to a [`ModuleAction`] mask; `config=` is handed
//! to a [`ConfigResolver`] supplied by the caller.

use crate::config::AblConfig;
use crate::error::{Error, Result};
use bitflags::bitflags;
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Prefix of the option naming the config file.
pub const CONFIG_PREFIX: &str = "config=";

bitflags! {
    /// Set of actions a module invocation should perform.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    #[serde(transparent)]
    pub struct ModuleAction: u8 {
        /// Check the user against the blacklist.
        const CHECK_USER = 1;
        /// Check the host against the blacklist.
        const CHECK_HOST = 1 << 1;
        /// Log failed attempts for the user.
        const LOG_USER = 1 << 2;
        /// Log failed attempts for the host.
        const LOG_HOST = 1 << 3;
        /// Check both user and host.
        const CHECK_BOTH = Self::CHECK_USER.bits() | Self::CHECK_HOST.bits();
        /// Log both user and host.
        const LOG_BOTH = Self::LOG_USER.bits() | Self::LOG_HOST.bits();
    }
}

impl ModuleAction {
    /// No action.
    pub const NONE: Self = Self::empty();

    /// Keyword names of the set flags, in bit order. Combined flags are
    /// reported through their parts.
    pub fn names(self) -> Vec<String> {
        self.iter_names()
            .map(|(name, _)| name.to_ascii_lowercase())
            .collect()
    }
}

impl Default for ModuleAction {
    fn default() -> Self {
        Self::NONE
    }
}

impl fmt::Display for ModuleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("none");
        }
        f.write_str(&self.names().join("|"))
    }
}

/// Effect of a recognized keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// Adds the given bits to the action mask.
    Action(ModuleAction),
    /// Enables debug output.
    Debug,
}

static KEYWORDS: &[(&str, Keyword)] = &[
    ("check_user", Keyword::Action(ModuleAction::CHECK_USER)),
    ("check_host", Keyword::Action(ModuleAction::CHECK_HOST)),
    ("check_both", Keyword::Action(ModuleAction::CHECK_BOTH)),
    ("log_user", Keyword::Action(ModuleAction::LOG_USER)),
    ("log_host", Keyword::Action(ModuleAction::LOG_HOST)),
    ("log_both", Keyword::Action(ModuleAction::LOG_BOTH)),
    ("debug", Keyword::Debug),
];

impl Keyword {
    /// Looks up a token in the keyword table. Matching is exact and
    /// case-sensitive.
    pub fn resolve(token: &str) -> Option<Self> {
        KEYWORDS
            .iter()
            .find(|(name, _)| *name == token)
            .map(|(_, keyword)| *keyword)
    }
}

/// Turns the path given to `config=` into a loaded configuration.
pub trait ConfigResolver {
    /// Loads the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Any error; the parser reports it as [`Error::Resource`].
    fn resolve(&self, path: &str) -> Result<AblConfig>;
}

impl<F> ConfigResolver for F
where
    F: Fn(&str) -> Result<AblConfig>,
{
    fn resolve(&self, path: &str) -> Result<AblConfig> {
        self(path)
    }
}

/// Resolver for callers without file access. Every `config=` fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConfig;

impl ConfigResolver for NoConfig {
    fn resolve(&self, path: &str) -> Result<AblConfig> {
        Err(Error::Resource {
            path: path.to_string(),
            reason: "config files are not available".to_string(),
        })
    }
}

/// Result of parsing the module options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleArgs {
    /// Requested actions.
    pub actions: ModuleAction,
    /// Whether `debug` was given.
    pub debug: bool,
    /// Configuration loaded through `config=`, last one wins.
    pub config: Option<AblConfig>,
}

/// Parses module option tokens.
///
/// # Errors
///
/// Returns [`Error::UnknownOption`] for a token outside the keyword
/// vocabulary and [`Error::Resource`] if `resolver` fails for a
/// `config=` path. Parsing stops at the first failing token.
///
/// # Example
///
/// ```rust
/// use abl_config::{parse_module_args, ModuleAction, NoConfig};
///
/// let args = parse_module_args(&["check_user", "log_host", "debug"], &NoConfig).unwrap();
/// assert_eq!(args.actions, ModuleAction::CHECK_USER | ModuleAction::LOG_HOST);
/// assert!(args.debug);
/// ```
pub fn parse_module_args<S, R>(tokens: &[S], resolver: &R) -> Result<ModuleArgs>
where
    S: AsRef<str>,
    R: ConfigResolver + ?Sized,
{
    let mut args = ModuleArgs::default();

    for token in tokens {
        let token = token.as_ref();
        if let Some(keyword) = Keyword::resolve(token) {
            match keyword {
                Keyword::Action(bits) => args.actions |= bits,
                Keyword::Debug => args.debug = true,
            }
        } else if let Some(path) = token.strip_prefix(CONFIG_PREFIX) {
            debug!(path, "resolving module config");
            let config = resolver.resolve(path).map_err(|e| match e {
                Error::Resource { .. } => e,
                other => Error::Resource {
                    path: path.to_string(),
                    reason: other.to_string(),
                },
            })?;
            args.config = Some(config);
        } else {
            return Err(Error::UnknownOption(token.to_string()));
        }
    }

    debug!(actions = %args.actions, debug_enabled = args.debug, "parsed module args");
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const ACTION_KEYWORDS: [(&str, ModuleAction); 6] = [
        ("check_user", ModuleAction::CHECK_USER),
        ("check_host", ModuleAction::CHECK_HOST),
        ("check_both", ModuleAction::CHECK_BOTH),
        ("log_user", ModuleAction::LOG_USER),
        ("log_host", ModuleAction::LOG_HOST),
        ("log_both", ModuleAction::LOG_BOTH),
    ];

    #[test]
    fn every_keyword_combination() {
        for mask in 0u32..128 {
            let mut tokens = Vec::new();
            let mut expected = ModuleAction::NONE;
            for (i, (name, bits)) in ACTION_KEYWORDS.iter().enumerate() {
                if mask & (1 << i) != 0 {
                    tokens.push(*name);
                    expected |= *bits;
                }
            }
            let debug = mask & (1 << 6) != 0;
            if debug {
                tokens.push("debug");
            }

            let args = parse_module_args(&tokens, &NoConfig).unwrap();
            assert_eq!(args.actions, expected, "tokens {tokens:?}");
            assert_eq!(args.debug, debug, "tokens {tokens:?}");
            assert!(args.config.is_none());
        }
    }

    #[test]
    fn check_user_log_host_debug() {
        let args = parse_module_args(&["check_user", "log_host", "debug"], &NoConfig).unwrap();
        assert_eq!(args.actions, ModuleAction::CHECK_USER | ModuleAction::LOG_HOST);
        assert!(args.debug);
    }

    #[test]
    fn empty_tokens() {
        let tokens: [&str; 0] = [];
        let args = parse_module_args(&tokens, &NoConfig).unwrap();
        assert_eq!(args.actions, ModuleAction::NONE);
        assert!(!args.debug);
    }

    #[test]
    fn repeated_keywords_are_idempotent() {
        let once = parse_module_args(&["log_both"], &NoConfig).unwrap();
        let twice = parse_module_args(&["log_both", "log_user", "log_both"], &NoConfig).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn unknown_option_fails() {
        let tokens = ["debug", "log_both", "NON_EXISTING_OPTION", "log_both"];
        let err = parse_module_args(&tokens, &NoConfig).unwrap_err();
        assert!(matches!(&err, Error::UnknownOption(t) if t == "NON_EXISTING_OPTION"));
        insta::assert_snapshot!(err.to_string(), @"unknown module option 'NON_EXISTING_OPTION'");
    }

    #[test]
    fn keywords_are_case_sensitive() {
        assert!(Keyword::resolve("Debug").is_none());
        assert!(Keyword::resolve("check_user ").is_none());
        assert!(parse_module_args(&["CHECK_USER"], &NoConfig).is_err());
        assert!(parse_module_args(&["config"], &NoConfig).is_err());
    }

    #[test]
    fn config_failure_is_resource_error() {
        let tokens = ["debug", "log_both", "config=/nowhere/abl.conf", "log_both"];
        let err = parse_module_args(&tokens, &NoConfig).unwrap_err();
        assert!(matches!(&err, Error::Resource { path, .. } if path == "/nowhere/abl.conf"));
    }

    #[test]
    fn resolver_errors_are_wrapped() {
        let resolver = |_: &str| -> Result<AblConfig> { Err(Error::config(3, "bad key")) };
        let err = parse_module_args(&["config=/etc/abl.conf"], &resolver).unwrap_err();
        insta::assert_snapshot!(
            err.to_string(),
            @"cannot use config file '/etc/abl.conf': config error at line 3: bad key"
        );
    }

    #[test]
    fn last_config_wins() {
        let seen = RefCell::new(Vec::new());
        let resolver = |path: &str| -> Result<AblConfig> {
            seen.borrow_mut().push(path.to_string());
            Ok(AblConfig {
                db_home: Some(path.to_string()),
                ..AblConfig::default()
            })
        };

        let args = parse_module_args(&["config=/a", "check_host", "config=/b"], &resolver).unwrap();
        assert_eq!(*seen.borrow(), vec!["/a", "/b"]);
        assert_eq!(args.config.unwrap().db_home.as_deref(), Some("/b"));
        assert_eq!(args.actions, ModuleAction::CHECK_HOST);
    }

    #[test]
    fn both_flags_combine_parts() {
        assert_eq!(
            ModuleAction::CHECK_BOTH,
            ModuleAction::CHECK_USER | ModuleAction::CHECK_HOST
        );
        assert_eq!(ModuleAction::LOG_BOTH, ModuleAction::LOG_USER | ModuleAction::LOG_HOST);
        assert_eq!(
            Keyword::resolve("check_both"),
            Some(Keyword::Action(ModuleAction::CHECK_BOTH))
        );
    }

    #[test]
    fn action_display_and_serialize() {
        let actions = ModuleAction::CHECK_HOST | ModuleAction::LOG_USER;
        assert_eq!(actions.to_string(), "check_host|log_user");
        assert_eq!(ModuleAction::NONE.to_string(), "none");
        assert_eq!(ModuleAction::LOG_BOTH.names(), vec!["log_user", "log_host"]);
        assert_eq!(
            serde_json::to_string(&actions).unwrap(),
            r#""CHECK_HOST | LOG_USER""#
        );
    }

    #[test]
    fn module_args_serialize() {
        let args = parse_module_args(&["check_user", "debug"], &NoConfig).unwrap();
        insta::assert_snapshot!(
            serde_json::to_string(&args).unwrap(),
            @r#"{"actions":"CHECK_USER","debug":true,"config":null}"#
        );
    }

    #[test]
    fn accepts_owned_tokens() {
        let tokens = vec![String::from("check_both"), String::from("log_both")];
        let args = parse_module_args(&tokens, &NoConfig).unwrap();
        assert_eq!(args.actions.bits(), 0b1111);
    }
}
