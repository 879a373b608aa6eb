//! Config file parsing and typed model.
//!
//! ```text
//! # /etc/security/pam_abl.conf
//! debug
//! db_home = /var/lib/abl
//! host_purge = 2d
//! host_rule = *:10/1h,30/1d
//! host_whitelist = 10.0.0.0/8;192.168.1.1
//! host_blk_cmd = [iptables] [-I] [INPUT] [-s] [%h] [-j] [DROP]
//! user_rule = !root:5/1h
//! limits = 1000-1200
//! ```
//!
//! A line ending in `\` continues on the next line. Rules are kept as
//! text; evaluating them is up to the blacklist engine.

use crate::command::Directive;
use crate::error::{Error, Result};
use serde::Serialize;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, trace};

/// Parsed abl configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AblConfig {
    /// Debug output requested by the config file.
    pub debug: bool,
    /// Directory holding the blacklist databases.
    pub db_home: Option<String>,
    /// Storage backend module.
    pub db_module: Option<String>,
    /// Lower and upper bounds on stored attempts.
    pub limits: Option<Limits>,
    /// Settings applied to remote hosts.
    pub host: SubjectConfig,
    /// Settings applied to user names.
    pub user: SubjectConfig,
}

/// Settings for one kind of blacklisted subject (host or user).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubjectConfig {
    /// Database name.
    pub db: Option<String>,
    /// How long attempts are remembered.
    pub purge: Option<Duration>,
    /// Blocking rule, unparsed.
    pub rule: Option<String>,
    /// Subjects that are never blocked.
    pub whitelist: Vec<String>,
    /// Command run when a subject gets blocked.
    pub block_cmd: Directive,
    /// Command run when a subject gets cleared.
    pub clear_cmd: Directive,
}

/// Bounds on the number of attempts kept per subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Limits {
    /// Attempts kept after pruning.
    pub lower: u32,
    /// Attempts that trigger pruning.
    pub upper: u32,
}

impl FromStr for Limits {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (lower, upper) = s
            .split_once('-')
            .ok_or_else(|| Error::invalid_value(s, "expected '<lower>-<upper>'"))?;
        let lower: u32 = lower
            .trim()
            .parse()
            .map_err(|_| Error::invalid_value(s, "invalid lower limit"))?;
        let upper: u32 = upper
            .trim()
            .parse()
            .map_err(|_| Error::invalid_value(s, "invalid upper limit"))?;
        if lower > upper {
            return Err(Error::invalid_value(
                s,
                format!("lower limit {lower} exceeds upper limit {upper}"),
            ));
        }
        Ok(Self { lower, upper })
    }
}

impl FromStr for AblConfig {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        parse_config(s)
    }
}

/// Parses config file text into an [`AblConfig`].
///
/// # Errors
///
/// Returns [`Error::Config`] with the line number of the offending entry
/// for unknown keys, entries without `=`, and invalid values (including
/// malformed command directives).
///
/// # Example
///
/// ```rust
/// use abl_config::parse_config;
///
/// let config = parse_config("host_purge = 1h\nhost_blk_cmd = [block] [%h]\n").unwrap();
/// assert_eq!(config.host.purge.unwrap().as_secs(), 3600);
/// assert_eq!(config.host.block_cmd.program(), Some("block"));
/// ```
pub fn parse_config(text: &str) -> Result<AblConfig> {
    let mut config = AblConfig::default();

    for (line_num, entry) in logical_lines(text) {
        let entry = entry.trim();
        if entry.is_empty() || entry.starts_with('#') {
            continue;
        }
        if entry == "debug" {
            config.debug = true;
            continue;
        }

        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| Error::config(line_num, format!("expected 'key = value', found '{entry}'")))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::config(line_num, "missing key before '='"));
        }
        trace!(line = line_num, key, "config entry");
        apply(&mut config, key, value.trim()).map_err(|reason| Error::config(line_num, reason))?;
    }

    debug!(
        host_cmd = !config.host.block_cmd.is_empty(),
        user_cmd = !config.user.block_cmd.is_empty(),
        "parsed config"
    );
    Ok(config)
}

fn apply(config: &mut AblConfig, key: &str, value: &str) -> std::result::Result<(), String> {
    match key {
        "db_home" => config.db_home = Some(value.to_string()),
        "db_module" => config.db_module = Some(value.to_string()),
        "limits" => config.limits = Some(value.parse().map_err(|e: Error| e.to_string())?),
        _ => {
            let (subject, field) = if let Some(field) = key.strip_prefix("host_") {
                (&mut config.host, field)
            } else if let Some(field) = key.strip_prefix("user_") {
                (&mut config.user, field)
            } else {
                return Err(format!("unknown key: {key}"));
            };
            apply_subject(subject, field, value).map_err(|reason| {
                if reason.is_empty() {
                    format!("unknown key: {key}")
                } else {
                    format!("{key}: {reason}")
                }
            })?;
        }
    }
    Ok(())
}

/// Sets one `host_*`/`user_*` field. An empty error means the field name
/// is unknown.
fn apply_subject(
    subject: &mut SubjectConfig,
    field: &str,
    value: &str,
) -> std::result::Result<(), String> {
    match field {
        "db" => subject.db = Some(value.to_string()),
        "purge" => subject.purge = Some(parse_duration(value).map_err(|e| e.to_string())?),
        "rule" => subject.rule = Some(value.to_string()),
        "whitelist" => {
            subject.whitelist = value
                .split(';')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        "blk_cmd" => subject.block_cmd = Directive::parse(value).map_err(|e| e.to_string())?,
        "clr_cmd" => subject.clear_cmd = Directive::parse(value).map_err(|e| e.to_string())?,
        _ => return Err(String::new()),
    }
    Ok(())
}

/// Parses a duration like `30`, `15m`, `2d` or `1w`. No unit means seconds.
///
/// # Errors
///
/// Returns [`Error::InvalidValue`] if the number or unit is invalid or
/// the duration overflows.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();
    let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    let (num, unit) = s.split_at(split);

    let num: u64 = num
        .parse()
        .map_err(|_| Error::invalid_value(s, "expected a number of seconds or <n>[smhdw]"))?;

    let multiplier = match unit.trim() {
        "" | "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86_400,
        "w" => 604_800,
        other => {
            return Err(Error::invalid_value(
                s,
                format!("unknown duration unit '{other}'"),
            ))
        }
    };

    num.checked_mul(multiplier)
        .map(Duration::from_secs)
        .ok_or_else(|| Error::invalid_value(s, "duration too large"))
}

/// Joins continuation lines, yielding each logical line with the number
/// of its first physical line. A comment never continues.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines = Vec::new();
    let mut pending: Option<(usize, String)> = None;

    for (i, line) in text.lines().enumerate() {
        if pending.is_none() && line.trim_start().starts_with('#') {
            lines.push((i + 1, line.to_string()));
            continue;
        }
        let (start, mut buf) = pending.take().unwrap_or_else(|| (i + 1, String::new()));
        if let Some(head) = continued(line) {
            buf.push_str(head);
            pending = Some((start, buf));
        } else {
            buf.push_str(line);
            lines.push((start, buf));
        }
    }

    if let Some(last) = pending {
        lines.push(last);
    }
    lines
}

/// Returns the line without its trailing `\` if it ends in an odd number
/// of backslashes.
fn continued(line: &str) -> Option<&str> {
    let trimmed = line.trim_end();
    let trailing = trimmed.len() - trimmed.trim_end_matches('\\').len();
    (trailing % 2 == 1).then(|| &trimmed[..trimmed.len() - 1])
}
