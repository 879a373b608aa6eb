//! Bracket directive tokenizer.
//!
//! Commands are configured as a sequence of bracketed fields, optionally
//! mixed with free text that is ignored:
//!
//! ```text
//! block [iptables] [-I] [INPUT] [-s] [%h] [-j] [DROP]
//! ```
//!
//! Inside a field a backslash makes the next character literal, so
//! `[\[x\]]` yields the field `[x]`. Outside brackets a backslash
//! swallows the next character, which keeps `\[` in label text from
//! opening a field.

use crate::error::{Error, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const OPEN: char = '[';
const CLOSE: char = ']';
const ESCAPE: char = '\\';

/// Splits a raw directive string into its unescaped fields.
///
/// # Errors
///
/// Returns a syntax error ([`Error::is_syntax`]) on a nested `[`, an
/// unclosed bracket, or a trailing `\`. No fields are returned on error.
///
/// # Example
///
/// ```rust
/// use abl_config::split_command;
///
/// let fields = split_command("notify [mail] [-s] [blocked \\[%h\\]]").unwrap();
/// assert_eq!(fields, vec!["mail", "-s", "blocked [%h]"]);
/// ```
pub fn split_command(raw: &str) -> Result<Vec<String>> {
    let mut fields = Vec::new();
    scan(raw, |field| fields.push(std::mem::take(field)))?;
    Ok(fields)
}

/// Counts the fields [`split_command`] would return for `raw`.
///
/// # Errors
///
/// Fails on exactly the inputs [`split_command`] rejects.
pub fn count_fields(raw: &str) -> Result<usize> {
    let mut count = 0;
    scan(raw, |_| count += 1)?;
    Ok(count)
}

/// Single left-to-right pass over `raw`, handing each closed field to
/// `on_field`. The buffer is cleared after every call.
fn scan(raw: &str, mut on_field: impl FnMut(&mut String)) -> Result<()> {
    let mut chars = raw.char_indices();
    let mut field = String::new();
    // Offset of the currently open bracket, if any.
    let mut open_at: Option<usize> = None;

    while let Some((offset, c)) = chars.next() {
        match (c, open_at) {
            (ESCAPE, _) => {
                let (_, escaped) = chars.next().ok_or(Error::DanglingEscape { offset })?;
                if open_at.is_some() {
                    field.push(escaped);
                }
            }
            (OPEN, None) => open_at = Some(offset),
            (OPEN, Some(_)) => return Err(Error::NestedBracket { offset }),
            (CLOSE, Some(_)) => {
                on_field(&mut field);
                field.clear();
                open_at = None;
            }
            (_, Some(_)) => field.push(c),
            (_, None) => {}
        }
    }

    match open_at {
        Some(offset) => Err(Error::UnterminatedBracket { offset }),
        None => Ok(()),
    }
}

/// An ordered list of fields parsed from one directive string.
///
/// The first field is the program, the rest are its arguments. An empty
/// directive means no command is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Directive {
    fields: Vec<String>,
}

impl Directive {
    /// Parses a raw directive string.
    ///
    /// # Errors
    ///
    /// See [`split_command`].
    pub fn parse(raw: &str) -> Result<Self> {
        let fields = split_command(raw)?;
        debug!(fields = fields.len(), "parsed directive");
        Ok(Self { fields })
    }

    /// Builds a directive from already unescaped fields.
    #[must_use]
    pub const fn new(fields: Vec<String>) -> Self {
        Self { fields }
    }

    /// All fields in order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no command is configured.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The program to run.
    pub fn program(&self) -> Option<&str> {
        self.fields.first().map(String::as_str)
    }

    /// Arguments following the program.
    pub fn args(&self) -> &[String] {
        self.fields.get(1..).unwrap_or_default()
    }

    /// Consumes the directive, returning its fields.
    pub fn into_fields(self) -> Vec<String> {
        self.fields
    }

    /// Returns the fields with `%u`, `%h` and `%s` replaced.
    ///
    /// `%%` produces a single `%`. Any other `%` sequence is kept as is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSubstitution`] if a field uses a
    /// placeholder whose value is not set in `subs`.
    pub fn expand(&self, subs: &Substitutions<'_>) -> Result<Vec<String>> {
        self.fields
            .iter()
            .map(|field| expand_field(field, subs))
            .collect()
    }
}

impl FromStr for Directive {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Writes the directive back in bracket form, escaping as needed.
impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, field) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{OPEN}")?;
            for c in field.chars() {
                if matches!(c, OPEN | CLOSE | ESCAPE) {
                    write!(f, "{ESCAPE}")?;
                }
                write!(f, "{c}")?;
            }
            write!(f, "{CLOSE}")?;
        }
        Ok(())
    }
}

/// Values substituted into directive placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Substitutions<'a> {
    /// Value for `%u`.
    pub user: Option<&'a str>,
    /// Value for `%h`.
    pub host: Option<&'a str>,
    /// Value for `%s`.
    pub service: Option<&'a str>,
}

impl<'a> Substitutions<'a> {
    /// Sets the user name.
    #[must_use]
    pub const fn with_user(mut self, user: &'a str) -> Self {
        self.user = Some(user);
        self
    }

    /// Sets the host name.
    #[must_use]
    pub const fn with_host(mut self, host: &'a str) -> Self {
        self.host = Some(host);
        self
    }

    /// Sets the service name.
    #[must_use]
    pub const fn with_service(mut self, service: &'a str) -> Self {
        self.service = Some(service);
        self
    }

    const fn lookup(&self, placeholder: char) -> Option<&'a str> {
        match placeholder {
            'u' => self.user,
            'h' => self.host,
            's' => self.service,
            _ => None,
        }
    }
}

fn expand_field(field: &str, subs: &Substitutions<'_>) -> Result<String> {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(placeholder @ ('u' | 'h' | 's')) => {
                chars.next();
                let value = subs
                    .lookup(placeholder)
                    .ok_or(Error::MissingSubstitution { placeholder })?;
                out.push_str(value);
            }
            _ => out.push('%'),
        }
    }

    Ok(out)
}
