//! Error types for directive, module option and config file parsing.

use thiserror::Error;

/// Errors that can occur while parsing abl configuration.
#[derive(Debug, Error)]
pub enum Error {
    /// A `[` was found while already inside a bracket.
    #[error("nested '[' at offset {offset}")]
    NestedBracket {
        /// Byte offset of the nested bracket.
        offset: usize,
    },

    /// Input ended before a bracket was closed.
    #[error("unterminated '[' opened at offset {offset}")]
    UnterminatedBracket {
        /// Byte offset of the bracket that was never closed.
        offset: usize,
    },

    /// Input ended directly after an escape character.
    #[error("dangling escape at offset {offset}")]
    DanglingEscape {
        /// Byte offset of the trailing backslash.
        offset: usize,
    },

    /// Module option is not part of the keyword vocabulary.
    #[error("unknown module option '{0}'")]
    UnknownOption(String),

    /// The resource named by `config=` could not be used.
    #[error("cannot use config file '{path}': {reason}")]
    Resource {
        /// Path given to `config=`.
        path: String,
        /// Why resolution failed.
        reason: String,
    },

    /// Malformed config file content.
    #[error("config error at line {line}: {reason}")]
    Config {
        /// Line number where the offending entry starts.
        line: usize,
        /// Reason for the failure.
        reason: String,
    },

    /// A setting value could not be parsed.
    #[error("invalid value '{value}': {reason}")]
    InvalidValue {
        /// The offending value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A command placeholder has no value to substitute.
    #[error("no value for placeholder '%{placeholder}'")]
    MissingSubstitution {
        /// The placeholder character (`u`, `h` or `s`).
        placeholder: char,
    },

    /// I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Creates a config error for the given line.
    pub fn config(line: usize, reason: impl Into<String>) -> Self {
        Self::Config {
            line,
            reason: reason.into(),
        }
    }

    /// Creates an invalid value error.
    pub fn invalid_value(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for malformed directive syntax.
    pub const fn is_syntax(&self) -> bool {
        matches!(
            self,
            Self::NestedBracket { .. } | Self::UnterminatedBracket { .. } | Self::DanglingEscape { .. }
        )
    }
}

/// Result type alias for abl configuration operations.
pub type Result<T> = std::result::Result<T, Error>;
