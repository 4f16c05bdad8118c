//! Error types for key parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating keys.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The key string is empty.
    #[error("{kind} cannot be empty")]
    Empty { kind: &'static str },

    /// The key has leading or trailing whitespace.
    #[error("{kind} must not start or end with whitespace")]
    Whitespace { kind: &'static str },

    /// The key contains a control character.
    #[error("{kind} must not contain control characters")]
    ControlCharacter { kind: &'static str },

    /// The key exceeds the maximum length.
    #[error("{kind} is {len} bytes long, maximum is {max}")]
    TooLong {
        kind: &'static str,
        len: usize,
        max: usize,
    },

    /// A generated id has the wrong prefix.
    #[error("invalid ID prefix: expected '{expected}', got '{actual}'")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    /// A generated id is missing the underscore separator.
    #[error("ID missing underscore separator")]
    MissingSeparator,

    /// The ULID portion of a generated id is invalid.
    #[error("invalid ULID: {0}")]
    InvalidUlid(String),
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty { .. })
    }
}
