//! Error types shared by every part of the engine.
//!
//! Failures inside getters, setters, reactions and actions are ordinary
//! `Err` values. They travel back to whoever triggered the work: the caller
//! of `observe`, of an action, or of the write whose flush ran the failing
//! reaction.

use thiserror::Error;

use crate::value::Key;

pub type Result<T> = std::result::Result<T, ReactiveError>;

#[derive(Debug, Error)]
pub enum ReactiveError {
    #[error("property `{key}` has a getter but no setter")]
    ReadOnly { key: Key },

    #[error("key `{key}` is not valid on a sequence")]
    InvalidSequenceKey { key: Key },

    #[error("invalid sequence length: {value}")]
    InvalidLength { value: String },

    #[error("value is not a sequence")]
    NotASequence,

    #[error("property `{key}` is not callable")]
    NotCallable { key: Key },

    #[error("reaction re-entered itself {limit} times")]
    RecursionLimit { limit: usize },

    #[error("{message}")]
    Failed { message: String },

    #[error(transparent)]
    External(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ReactiveError {
    /// Build a plain failure from a message. Intended for user code inside
    /// getters, reactions and actions.
    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn is_recursion_limit(&self) -> bool {
        matches!(self, Self::RecursionLimit { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_key() {
        let err = ReactiveError::ReadOnly {
            key: Key::from("fullName"),
        };
        assert_eq!(err.to_string(), "property `fullName` has a getter but no setter");

        let err = ReactiveError::InvalidSequenceKey { key: Key::from("name") };
        assert_eq!(err.to_string(), "key `name` is not valid on a sequence");
    }

    #[test]
    fn external_errors_are_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = ReactiveError::from(Box::new(io) as Box<dyn std::error::Error + Send + Sync>);
        assert_eq!(err.to_string(), "disk on fire");
    }

    #[test]
    fn failed_builds_message() {
        let err = ReactiveError::failed("nope");
        assert_eq!(err.to_string(), "nope");
        assert!(!err.is_recursion_limit());
        assert!(ReactiveError::RecursionLimit { limit: 3 }.is_recursion_limit());
    }
}
