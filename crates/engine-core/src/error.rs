use crate::lifecycle::JobState;
use thiserror::Error;

/// A raw unit that cannot be turned into a `(key, value)` pair.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("Missing field '{0}'")]
    MissingField(String),

    #[error("Field '{field}' holds {found}, expected {expected}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        found: String,
    },

    #[error("Malformed line: expected at least {required} fields, found {found}")]
    MalformedLine { required: usize, found: usize },

    #[error("Empty key in field '{0}'")]
    EmptyKey(String),

    #[error("The {decoder} decoder cannot read a {found}")]
    UnexpectedUnit {
        decoder: &'static str,
        found: &'static str,
    },
}

/// Merging partial sums failed. Only reachable when regrouping is broken.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MergeError {
    #[error("Partial sum for key '{found}' routed to the group of key '{expected}'")]
    KeyMismatch { expected: String, found: String },

    #[error("No partial sums to merge")]
    EmptyGroup,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LifecycleError {
    #[error("Illegal job state transition {from} -> {to}")]
    IllegalTransition { from: JobState, to: JobState },
}
