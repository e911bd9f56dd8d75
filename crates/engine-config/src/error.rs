use crate::job::JobKind;
use thiserror::Error;

/// Wrong positional arguments for a job. The job never starts.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{} expects {} argument(s), got {found}", .kind.command(), .kind.arity())]
pub struct UsageError {
    pub kind: JobKind,
    pub found: usize,
}

impl UsageError {
    pub fn new(kind: JobKind, found: usize) -> Self {
        UsageError { kind, found }
    }

    /// One-line usage of the command that was misused.
    pub fn usage(&self) -> String {
        self.kind.usage()
    }
}
