use crate::error::UsageError;
use serde::Serialize;
use std::{fmt, path::PathBuf};

/// The two aggregation jobs: over database shards or over text files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobKind {
    Db,
    Hdfs,
}

impl JobKind {
    pub fn command(&self) -> &'static str {
        match self {
            JobKind::Db => "aggregate-db",
            JobKind::Hdfs => "aggregate-hdfs",
        }
    }

    fn positional(&self) -> &'static [&'static str] {
        match self {
            JobKind::Db => &["<output_dir>"],
            JobKind::Hdfs => &["<input_dir>", "<output_dir>"],
        }
    }

    /// Number of positional arguments the job takes.
    pub fn arity(&self) -> usize {
        self.positional().len()
    }

    pub fn usage(&self) -> String {
        format!("Usage: tally {} {}", self.command(), self.positional().join(" "))
    }

    /// Whether partitions arrive already summed per key.
    pub fn pre_aggregated(&self) -> bool {
        matches!(self, JobKind::Db)
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

/// Where a job reads from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobInput {
    /// The configured database shards.
    Shards,
    /// A text file or a directory of text files.
    Path(PathBuf),
}

/// A job with its validated positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub kind: JobKind,
    pub input: JobInput,
    pub output: PathBuf,
}

impl JobSpec {
    pub fn from_args<S: AsRef<str>>(kind: JobKind, args: &[S]) -> Result<Self, UsageError> {
        if args.len() != kind.arity() || args.iter().any(|a| a.as_ref().is_empty()) {
            return Err(UsageError::new(kind, args.len()));
        }

        let spec = match kind {
            JobKind::Db => JobSpec {
                kind,
                input: JobInput::Shards,
                output: PathBuf::from(args[0].as_ref()),
            },
            JobKind::Hdfs => JobSpec {
                kind,
                input: JobInput::Path(PathBuf::from(args[0].as_ref())),
                output: PathBuf::from(args[1].as_ref()),
            },
        };
        Ok(spec)
    }
}
