use crate::error::LifecycleError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Stages a job moves through, in order. `Failed` is reachable from every
/// stage except `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum JobState {
    Configured,
    PartitionsDiscovered,
    LocalAggregationRunning,
    Regrouped,
    MergeRunning,
    Written,
    Done,
    Failed,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Configured => "configured",
            JobState::PartitionsDiscovered => "partitions_discovered",
            JobState::LocalAggregationRunning => "local_aggregation_running",
            JobState::Regrouped => "regrouped",
            JobState::MergeRunning => "merge_running",
            JobState::Written => "written",
            JobState::Done => "done",
            JobState::Failed => "failed",
        }
    }

    fn next(&self) -> Option<JobState> {
        match self {
            JobState::Configured => Some(JobState::PartitionsDiscovered),
            JobState::PartitionsDiscovered => Some(JobState::LocalAggregationRunning),
            JobState::LocalAggregationRunning => Some(JobState::Regrouped),
            JobState::Regrouped => Some(JobState::MergeRunning),
            JobState::MergeRunning => Some(JobState::Written),
            JobState::Written => Some(JobState::Done),
            JobState::Done | JobState::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Done | JobState::Failed)
    }

    pub fn can_transition_to(&self, to: JobState) -> bool {
        match to {
            JobState::Failed => !self.is_terminal(),
            to => self.next() == Some(to),
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StateChange {
    pub state: JobState,
    pub at: DateTime<Utc>,
}

/// Current state of a job plus every state it has visited.
#[derive(Debug, Clone)]
pub struct JobLifecycle {
    current: JobState,
    history: Vec<StateChange>,
}

impl Default for JobLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl JobLifecycle {
    pub fn new() -> Self {
        JobLifecycle {
            current: JobState::Configured,
            history: vec![StateChange {
                state: JobState::Configured,
                at: Utc::now(),
            }],
        }
    }

    pub fn current(&self) -> JobState {
        self.current
    }

    pub fn history(&self) -> &[StateChange] {
        &self.history
    }

    pub fn advance(&mut self, to: JobState) -> Result<(), LifecycleError> {
        if !self.current.can_transition_to(to) {
            return Err(LifecycleError::IllegalTransition {
                from: self.current,
                to,
            });
        }
        self.current = to;
        self.history.push(StateChange {
            state: to,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Move to `Failed` unless the job already finished.
    pub fn fail(&mut self) {
        if !self.current.is_terminal() {
            self.current = JobState::Failed;
            self.history.push(StateChange {
                state: JobState::Failed,
                at: Utc::now(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HAPPY_PATH: [JobState; 6] = [
        JobState::PartitionsDiscovered,
        JobState::LocalAggregationRunning,
        JobState::Regrouped,
        JobState::MergeRunning,
        JobState::Written,
        JobState::Done,
    ];

    #[test]
    fn walks_the_happy_path() {
        let mut lifecycle = JobLifecycle::new();
        for state in HAPPY_PATH {
            lifecycle.advance(state).unwrap();
        }
        assert_eq!(lifecycle.current(), JobState::Done);
        assert_eq!(lifecycle.history().len(), 7);
    }

    #[test]
    fn rejects_skipping_a_stage() {
        let mut lifecycle = JobLifecycle::new();
        assert_eq!(
            lifecycle.advance(JobState::MergeRunning),
            Err(LifecycleError::IllegalTransition {
                from: JobState::Configured,
                to: JobState::MergeRunning
            })
        );
        assert_eq!(lifecycle.current(), JobState::Configured);
    }

    #[test]
    fn failed_is_reachable_until_done() {
        let mut lifecycle = JobLifecycle::new();
        lifecycle.advance(JobState::PartitionsDiscovered).unwrap();
        lifecycle.advance(JobState::Failed).unwrap();
        assert!(lifecycle.advance(JobState::LocalAggregationRunning).is_err());

        let mut done = JobLifecycle::new();
        for state in HAPPY_PATH {
            done.advance(state).unwrap();
        }
        assert!(!JobState::Done.can_transition_to(JobState::Failed));
        done.fail();
        assert_eq!(done.current(), JobState::Done);
    }
}
