use crate::error::JobError;
use async_trait::async_trait;
use engine_processing::error::ProcessingError;
use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::{sync::Semaphore, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

/// One independent unit of work of a stage.
pub type Task<T> = BoxFuture<'static, Result<T, ProcessingError>>;

/// Runs the tasks of one stage.
///
/// Results come back in task order. The first failing task cancels every
/// other task of the stage and fails it.
#[async_trait]
pub trait Executor: Send + Sync {
    async fn run_all<T>(&self, stage: &'static str, tasks: Vec<Task<T>>) -> Result<Vec<T>, JobError>
    where
        T: Send + 'static;
}

/// Runs tasks on the current tokio runtime, at most `parallelism` at a time.
#[derive(Debug, Clone)]
pub struct LocalExecutor {
    parallelism: usize,
    cancel: CancellationToken,
}

impl LocalExecutor {
    pub fn new(parallelism: usize, cancel: CancellationToken) -> Self {
        LocalExecutor {
            parallelism: parallelism.max(1),
            cancel,
        }
    }
}

#[async_trait]
impl Executor for LocalExecutor {
    async fn run_all<T>(&self, stage: &'static str, tasks: Vec<Task<T>>) -> Result<Vec<T>, JobError>
    where
        T: Send + 'static,
    {
        if self.cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }

        let total = tasks.len();
        debug!(stage, tasks = total, parallelism = self.parallelism, "Stage starting");

        let permits = Arc::new(Semaphore::new(self.parallelism));
        let mut set = JoinSet::new();
        for (index, task) in tasks.into_iter().enumerate() {
            let permits = permits.clone();
            set.spawn(async move {
                // The semaphore is never closed.
                let _permit = permits.acquire_owned().await.ok();
                (index, task.await)
            });
        }

        let mut results: Vec<Option<T>> = (0..total).map(|_| None).collect();
        loop {
            let joined = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    warn!(stage, "Cancellation requested, aborting stage");
                    set.abort_all();
                    return Err(JobError::Cancelled);
                }
                joined = set.join_next() => joined,
            };

            let Some(joined) = joined else { break };
            let (index, result) = joined?;
            match result {
                Ok(value) => results[index] = Some(value),
                Err(err) => {
                    error!(stage, task = index, %err, "Task failed, aborting stage");
                    set.abort_all();
                    return Err(err.into());
                }
            }
        }

        Ok(results.into_iter().flatten().collect())
    }
}
