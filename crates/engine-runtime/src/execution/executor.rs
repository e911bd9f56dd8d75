use crate::{
    error::JobError,
    execution::{
        factory,
        report::JobReport,
        scheduler::{Executor, LocalExecutor, Task},
        shuffle::{HashShuffle, Shuffle},
    },
};
use chrono::{DateTime, Utc};
use connectors::{sink::OutputSink, source::PartitionSource};
use engine_config::{
    job::{JobKind, JobSpec},
    settings::JobSettings,
};
use engine_core::{
    decode::Decoder,
    lifecycle::{JobLifecycle, JobState},
    metrics::Metrics,
};
use engine_processing::{
    partition::{PartitionOutput, aggregate_partition},
    reduce::{MergedPart, merge_groups, write_part},
};
use futures::FutureExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Validate the arguments, then run `kind` to completion.
pub async fn run<S: AsRef<str>>(
    kind: JobKind,
    args: &[S],
    settings: &JobSettings,
    cancel: CancellationToken,
) -> Result<JobReport, JobError> {
    let spec = JobSpec::from_args(kind, args)?;
    run_spec(&spec, settings, cancel).await
}

/// Run an already validated job spec.
pub async fn run_spec(
    spec: &JobSpec,
    settings: &JobSettings,
    cancel: CancellationToken,
) -> Result<JobReport, JobError> {
    settings.validate(spec.kind)?;
    PipelineDriver::from_spec(spec, settings, cancel)
        .execute()
        .await
}

/// What the driver aggregates and where it writes.
pub struct DriverParams {
    pub kind: JobKind,
    pub source: Arc<dyn PartitionSource>,
    pub sink: Arc<dyn OutputSink>,
    pub decoder: Decoder,
    pub combine: bool,
    pub reducers: usize,
}

/// Runs one aggregation job through its stages.
pub struct PipelineDriver<E: Executor = LocalExecutor, S: Shuffle = HashShuffle> {
    run_id: Uuid,
    kind: JobKind,
    source: Arc<dyn PartitionSource>,
    sink: Arc<dyn OutputSink>,
    decoder: Arc<Decoder>,
    combine: bool,
    reducers: usize,
    executor: E,
    shuffle: S,
    cancel: CancellationToken,
    lifecycle: JobLifecycle,
    metrics: Metrics,
    partitions: usize,
    keys: usize,
}

impl PipelineDriver<LocalExecutor, HashShuffle> {
    pub fn from_spec(spec: &JobSpec, settings: &JobSettings, cancel: CancellationToken) -> Self {
        let params = DriverParams {
            kind: spec.kind,
            source: factory::create_source(spec, settings),
            sink: factory::create_sink(spec),
            decoder: settings.decoder(spec.kind),
            combine: settings.combine(spec.kind),
            reducers: settings.execution.reducers,
        };
        let executor = LocalExecutor::new(settings.execution.parallelism, cancel.clone());
        PipelineDriver::new(params, executor, HashShuffle, cancel)
    }
}

impl<E: Executor, S: Shuffle> PipelineDriver<E, S> {
    pub fn new(params: DriverParams, executor: E, shuffle: S, cancel: CancellationToken) -> Self {
        PipelineDriver {
            run_id: Uuid::new_v4(),
            kind: params.kind,
            source: params.source,
            sink: params.sink,
            decoder: Arc::new(params.decoder),
            combine: params.combine,
            reducers: params.reducers.max(1),
            executor,
            shuffle,
            cancel,
            lifecycle: JobLifecycle::new(),
            metrics: Metrics::new(),
            partitions: 0,
            keys: 0,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> JobState {
        self.lifecycle.current()
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Run every stage. On failure the job ends in `Failed` and nothing is
    /// committed to the output location.
    pub async fn execute(&mut self) -> Result<JobReport, JobError> {
        let started_at = Utc::now();
        info!(
            run_id = %self.run_id,
            job = %self.kind,
            source = self.source.name(),
            output = %self.sink.location(),
            combine = self.combine,
            reducers = self.reducers,
            "Starting aggregation job"
        );

        match self.run_stages().await {
            Ok(()) => {
                let report = self.report(started_at);
                info!(
                    run_id = %self.run_id,
                    partitions = report.partitions,
                    keys = report.keys,
                    took_s = report.duration_secs(),
                    "Aggregation job completed"
                );
                Ok(report)
            }
            Err(err) => {
                let failed_in = self.lifecycle.current();
                self.lifecycle.fail();
                error!(run_id = %self.run_id, state = %failed_in, %err, "Aggregation job failed");
                if let Err(abort_err) = self.sink.abort().await {
                    warn!(run_id = %self.run_id, %abort_err, "Failed to discard partial output");
                }
                Err(err)
            }
        }
    }

    async fn run_stages(&mut self) -> Result<(), JobError> {
        self.sink.cleanup().await?;
        self.sink.prepare().await?;

        let partitions = self.source.partitions().await?;
        self.partitions = partitions.len();
        self.lifecycle.advance(JobState::PartitionsDiscovered)?;
        info!(run_id = %self.run_id, partitions = partitions.len(), "Partitions discovered");
        self.ensure_not_cancelled()?;

        self.lifecycle.advance(JobState::LocalAggregationRunning)?;
        let tasks: Vec<Task<PartitionOutput>> = partitions
            .into_iter()
            .map(|partition| {
                let source = self.source.clone();
                let decoder = self.decoder.clone();
                let metrics = self.metrics.clone();
                let combine = self.combine;
                async move {
                    aggregate_partition(source.as_ref(), &partition, &decoder, combine, &metrics)
                        .await
                }
                .boxed()
            })
            .collect();
        let outputs = self.executor.run_all("partial", tasks).await?;

        let groups = self.shuffle.regroup(outputs, self.reducers);
        self.lifecycle.advance(JobState::Regrouped)?;
        info!(run_id = %self.run_id, reducers = groups.len(), "Partial sums regrouped");
        self.ensure_not_cancelled()?;

        self.lifecycle.advance(JobState::MergeRunning)?;
        let tasks: Vec<Task<MergedPart>> = groups
            .into_iter()
            .map(|groups| {
                let metrics = self.metrics.clone();
                async move { merge_groups(groups, &metrics) }.boxed()
            })
            .collect();
        let merged = self.executor.run_all("merge", tasks).await?;
        self.keys = merged.iter().map(|part| part.sums.len()).sum();

        let tasks: Vec<Task<u64>> = merged
            .into_iter()
            .map(|part| {
                let sink = self.sink.clone();
                let metrics = self.metrics.clone();
                async move { write_part(sink.as_ref(), part, &metrics).await }.boxed()
            })
            .collect();
        self.executor.run_all("write", tasks).await?;
        self.ensure_not_cancelled()?;

        self.sink.commit().await?;
        self.lifecycle.advance(JobState::Written)?;
        info!(run_id = %self.run_id, keys = self.keys, output = %self.sink.location(), "Output written");

        self.lifecycle.advance(JobState::Done)?;
        Ok(())
    }

    fn ensure_not_cancelled(&self) -> Result<(), JobError> {
        if self.cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        Ok(())
    }

    fn report(&self, started_at: DateTime<Utc>) -> JobReport {
        JobReport {
            run_id: self.run_id,
            job: self.kind,
            source: self.source.name().to_string(),
            output: self.sink.location(),
            started_at,
            finished_at: Utc::now(),
            states: self.lifecycle.history().to_vec(),
            partitions: self.partitions,
            reducers: self.reducers,
            combine: self.combine,
            keys: self.keys,
            metrics: self.metrics.snapshot(),
        }
    }
}
