use chrono::{DateTime, Utc};
use engine_config::job::JobKind;
use engine_core::{lifecycle::StateChange, metrics::MetricsSnapshot};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

/// Summary of a finished job.
#[derive(Debug, Clone, Serialize)]
pub struct JobReport {
    pub run_id: Uuid,
    pub job: JobKind,
    pub source: String,
    pub output: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub states: Vec<StateChange>,
    pub partitions: usize,
    pub reducers: usize,
    pub combine: bool,
    pub keys: usize,
    pub metrics: MetricsSnapshot,
}

impl JobReport {
    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at).num_milliseconds() as f64 / 1000.0
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn write_to(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}
