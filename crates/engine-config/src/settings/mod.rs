use crate::{env::EnvManager, job::JobKind};
use connectors::sql::query::{grouped_sum, is_identifier};
use engine_core::decode::{Decoder, LineDecoder, RowDecoder};
use error::SettingsError;
use serde::{Deserialize, Serialize};
use std::{path::Path, str::FromStr};
use tracing::debug;

pub mod error;

/// Everything a job can be tuned with. Defaults reproduce the benchmark
/// job over `UserVisits`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct JobSettings {
    pub structured: StructuredSettings,
    pub text: TextSettings,
    pub execution: ExecutionSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StructuredSettings {
    pub relation: String,
    pub key_column: String,
    pub value_column: String,
    /// Name the summed column is returned under.
    pub alias: String,
    /// One connection URL per shard.
    pub urls: Vec<String>,
}

impl Default for StructuredSettings {
    fn default() -> Self {
        StructuredSettings {
            relation: "UserVisits".to_string(),
            key_column: "sourceIP".to_string(),
            value_column: "adRevenue".to_string(),
            alias: "sumAdRevenue".to_string(),
            urls: Vec::new(),
        }
    }
}

impl StructuredSettings {
    pub fn query(&self) -> String {
        grouped_sum(
            &self.relation,
            &self.key_column,
            &self.value_column,
            &self.alias,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TextSettings {
    pub delimiter: String,
    pub key_index: usize,
    pub value_index: usize,
    /// Maximum bytes per input split. Whole files when unset.
    pub split_size: Option<u64>,
}

impl Default for TextSettings {
    fn default() -> Self {
        TextSettings {
            delimiter: "|".to_string(),
            key_index: 0,
            value_index: 3,
            split_size: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecutionSettings {
    /// Maximum partition or merge tasks running at once.
    pub parallelism: usize,
    /// Number of merge groups, and of output parts.
    pub reducers: usize,
    /// Sum per key inside each partition before regrouping. Defaults to on
    /// for text input and off for pre-aggregated database shards.
    pub combine: Option<bool>,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        ExecutionSettings {
            parallelism: 4,
            reducers: 1,
            combine: None,
        }
    }
}

impl JobSettings {
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = serde_json::from_str(&content).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded settings file");
        Ok(settings)
    }

    /// Overlay `TALLY_*` variables on top of the current values.
    pub fn apply_env(&mut self, env: &EnvManager) -> Result<(), SettingsError> {
        if let Some(urls) = env.get("TALLY_DB_URLS") {
            self.structured.urls = urls
                .split(',')
                .map(str::trim)
                .filter(|u| !u.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(relation) = env.get("TALLY_RELATION") {
            self.structured.relation = relation.to_string();
        }
        if let Some(delimiter) = env.get("TALLY_DELIMITER") {
            self.text.delimiter = delimiter.to_string();
        }
        if let Some(size) = env.get("TALLY_SPLIT_SIZE") {
            self.text.split_size = Some(parse_var("TALLY_SPLIT_SIZE", size)?);
        }
        if let Some(parallelism) = env.get("TALLY_PARALLELISM") {
            self.execution.parallelism = parse_var("TALLY_PARALLELISM", parallelism)?;
        }
        if let Some(reducers) = env.get("TALLY_REDUCERS") {
            self.execution.reducers = parse_var("TALLY_REDUCERS", reducers)?;
        }
        if let Some(combine) = env.get("TALLY_COMBINE") {
            self.execution.combine = Some(parse_flag("TALLY_COMBINE", combine)?);
        }
        Ok(())
    }

    pub fn validate(&self, kind: JobKind) -> Result<(), SettingsError> {
        let execution = &self.execution;
        if execution.parallelism == 0 {
            return Err(SettingsError::invalid("execution.parallelism", "must be at least 1"));
        }
        if execution.reducers == 0 {
            return Err(SettingsError::invalid("execution.reducers", "must be at least 1"));
        }

        match kind {
            JobKind::Db => {
                let structured = &self.structured;
                for (setting, name) in [
                    ("structured.relation", &structured.relation),
                    ("structured.key_column", &structured.key_column),
                    ("structured.value_column", &structured.value_column),
                    ("structured.alias", &structured.alias),
                ] {
                    if !is_identifier(name) {
                        return Err(SettingsError::invalid(
                            setting,
                            format!("'{name}' is not a plain SQL identifier"),
                        ));
                    }
                }
                if structured.urls.is_empty() {
                    return Err(SettingsError::NoShards);
                }
            }
            JobKind::Hdfs => {
                if self.text.delimiter.is_empty() {
                    return Err(SettingsError::invalid("text.delimiter", "must not be empty"));
                }
                if self.text.split_size == Some(0) {
                    return Err(SettingsError::invalid("text.split_size", "must be at least 1"));
                }
            }
        }
        Ok(())
    }

    pub fn combine(&self, kind: JobKind) -> bool {
        self.execution
            .combine
            .unwrap_or(!kind.pre_aggregated())
    }

    /// Decoder for the units produced by `kind`'s source.
    pub fn decoder(&self, kind: JobKind) -> Decoder {
        match kind {
            JobKind::Db => Decoder::Structured(RowDecoder::new(
                &self.structured.key_column,
                &self.structured.alias,
            )),
            JobKind::Hdfs => Decoder::Delimited(LineDecoder::new(
                &self.text.delimiter,
                self.text.key_index,
                self.text.value_index,
            )),
        }
    }
}

fn parse_var<T: FromStr>(var: &str, value: &str) -> Result<T, SettingsError> {
    value.trim().parse().map_err(|_| SettingsError::InvalidEnv {
        var: var.to_string(),
        value: value.to_string(),
    })
}

fn parse_flag(var: &str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::InvalidEnv {
            var: var.to_string(),
            value: value.to_string(),
        }),
    }
}
