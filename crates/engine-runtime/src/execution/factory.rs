use connectors::{
    file::text::{sink::TextDirSink, source::TextSource},
    sink::OutputSink,
    source::PartitionSource,
    sql::source::SqlPartitionSource,
};
use engine_config::{
    job::{JobInput, JobSpec},
    settings::JobSettings,
};
use std::sync::Arc;

pub fn create_source(spec: &JobSpec, settings: &JobSettings) -> Arc<dyn PartitionSource> {
    match &spec.input {
        JobInput::Path(input) => Arc::new(TextSource::new(input, settings.text.split_size)),
        JobInput::Shards => {
            let structured = &settings.structured;
            Arc::new(SqlPartitionSource::new(
                &structured.relation,
                structured.query(),
                structured.urls.clone(),
            ))
        }
    }
}

pub fn create_sink(spec: &JobSpec) -> Arc<dyn OutputSink> {
    Arc::new(TextDirSink::new(&spec.output))
}
