use crate::error::CliError;
use engine_runtime::execution::report::JobReport;
use std::path::Path;

pub async fn write_report(report: &JobReport, path: &Path) -> Result<(), CliError> {
    let report_json = report.to_json()?;
    tokio::fs::write(path, report_json)
        .await
        .map_err(|source| CliError::ReportWrite {
            path: path.to_path_buf(),
            source,
        })
}
