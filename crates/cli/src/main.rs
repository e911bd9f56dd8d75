use crate::{
    error::CliError,
    shutdown::{ExitCode, ShutdownCoordinator},
};
use clap::Parser;
use commands::Commands;
use engine_config::{env::EnvManager, job::JobSpec, settings::JobSettings};
use engine_runtime::execution::executor;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod output;
mod shutdown;

#[derive(Debug, Parser)]
#[command(
    name = "tally",
    version = "0.1.0",
    about = "Grouped revenue aggregation over database shards or text files"
)]
struct Cli {
    #[arg(long, global = true, help = "JSON settings file")]
    settings: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "Dotenv-style file with TALLY_* variables; process variables take precedence"
    )]
    env_file: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        help = "If specified, writes the JSON job report to this file"
    )]
    report: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let shutdown = ShutdownCoordinator::new(CancellationToken::new());
    shutdown.register_handlers();

    let code = match run(cli, &shutdown).await {
        Ok(()) => ExitCode::Success,
        Err(CliError::Usage(usage)) => {
            println!("{}", usage.usage());
            ExitCode::Usage
        }
        Err(err) => {
            error!("{err}");
            err.exit_code()
        }
    };

    std::process::exit(code.as_i32());
}

async fn run(cli: Cli, shutdown: &ShutdownCoordinator) -> Result<(), CliError> {
    let kind = cli.command.kind();
    let spec = JobSpec::from_args(kind, cli.command.args())?;
    let settings = load_settings(cli.settings.as_deref(), cli.env_file.as_deref())?;

    info!(job = %kind, output = %spec.output.display(), "Running aggregation job");
    let report = executor::run_spec(&spec, &settings, shutdown.cancel_token())
        .await
        .map_err(|err| {
            if shutdown.is_shutdown_requested() {
                CliError::ShutdownRequested
            } else {
                CliError::from(err)
            }
        })?;

    if let Some(path) = cli.report {
        output::write_report(&report, &path).await?;
        info!(path = %path.display(), "Job report written");
    }
    Ok(())
}

/// Defaults, then the settings file, then the env file and process variables.
fn load_settings(
    settings_file: Option<&Path>,
    env_file: Option<&Path>,
) -> Result<JobSettings, CliError> {
    let mut settings = match settings_file {
        Some(path) => JobSettings::load_file(path)?,
        None => JobSettings::default(),
    };

    let mut env = EnvManager::from_system();
    if let Some(path) = env_file {
        env.load_from_file(path)?;
    }
    settings.apply_env(&env)?;
    Ok(settings)
}
