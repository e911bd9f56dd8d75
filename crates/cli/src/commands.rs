use clap::Subcommand;
use engine_config::job::JobKind;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sum ad revenue per source IP over the configured database shards
    AggregateDb {
        /// <output_dir>
        #[arg(num_args = 0..)]
        args: Vec<String>,
    },
    /// Sum ad revenue per source IP over a file or directory of text files
    AggregateHdfs {
        /// <input_dir> <output_dir>
        #[arg(num_args = 0..)]
        args: Vec<String>,
    },
}

impl Commands {
    pub fn kind(&self) -> JobKind {
        match self {
            Commands::AggregateDb { .. } => JobKind::Db,
            Commands::AggregateHdfs { .. } => JobKind::Hdfs,
        }
    }

    /// Positional arguments, checked against the job's arity later.
    pub fn args(&self) -> &[String] {
        match self {
            Commands::AggregateDb { args } | Commands::AggregateHdfs { args } => args,
        }
    }
}
