use clap::{Args, Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level [default: from config, else info]
    #[arg(long, global = true)]
    pub log_level: Option<tracing::Level>,

    /// Read configuration from this file instead of ~/.storopt/config.toml
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the benchmark grid used for storage runs
    Network {
        #[arg(long, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
    /// Expand load and generation profiles into per-step injections
    Expand {
        /// Profile table (.csv or .json)
        #[arg(value_hint = ValueHint::FilePath)]
        profiles: PathBuf,

        /// Write the step map here instead of stdout
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,

        #[command(flatten)]
        columns: ProfileColumnArgs,
    },
    /// Expand profiles, run the storage solver and store its schedules
    Optimize {
        /// Profile table (.csv or .json)
        #[arg(value_hint = ValueHint::FilePath)]
        profiles: PathBuf,

        /// Directory for storage_<id>.csv files and summary.json
        #[arg(long, value_hint = ValueHint::DirPath)]
        out_dir: PathBuf,

        /// Solver binary name or path [default: from config]
        #[arg(long)]
        solver: Option<String>,

        /// Extra argument for the solver binary (repeatable)
        #[arg(long = "solver-arg", allow_hyphen_values = true)]
        solver_args: Vec<String>,

        /// Duration of one time step in hours [default: from config]
        #[arg(long)]
        time_elapsed: Option<f64>,

        /// Solver timeout in seconds, 0 for one hour [default: from config]
        #[arg(long)]
        timeout: Option<u64>,

        #[command(flatten)]
        columns: ProfileColumnArgs,
    },
    /// List solver binaries that can be found
    Solvers,
}

/// Column names of the profile table.
#[derive(Args, Debug, Clone)]
pub struct ProfileColumnArgs {
    /// Time-step column; row position is used when the table lacks it
    #[arg(long, default_value = "step")]
    pub index_column: String,

    #[arg(long, default_value = "residential")]
    pub residential_column: String,

    #[arg(long, default_value = "pv")]
    pub pv_column: String,

    #[arg(long, default_value = "wind")]
    pub wind_column: String,
}

impl From<&ProfileColumnArgs> for storopt_ts::ProfileColumns {
    fn from(args: &ProfileColumnArgs) -> Self {
        Self {
            index: args.index_column.clone(),
            residential: args.residential_column.clone(),
            pv: args.pv_column.clone(),
            wind: args.wind_column.clone(),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Json,
}
