use clap::Parser;
use std::process;
use storopt_cli::{cli::Commands, config::StoroptConfig, load_config, Cli};
use storopt_solver_common::ProblemSettings;
use tracing::debug;
use tracing_subscriber::FmtSubscriber;

mod commands;

use commands::optimize::OptimizeArgs;

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    };

    let level = match cli.log_level {
        Some(level) => level,
        None => match config.logging.tracing_level() {
            Ok(level) => level,
            Err(e) => {
                eprintln!("error: {e:#}");
                process::exit(1);
            }
        },
    };

    // stdout carries command output, so logs go to stderr
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("warning: could not install log subscriber: {e}");
    }
    debug!("storopt v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&cli, &config) {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: &Cli, config: &StoroptConfig) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Network { format } => commands::network::handle(*format),
        Commands::Expand {
            profiles,
            out,
            columns,
        } => commands::expand::handle(profiles, out.as_deref(), columns),
        Commands::Optimize {
            profiles,
            out_dir,
            solver,
            solver_args,
            time_elapsed,
            timeout,
            columns,
        } => {
            let settings = ProblemSettings {
                time_elapsed_hr: time_elapsed.unwrap_or(config.optimization.time_elapsed_hr),
                timeout_seconds: timeout.unwrap_or(config.solver.timeout_seconds),
            };
            commands::optimize::handle(OptimizeArgs {
                profiles,
                out_dir,
                solver: solver.as_deref().unwrap_or(&config.solver.default),
                solver_args,
                settings,
                columns,
            })
        }
        Commands::Solvers => commands::solvers::handle(&config.solver.default),
    }
}
