//! Plugin harness for solver binaries.
//!
//! A solver binary implements [`SolverPlugin`] and hands itself to
//! [`run_solver_plugin`], which does the stdin/stdout plumbing:
//!
//! ```rust,ignore
//! use storopt_solver_common::{run_solver_plugin, SolverPlugin, StorageProblem, StorageSolution};
//!
//! struct Idle;
//!
//! impl SolverPlugin for Idle {
//!     fn name(&self) -> &'static str { "storopt-idle" }
//!     fn solve(&self, problem: &StorageProblem) -> anyhow::Result<StorageSolution> {
//!         // keep every battery at its initial state of charge
//!     }
//! }
//!
//! fn main() {
//!     run_solver_plugin(Idle);
//! }
//! ```

use std::io::{self, Read, Write};

use anyhow::{Context, Result};
use tracing::{debug, error, info};

use crate::error::ExitCode;
use crate::ipc;
use crate::problem::StorageProblem;
use crate::solution::StorageSolution;
use crate::PROTOCOL_VERSION;

/// Trait for implementing a solver plugin.
pub trait SolverPlugin {
    /// The solver name (e.g., "storopt-powermodels").
    fn name(&self) -> &'static str;

    /// Compute storage schedules for the given problem.
    fn solve(&self, problem: &StorageProblem) -> Result<StorageSolution>;

    /// Called after tracing is initialized but before reading the problem.
    fn init(&self) -> Result<()> {
        Ok(())
    }
}

/// Run a solver plugin with the standard harness and exit the process.
///
/// Tracing goes to stderr and respects `RUST_LOG`.
///
/// # Exit Codes
///
/// - `0`: Success
/// - `1`: Problem could not be read
/// - `2`: Solver error
pub fn run_solver_plugin<P: SolverPlugin>(plugin: P) -> ! {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(io::stderr)
        .init();

    info!(
        "{} v{} (protocol v{})",
        plugin.name(),
        env!("CARGO_PKG_VERSION"),
        PROTOCOL_VERSION
    );

    let mut input = Vec::new();
    let exit_code = match io::stdin().read_to_end(&mut input) {
        Ok(_) => run_plugin(&plugin, &input, &mut io::stdout().lock()),
        Err(e) => {
            error!("Failed to read problem from stdin: {}", e);
            ExitCode::InvalidInput
        }
    };

    std::process::exit(exit_code as i32);
}

/// Decode `input`, solve it, and write the solution to `output`.
pub fn run_plugin<P: SolverPlugin, W: Write>(
    plugin: &P,
    input: &[u8],
    output: &mut W,
) -> ExitCode {
    let problem = match ipc::read_problem(input) {
        Ok(problem) => problem,
        Err(e) => {
            error!("Failed to parse problem: {}", e);
            return ExitCode::InvalidInput;
        }
    };

    match solve_and_write(plugin, &problem, output) {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            error!("Solver error: {:?}", e);
            ExitCode::SolverError
        }
    }
}

fn solve_and_write<P: SolverPlugin, W: Write>(
    plugin: &P,
    problem: &StorageProblem,
    output: &mut W,
) -> Result<()> {
    plugin.init().context("Solver initialization failed")?;

    info!(
        "Problem: {} buses, {} lines, {} storages, {} steps",
        problem.num_buses(),
        problem.num_lines(),
        problem.storage_id.len(),
        problem.n_timesteps
    );

    let solution = plugin.solve(problem)?;
    solution
        .validate_against(problem)
        .context("plugin produced an invalid solution")?;

    debug!("Writing solution to stdout...");
    ipc::write_solution(&solution, output).context("Failed to serialize solution")?;

    info!(
        "Solution written: status={}, objective={:?}",
        solution.status, solution.objective
    );
    Ok(())
}
