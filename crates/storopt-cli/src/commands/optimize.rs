use anyhow::{bail, Context, Result};
use std::io::Write;
use std::path::Path;
use storopt_cli::ProfileColumnArgs;
use storopt_io::write_storage_results;
use storopt_solver_common::{ProblemSettings, SolverProcess, StorageProblem, StorageSolution};
use tabwriter::TabWriter;
use tracing::info;

use super::{benchmark_network, expand_profiles};

/// Resolved arguments of one `optimize` run.
pub struct OptimizeArgs<'a> {
    pub profiles: &'a Path,
    pub out_dir: &'a Path,
    pub solver: &'a str,
    pub solver_args: &'a [String],
    pub settings: ProblemSettings,
    pub columns: &'a ProfileColumnArgs,
}

pub fn handle(args: OptimizeArgs<'_>) -> Result<()> {
    let network = benchmark_network();
    let injections = expand_profiles(&network, args.profiles, &args.columns.into())?;

    let problem = StorageProblem::build(&network, &injections, &args.settings)?;
    let process = SolverProcess::resolve(args.solver, args.settings.timeout_seconds)?
        .with_args(args.solver_args.iter().cloned());
    info!(
        "Running {} on {} steps ({} h each)",
        process.binary_path().display(),
        problem.n_timesteps,
        problem.time_elapsed_hr
    );

    let solution = process.solve_blocking(&problem)?;
    solution
        .validate_against(&problem)
        .context("solver returned an unusable solution")?;
    write_storage_results(args.out_dir, &solution)?;

    if !solution.status.is_success() {
        bail!(
            "solver finished with status {}: {}",
            solution.status,
            solution.error_message.as_deref().unwrap_or("no message")
        );
    }
    print_schedule_table(&solution, problem.time_elapsed_hr)?;
    println!("Results written to {}", args.out_dir.display());
    Ok(())
}

fn print_schedule_table(solution: &StorageSolution, time_elapsed_hr: f64) -> Result<()> {
    let mut writer = TabWriter::new(Vec::new()).padding(2);
    writeln!(
        writer,
        "STORAGE\tSTEPS\tCHARGED MWh\tDISCHARGED MWh\tFINAL SOC %"
    )?;
    for (id, schedule) in &solution.storages {
        let final_soc = schedule
            .soc_percent
            .last()
            .map(|soc| format!("{soc:.2}"))
            .unwrap_or_else(|| "-".to_string());
        writeln!(
            writer,
            "{}\t{}\t{:.4}\t{:.4}\t{}",
            id,
            schedule.len(),
            schedule.charged_mwh(time_elapsed_hr),
            schedule.discharged_mwh(time_elapsed_hr),
            final_soc
        )?;
    }
    writer.flush()?;
    print!("{}", String::from_utf8(writer.into_inner()?)?);
    println!("Status: {}", solution.status);
    if let Some(objective) = solution.objective {
        println!("Objective: {objective:.6}");
    }
    Ok(())
}
