//! Storage schedule export.
//!
//! `write_storage_results` lays out one directory per run:
//!
//! ```text
//! out_dir/
//!   storage_0.csv   step,p_mw,q_mvar,soc_mwh,soc_percent
//!   storage_3.csv
//!   summary.json
//! ```

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::{CsvWriter, DataFrame, NamedFrom, SerWriter};
use serde::{Deserialize, Serialize};
use storopt_solver_common::{SolutionStatus, StorageSchedule, StorageSolution};
use tracing::info;

use super::SolutionExport;

pub const SUMMARY_FILE: &str = "summary.json";

/// Contents of `summary.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub status: SolutionStatus,
    pub objective: Option<f64>,
    pub solve_time_ms: i64,
    pub error_message: Option<String>,
    pub storages: Vec<StorageSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSummary {
    pub id: i64,
    /// File name relative to the output directory.
    pub file: String,
    pub steps: usize,
    pub min_soc_percent: Option<f64>,
    pub max_soc_percent: Option<f64>,
    pub final_soc_percent: Option<f64>,
}

impl StorageSummary {
    fn new(id: i64, file: String, schedule: &StorageSchedule) -> Self {
        let soc = &schedule.soc_percent;
        Self {
            id,
            file,
            steps: schedule.len(),
            min_soc_percent: soc.iter().copied().reduce(f64::min),
            max_soc_percent: soc.iter().copied().reduce(f64::max),
            final_soc_percent: soc.last().copied(),
        }
    }
}

/// Name of the CSV holding the schedule of storage `id`.
pub fn storage_file_name(id: i64) -> String {
    format!("storage_{}.csv", id)
}

/// Build the per-step table of one storage unit.
pub fn schedule_frame(schedule: &StorageSchedule) -> Result<DataFrame> {
    anyhow::ensure!(
        schedule.is_aligned(),
        "storage schedule columns differ in length"
    );
    let df = polars::df!(
        "step" => schedule.step.as_slice(),
        "p_mw" => schedule.p_mw.as_slice(),
        "q_mvar" => schedule.q_mvar.as_slice(),
        "soc_mwh" => schedule.soc_mwh.as_slice(),
        "soc_percent" => schedule.soc_percent.as_slice(),
    )?;
    Ok(df)
}

impl SolutionExport for StorageSchedule {
    fn to_csv(&self, path: &Path) -> Result<()> {
        let mut df = schedule_frame(self)?;
        let mut file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        CsvWriter::new(&mut file)
            .finish(&mut df)
            .with_context(|| format!("writing CSV to {}", path.display()))?;
        Ok(())
    }
}

/// Persist every storage schedule of `solution` plus a `summary.json`.
///
/// Creates `out_dir` if needed and returns the paths written, summary last.
pub fn write_storage_results(out_dir: &Path, solution: &StorageSolution) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("creating output directory {}", out_dir.display()))?;

    let mut written = Vec::with_capacity(solution.storages.len() + 1);
    let mut storages = Vec::with_capacity(solution.storages.len());
    for (&id, schedule) in &solution.storages {
        let file = storage_file_name(id);
        let path = out_dir.join(&file);
        schedule
            .to_csv(&path)
            .with_context(|| format!("exporting schedule of storage {}", id))?;
        storages.push(StorageSummary::new(id, file, schedule));
        written.push(path);
    }

    let summary = ResultSummary {
        status: solution.status,
        objective: solution.objective,
        solve_time_ms: solution.solve_time_ms,
        error_message: solution.error_message.clone(),
        storages,
    };
    let summary_path = out_dir.join(SUMMARY_FILE);
    fs::write(&summary_path, serde_json::to_string_pretty(&summary)?)
        .with_context(|| format!("writing {}", summary_path.display()))?;
    written.push(summary_path);

    info!(
        dir = %out_dir.display(),
        storages = solution.storages.len(),
        "wrote storage results"
    );
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::tempdir;

    fn schedule() -> StorageSchedule {
        StorageSchedule {
            step: vec![0, 1, 2],
            p_mw: vec![0.5, 0.0, -0.5],
            q_mvar: vec![0.0, 0.0, 0.0],
            soc_mwh: vec![1.125, 1.125, 1.0],
            soc_percent: vec![56.25, 56.25, 50.0],
        }
    }

    fn solution() -> StorageSolution {
        StorageSolution {
            status: SolutionStatus::Optimal,
            objective: Some(3.5),
            solve_time_ms: 12,
            error_message: None,
            storages: BTreeMap::from([(0, schedule()), (3, schedule())]),
            ..StorageSolution::default()
        }
    }

    #[test]
    fn frame_has_schedule_columns() {
        let df = schedule_frame(&schedule()).unwrap();
        assert_eq!(df.height(), 3);
        assert_eq!(
            df.get_column_names(),
            vec!["step", "p_mw", "q_mvar", "soc_mwh", "soc_percent"]
        );
    }

    #[test]
    fn misaligned_schedule_is_rejected() {
        let mut broken = schedule();
        broken.soc_mwh.pop();
        assert!(schedule_frame(&broken).is_err());
    }

    #[test]
    fn writes_one_csv_per_storage_and_summary() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("results");
        let written = write_storage_results(&out, &solution()).unwrap();

        assert_eq!(written.len(), 3);
        assert!(out.join("storage_0.csv").exists());
        assert!(out.join("storage_3.csv").exists());

        let csv = fs::read_to_string(out.join("storage_3.csv")).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("step,p_mw,q_mvar,soc_mwh,soc_percent"));
        assert_eq!(lines.count(), 3);

        let summary: ResultSummary =
            serde_json::from_str(&fs::read_to_string(out.join(SUMMARY_FILE)).unwrap()).unwrap();
        assert_eq!(summary.status, SolutionStatus::Optimal);
        assert_eq!(summary.storages.len(), 2);
        assert_eq!(summary.storages[1].file, "storage_3.csv");
        assert_eq!(summary.storages[1].min_soc_percent, Some(50.0));
        assert_eq!(summary.storages[1].final_soc_percent, Some(50.0));
    }

    #[test]
    fn failed_solution_still_gets_a_summary() {
        let dir = tempdir().unwrap();
        let written =
            write_storage_results(dir.path(), &StorageSolution::infeasible("soc bounds")).unwrap();
        assert_eq!(written, vec![dir.path().join(SUMMARY_FILE)]);

        let summary: ResultSummary =
            serde_json::from_str(&fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert_eq!(summary.status, SolutionStatus::Infeasible);
        assert_eq!(summary.error_message.as_deref(), Some("soc bounds"));
        assert!(summary.storages.is_empty());
    }
}
