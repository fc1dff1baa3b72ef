//! Solution representation returned by storage solvers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{SolverError, SolverResult};
use crate::problem::StorageProblem;

/// Status of the solver solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolutionStatus {
    Optimal,
    /// Feasible but optimality not proven.
    LocallySolved,
    Infeasible,
    Timeout,
    IterationLimit,
    NumericalError,
    Error,
    Unknown,
}

impl SolutionStatus {
    /// Check if this status carries a usable schedule.
    pub fn is_success(&self) -> bool {
        matches!(self, SolutionStatus::Optimal | SolutionStatus::LocallySolved)
    }

    pub fn is_failure(&self) -> bool {
        !self.is_success() && !matches!(self, SolutionStatus::Unknown)
    }
}

impl std::fmt::Display for SolutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolutionStatus::Optimal => write!(f, "optimal"),
            SolutionStatus::LocallySolved => write!(f, "locally_solved"),
            SolutionStatus::Infeasible => write!(f, "infeasible"),
            SolutionStatus::Timeout => write!(f, "timeout"),
            SolutionStatus::IterationLimit => write!(f, "iteration_limit"),
            SolutionStatus::NumericalError => write!(f, "numerical_error"),
            SolutionStatus::Error => write!(f, "error"),
            SolutionStatus::Unknown => write!(f, "unknown"),
        }
    }
}

/// Per-step schedule of one storage unit.
///
/// All vectors are aligned with `step`. Positive `p_mw` charges the unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageSchedule {
    pub step: Vec<i64>,
    pub p_mw: Vec<f64>,
    pub q_mvar: Vec<f64>,
    /// Stored energy at the end of each step.
    pub soc_mwh: Vec<f64>,
    pub soc_percent: Vec<f64>,
}

impl StorageSchedule {
    pub fn len(&self) -> usize {
        self.step.len()
    }

    pub fn is_empty(&self) -> bool {
        self.step.is_empty()
    }

    /// All columns have the same length.
    pub fn is_aligned(&self) -> bool {
        let n = self.step.len();
        self.p_mw.len() == n
            && self.q_mvar.len() == n
            && self.soc_mwh.len() == n
            && self.soc_percent.len() == n
    }

    /// Energy moved into the unit over the horizon (MWh).
    pub fn charged_mwh(&self, time_elapsed_hr: f64) -> f64 {
        self.p_mw
            .iter()
            .filter(|p| **p > 0.0)
            .map(|p| p * time_elapsed_hr)
            .sum()
    }

    /// Energy taken out of the unit over the horizon (MWh).
    pub fn discharged_mwh(&self, time_elapsed_hr: f64) -> f64 {
        self.p_mw
            .iter()
            .filter(|p| **p < 0.0)
            .map(|p| -p * time_elapsed_hr)
            .sum()
    }
}

/// Answer of a solver for one storage problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageSolution {
    pub protocol_version: i32,

    pub status: SolutionStatus,

    /// Objective value, absent when the solver produced none.
    pub objective: Option<f64>,

    pub solve_time_ms: i64,

    /// Error message (if status is error/infeasible).
    pub error_message: Option<String>,

    /// Schedules keyed by storage id.
    pub storages: BTreeMap<i64, StorageSchedule>,
}

impl StorageSolution {
    /// Create an empty solution with error status.
    pub fn error(message: &str) -> Self {
        Self {
            protocol_version: crate::PROTOCOL_VERSION,
            status: SolutionStatus::Error,
            objective: None,
            solve_time_ms: 0,
            error_message: Some(message.to_string()),
            storages: BTreeMap::new(),
        }
    }

    pub fn infeasible(message: &str) -> Self {
        Self {
            status: SolutionStatus::Infeasible,
            ..Self::error(message)
        }
    }

    pub fn timeout(seconds: u64) -> Self {
        Self {
            status: SolutionStatus::Timeout,
            ..Self::error(&format!("Solver timed out after {} seconds", seconds))
        }
    }

    pub fn is_optimal(&self) -> bool {
        self.status.is_success()
    }

    pub fn num_storages(&self) -> usize {
        self.storages.len()
    }

    /// Check that a successful solution schedules every controllable unit
    /// of `problem` over exactly its time steps, and nothing else.
    pub fn validate_against(&self, problem: &StorageProblem) -> SolverResult<()> {
        if !self.status.is_success() {
            return Ok(());
        }

        if let Some(id) = self
            .storages
            .keys()
            .find(|&&id| !problem.storage_id.contains(&id))
        {
            return Err(SolverError::InvalidSolution(format!(
                "schedule for unknown storage {}",
                id
            )));
        }

        let steps = problem.steps();
        for id in problem.controllable_storage_ids() {
            let schedule = self.storages.get(&id).ok_or_else(|| {
                SolverError::InvalidSolution(format!("no schedule for storage {}", id))
            })?;
            if !schedule.is_aligned() {
                return Err(SolverError::InvalidSolution(format!(
                    "schedule columns of storage {} differ in length",
                    id
                )));
            }
            if schedule.step != steps {
                return Err(SolverError::InvalidSolution(format!(
                    "storage {} is scheduled for {} steps, problem has {}",
                    id,
                    schedule.len(),
                    steps.len()
                )));
            }
        }
        Ok(())
    }
}

impl Default for StorageSolution {
    fn default() -> Self {
        Self::error("No solution")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(steps: &[i64]) -> StorageSchedule {
        StorageSchedule {
            step: steps.to_vec(),
            p_mw: vec![0.2, -0.4][..steps.len()].to_vec(),
            q_mvar: vec![0.0; steps.len()],
            soc_mwh: vec![1.05, 0.95][..steps.len()].to_vec(),
            soc_percent: vec![52.5, 47.5][..steps.len()].to_vec(),
        }
    }

    fn problem() -> StorageProblem {
        serde_json::from_str(
            r#"{
            "protocol_version": 1,
            "time_elapsed_hr": 0.25,
            "n_timesteps": 2,
            "timeout_seconds": 0,
            "bus_id": [], "bus_name": [], "bus_vn_kv": [], "bus_v_min": [], "bus_v_max": [],
            "line_id": [], "line_from": [], "line_to": [], "line_length_km": [],
            "line_r_ohm_per_km": [], "line_x_ohm_per_km": [], "line_c_nf_per_km": [],
            "line_max_i_ka": [], "line_max_loading_percent": [],
            "load_id": [], "load_bus": [], "load_p_mw": [], "load_q_mvar": [],
            "gen_id": [], "gen_bus": [], "gen_p_mw": [], "gen_category": [],
            "storage_id": [3], "storage_bus": [1], "storage_max_p_mw": [0.5],
            "storage_max_e_mwh": [2.0], "storage_min_e_mwh": [0.0],
            "storage_soc_percent": [50.0], "storage_controllable": [true],
            "injection_columns": ["load 0"],
            "injections": {"0": [1.0], "1": [0.5]}
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn status_success_and_failure() {
        assert!(SolutionStatus::Optimal.is_success());
        assert!(SolutionStatus::LocallySolved.is_success());
        assert!(SolutionStatus::Infeasible.is_failure());
        assert!(!SolutionStatus::Unknown.is_failure());
        assert_eq!(SolutionStatus::IterationLimit.to_string(), "iteration_limit");
    }

    #[test]
    fn constructors_carry_messages() {
        let timeout = StorageSolution::timeout(30);
        assert_eq!(timeout.status, SolutionStatus::Timeout);
        assert!(timeout.error_message.unwrap().contains("30 seconds"));
        assert_eq!(
            StorageSolution::infeasible("soc").error_message.as_deref(),
            Some("soc")
        );
        assert!(!StorageSolution::default().is_optimal());
    }

    #[test]
    fn energy_totals_split_by_sign() {
        let s = schedule(&[0, 1]);
        assert!((s.charged_mwh(0.25) - 0.05).abs() < 1e-12);
        assert!((s.discharged_mwh(0.25) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn validate_accepts_matching_schedule() {
        let solution = StorageSolution {
            status: SolutionStatus::Optimal,
            objective: Some(1.0),
            error_message: None,
            storages: BTreeMap::from([(3, schedule(&[0, 1]))]),
            ..StorageSolution::default()
        };
        solution.validate_against(&problem()).unwrap();
    }

    #[test]
    fn validate_rejects_missing_or_short_schedules() {
        let missing = StorageSolution {
            status: SolutionStatus::Optimal,
            ..StorageSolution::default()
        };
        assert!(matches!(
            missing.validate_against(&problem()),
            Err(SolverError::InvalidSolution(_))
        ));

        let short = StorageSolution {
            status: SolutionStatus::Optimal,
            storages: BTreeMap::from([(3, schedule(&[0]))]),
            ..StorageSolution::default()
        };
        let err = short.validate_against(&problem()).unwrap_err();
        assert!(err.to_string().contains("1 steps, problem has 2"));
    }

    #[test]
    fn validate_rejects_unknown_storage() {
        let solution = StorageSolution {
            status: SolutionStatus::Optimal,
            storages: BTreeMap::from([(3, schedule(&[0, 1])), (7, schedule(&[0, 1]))]),
            ..StorageSolution::default()
        };
        let err = solution.validate_against(&problem()).unwrap_err();
        assert!(err.to_string().contains("unknown storage 7"));
    }

    #[test]
    fn failed_solutions_are_not_checked() {
        StorageSolution::infeasible("no room")
            .validate_against(&problem())
            .unwrap();
    }
}
