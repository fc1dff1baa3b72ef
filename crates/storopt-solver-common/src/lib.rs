//! Problem and solution types plus the stdin/stdout protocol between
//! `storopt` and external storage solvers.
//!
//! The optimizer itself lives outside this workspace. `storopt` builds a
//! [`StorageProblem`] from the grid and its injection matrix, writes it as
//! JSON to the solver's stdin, and reads a [`StorageSolution`] back from
//! stdout:
//!
//! ```text
//! storopt ──stdin──> storopt-powermodels (subprocess)
//!         <─stdout──
//!         <─stderr── (logs/errors)
//! ```
//!
//! The protocol is versioned; breaking changes increment
//! [`PROTOCOL_VERSION`].

use std::path::PathBuf;

pub mod error;
pub mod ipc;
pub mod plugin;
pub mod problem;
pub mod solution;
pub mod subprocess;

pub use error::{ExitCode, SolverError, SolverResult};
pub use plugin::{run_plugin, run_solver_plugin, SolverPlugin};
pub use problem::{ProblemSettings, StorageProblem};
pub use solution::{SolutionStatus, StorageSchedule, StorageSolution};
pub use subprocess::{is_solver_installed, list_installed_solvers, SolverProcess};

/// Protocol version for IPC compatibility checking.
pub const PROTOCOL_VERSION: i32 = 1;

/// Solver binary used when neither the command line nor the config names one.
pub const DEFAULT_SOLVER: &str = "storopt-powermodels";

/// Per-user directory holding config and installed solvers.
pub fn storopt_home() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".storopt"))
}

/// `~/.storopt/solvers`, searched before `PATH`.
pub fn solvers_dir() -> Option<PathBuf> {
    storopt_home().map(|home| home.join("solvers"))
}
