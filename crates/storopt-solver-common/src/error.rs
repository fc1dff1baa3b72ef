//! Error types and exit codes for solver communication.

use thiserror::Error;

/// Exit codes of a solver subprocess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success (check status in solution for optimality)
    Success = 0,
    /// Problem could not be read (malformed JSON, protocol mismatch)
    InvalidInput = 1,
    /// Solver error (numerical issues, missing license, crash in the model layer)
    SolverError = 2,
    Timeout = 3,
}

impl ExitCode {
    pub fn from_raw(code: i32) -> Self {
        match code {
            0 => ExitCode::Success,
            1 => ExitCode::InvalidInput,
            3 => ExitCode::Timeout,
            // Unknown codes and signals are treated as solver errors
            _ => ExitCode::SolverError,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExitCode::Success)
    }
}

/// Errors that can occur while handing a problem to a solver and reading back
/// its answer.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The problem cannot be built from the given network and injections.
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    #[error("Solver {solver} is not installed; put it on PATH or in {hint}")]
    NotInstalled { solver: String, hint: String },

    #[error("Failed to start solver process: {0}")]
    ProcessStart(#[source] std::io::Error),

    #[error("Solver process failed with exit code {exit_code:?}: {message}")]
    ProcessFailed { exit_code: ExitCode, message: String },

    #[error("Solver timed out after {seconds} seconds")]
    Timeout { seconds: u64 },

    /// Pipe communication error.
    #[error("IPC error: {0}")]
    Ipc(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Protocol version mismatch: expected {expected}, found {found}")]
    ProtocolMismatch { expected: i32, found: i32 },

    /// The solver answered with something that does not fit the problem.
    #[error("Invalid solution: {0}")]
    InvalidSolution(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for solver operations.
pub type SolverResult<T> = Result<T, SolverError>;
