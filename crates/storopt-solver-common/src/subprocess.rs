//! Subprocess management for solver plugins.
//!
//! Handles locating solver binaries and running them with the problem on
//! stdin and the solution on stdout.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Instant;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use crate::error::{ExitCode, SolverError, SolverResult};
use crate::ipc::{read_solution, write_problem};
use crate::problem::StorageProblem;
use crate::solution::StorageSolution;

/// Upper bound for a solve when no timeout is configured.
const DEFAULT_TIMEOUT_SECONDS: u64 = 3600;

/// A solver subprocess handle.
#[derive(Debug, Clone)]
pub struct SolverProcess {
    /// Display name of the solver.
    name: String,
    binary_path: PathBuf,
    /// Arguments passed before the problem is piped in.
    args: Vec<String>,
    /// Timeout for solver execution (0 = default of one hour).
    timeout_seconds: u64,
}

impl SolverProcess {
    pub fn new(name: impl Into<String>, binary_path: PathBuf, timeout_seconds: u64) -> Self {
        Self {
            name: name.into(),
            binary_path,
            args: Vec::new(),
            timeout_seconds,
        }
    }

    /// Resolve `solver` to a binary and build a handle for it.
    ///
    /// Anything that looks like a path is used as-is; a bare name goes
    /// through [`SolverProcess::find_binary`].
    pub fn resolve(solver: &str, timeout_seconds: u64) -> SolverResult<Self> {
        let candidate = Path::new(solver);
        let binary_path = if candidate.components().count() > 1 {
            if !candidate.exists() {
                return Err(SolverError::NotInstalled {
                    solver: solver.to_string(),
                    hint: candidate.display().to_string(),
                });
            }
            candidate.to_path_buf()
        } else {
            Self::find_binary(solver)?
        };
        let name = binary_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| solver.to_string());
        Ok(Self::new(name, binary_path, timeout_seconds))
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Find the solver binary in standard locations.
    ///
    /// Search order:
    /// 1. ~/.storopt/solvers/<binary_name>
    /// 2. System PATH
    pub fn find_binary(binary_name: &str) -> SolverResult<PathBuf> {
        let solvers_dir = crate::solvers_dir();

        if let Some(dir) = &solvers_dir {
            let local = dir.join(binary_name);
            if local.exists() {
                return Ok(local);
            }
        }

        if let Ok(path) = which::which(binary_name) {
            return Ok(path);
        }

        Err(SolverError::NotInstalled {
            solver: binary_name.to_string(),
            hint: solvers_dir
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| "~/.storopt/solvers".to_string()),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn binary_path(&self) -> &Path {
        &self.binary_path
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    fn timeout_duration(&self) -> Duration {
        if self.timeout_seconds > 0 {
            Duration::from_secs(self.timeout_seconds)
        } else {
            Duration::from_secs(DEFAULT_TIMEOUT_SECONDS)
        }
    }

    fn effective_timeout_seconds(&self) -> u64 {
        self.timeout_duration().as_secs()
    }

    /// Solve a problem by spawning the solver subprocess.
    ///
    /// The process is killed when it does not finish within the timeout.
    pub async fn solve(&self, problem: &StorageProblem) -> SolverResult<StorageSolution> {
        let start = Instant::now();

        let mut problem_bytes = Vec::new();
        write_problem(problem, &mut problem_bytes)?;

        info!(
            solver = %self.name,
            steps = problem.n_timesteps,
            "starting solver {}",
            self.binary_path.display()
        );
        let mut child = Command::new(&self.binary_path)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(SolverError::ProcessStart)?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| SolverError::Ipc("solver stdin is not piped".to_string()))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| SolverError::Ipc("solver stdout is not piped".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| SolverError::Ipc("solver stderr is not piped".to_string()))?;

        let result = timeout(self.timeout_duration(), async {
            // Pipes are drained while the problem is still being written
            let write = async {
                stdin
                    .write_all(&problem_bytes)
                    .await
                    .map_err(|e| SolverError::Ipc(format!("Failed to write problem: {}", e)))?;
                drop(stdin);
                Ok::<_, SolverError>(())
            };
            let read = async {
                let mut solution_bytes = Vec::new();
                stdout
                    .read_to_end(&mut solution_bytes)
                    .await
                    .map_err(|e| SolverError::Ipc(format!("Failed to read solution: {}", e)))?;
                Ok::<_, SolverError>(solution_bytes)
            };
            let read_err = async {
                let mut stderr_bytes = Vec::new();
                let _ = stderr.read_to_end(&mut stderr_bytes).await;
                stderr_bytes
            };
            let (written, solution_bytes, stderr_bytes) = tokio::join!(write, read, read_err);
            let status = child.wait().await.map_err(SolverError::ProcessStart)?;
            Ok::<_, SolverError>((written, solution_bytes, stderr_bytes, status))
        })
        .await;

        match result {
            Ok(Ok((written, solution_bytes, stderr_bytes, status))) => {
                let exit_code = ExitCode::from_raw(status.code().unwrap_or(-1));
                if !exit_code.is_success() {
                    return Err(SolverError::ProcessFailed {
                        exit_code,
                        message: String::from_utf8_lossy(&stderr_bytes).trim().to_string(),
                    });
                }
                // A solver may exit before reading all of stdin; only the
                // answer matters once it exited cleanly.
                if let Err(e) = written {
                    warn!("solver did not consume the whole problem: {}", e);
                }
                self.finish(solution_bytes?, start)
            }
            Ok(Err(e)) => Err(e),
            Err(_) => {
                let _ = child.kill().await;
                Err(SolverError::Timeout {
                    seconds: self.effective_timeout_seconds(),
                })
            }
        }
    }

    /// Solve a problem synchronously (blocking).
    ///
    /// Runs [`SolverProcess::solve`] on a current-thread tokio runtime so the
    /// timeout applies here too.
    pub fn solve_blocking(&self, problem: &StorageProblem) -> SolverResult<StorageSolution> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(SolverError::Io)?;
        runtime.block_on(self.solve(problem))
    }

    fn finish(&self, solution_bytes: Vec<u8>, start: Instant) -> SolverResult<StorageSolution> {
        if solution_bytes.is_empty() {
            return Err(SolverError::Ipc("Empty solution from solver".to_string()));
        }

        let mut solution = read_solution(&solution_bytes[..])?;
        if solution.solve_time_ms == 0 {
            solution.solve_time_ms = start.elapsed().as_millis() as i64;
        }
        debug!(
            status = %solution.status,
            storages = solution.num_storages(),
            elapsed_ms = solution.solve_time_ms,
            "solver finished"
        );
        Ok(solution)
    }
}

/// Check if a solver binary can be found.
pub fn is_solver_installed(binary_name: &str) -> bool {
    SolverProcess::find_binary(binary_name).is_ok()
}

/// Solver binaries installed under `~/.storopt/solvers`, sorted by name.
pub fn list_installed_solvers() -> Vec<PathBuf> {
    let Some(dir) = crate::solvers_dir() else {
        return Vec::new();
    };
    let Ok(entries) = std::fs::read_dir(&dir) else {
        return Vec::new();
    };
    let mut solvers: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .collect();
    solvers.sort();
    solvers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_solver_is_not_installed() {
        let err = SolverProcess::find_binary("storopt-solver-that-does-not-exist").unwrap_err();
        match err {
            SolverError::NotInstalled { solver, .. } => {
                assert_eq!(solver, "storopt-solver-that-does-not-exist")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_explicit_path_is_not_installed() {
        let err = SolverProcess::resolve("/nonexistent/dir/solver", 5).unwrap_err();
        assert!(matches!(err, SolverError::NotInstalled { .. }));
    }

    #[test]
    fn args_accumulate() {
        let process = SolverProcess::new("sh", PathBuf::from("/bin/sh"), 0)
            .with_args(["run.sh"])
            .with_args(vec!["--quiet".to_string()]);
        assert_eq!(process.args(), &["run.sh", "--quiet"]);
        assert_eq!(process.effective_timeout_seconds(), DEFAULT_TIMEOUT_SECONDS);
    }

    #[test]
    fn list_installed_does_not_panic() {
        let _installed = list_installed_solvers();
    }
}
