//! Configuration for storopt runs.
//! Lives in ~/.storopt/config.toml; every field has a default.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use storopt_solver_common::{storopt_home, DEFAULT_SOLVER};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StoroptConfig {
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub optimization: OptimizationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// External solver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SolverConfig {
    /// Solver binary name or path
    #[serde(default = "default_solver")]
    pub default: String,
    /// Solver timeout in seconds (0 = one hour)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            default: default_solver(),
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_solver() -> String {
    DEFAULT_SOLVER.to_string()
}

fn default_timeout() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OptimizationConfig {
    /// Hours per profile step (0.25 for 15-minute data)
    #[serde(default = "default_time_elapsed")]
    pub time_elapsed_hr: f64,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            time_elapsed_hr: default_time_elapsed(),
        }
    }
}

fn default_time_elapsed() -> f64 {
    0.25
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl LoggingConfig {
    pub fn tracing_level(&self) -> Result<tracing::Level> {
        self.level
            .parse()
            .map_err(|_| anyhow!("invalid log level '{}' in config", self.level))
    }
}

/// Location: ~/.storopt/config.toml
pub fn config_path() -> Result<PathBuf> {
    storopt_home()
        .map(|home| home.join("config.toml"))
        .ok_or_else(|| anyhow!("Cannot determine home directory"))
}

/// Load the configuration.
///
/// An explicit `path` must exist; the default location may be missing, in
/// which case defaults apply.
pub fn load_config(path: Option<&Path>) -> Result<StoroptConfig> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => match config_path() {
            Ok(path) if path.exists() => path,
            _ => return Ok(StoroptConfig::default()),
        },
    };
    let contents = std::fs::read_to_string(&path)
        .with_context(|| format!("reading config {}", path.display()))?;
    parse_config(&contents).with_context(|| format!("parsing config {}", path.display()))
}

pub fn parse_config(contents: &str) -> Result<StoroptConfig> {
    Ok(toml::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn empty_config_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config, StoroptConfig::default());
        assert_eq!(config.solver.default, DEFAULT_SOLVER);
        assert_eq!(config.optimization.time_elapsed_hr, 0.25);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = parse_config(
            r#"
            [solver]
            timeout_seconds = 60

            [logging]
            level = "debug"
            "#,
        )
        .unwrap();
        assert_eq!(config.solver.timeout_seconds, 60);
        assert_eq!(config.solver.default, DEFAULT_SOLVER);
        assert_eq!(config.logging.tracing_level().unwrap(), tracing::Level::DEBUG);
    }

    #[test]
    fn bad_log_level_is_reported() {
        let config = parse_config("[logging]\nlevel = \"loud\"\n").unwrap();
        assert!(config.logging.tracing_level().is_err());
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let err = load_config(Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(format!("{err:#}").contains("nope.toml"));
    }

    #[test]
    fn explicit_file_is_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("storopt.toml");
        std::fs::write(&path, "[optimization]\ntime_elapsed_hr = 1.0\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.optimization.time_elapsed_hr, 1.0);
    }
}
