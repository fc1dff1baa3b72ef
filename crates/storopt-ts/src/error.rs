use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading profiles or expanding them into injections.
///
/// `ShapeMismatch` and `EmptySeries` are the two conditions of the expansion
/// itself; the remaining variants come from reading profile files.
#[derive(Debug, Error)]
pub enum ExpandError {
    /// Profiles and grid snapshot do not fit together (missing column,
    /// length mismatch, wrong generation categories, duplicate steps).
    #[error("input shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The profile table has no time steps.
    #[error("empty series: profile table has no time steps to expand")]
    EmptySeries,

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ExpandError {
    pub(crate) fn shape(message: impl Into<String>) -> Self {
        ExpandError::ShapeMismatch(message.into())
    }

    pub fn is_shape_mismatch(&self) -> bool {
        matches!(self, ExpandError::ShapeMismatch(_))
    }

    pub fn is_empty_series(&self) -> bool {
        matches!(self, ExpandError::EmptySeries)
    }
}

impl From<serde_json::Error> for ExpandError {
    fn from(err: serde_json::Error) -> Self {
        ExpandError::Parse(err.to_string())
    }
}

impl From<polars::error::PolarsError> for ExpandError {
    fn from(err: polars::error::PolarsError) -> Self {
        ExpandError::Parse(err.to_string())
    }
}

pub type ExpandResult<T> = Result<T, ExpandError>;
