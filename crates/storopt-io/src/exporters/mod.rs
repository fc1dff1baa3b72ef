//! Writers for run artifacts: storage schedules and injection matrices.

pub mod injections;
pub mod storage;

use std::path::Path;

use anyhow::Result;

pub use injections::write_injections_json;
pub use storage::{
    schedule_frame, storage_file_name, write_storage_results, ResultSummary, StorageSummary,
    SUMMARY_FILE,
};

/// Uniform export of solver output to files.
pub trait SolutionExport {
    fn to_csv(&self, path: &Path) -> Result<()>;
}
