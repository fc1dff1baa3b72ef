use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use storopt_ts::InjectionMatrix;
use tracing::debug;

/// Write the step-keyed injection map of `matrix` to `path` as JSON.
pub fn write_injections_json(path: &Path, matrix: &InjectionMatrix) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    matrix
        .write_json(&mut writer)
        .with_context(|| format!("writing injections to {}", path.display()))?;
    writer.flush()?;
    debug!(
        path = %path.display(),
        steps = matrix.n_steps(),
        columns = matrix.n_columns(),
        "wrote injection matrix"
    );
    Ok(())
}
