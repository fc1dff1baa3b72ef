use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::Path;
use storopt_cli::ProfileColumnArgs;
use storopt_io::write_injections_json;
use tracing::info;

use super::{benchmark_network, expand_profiles};

pub fn handle(profiles: &Path, out: Option<&Path>, columns: &ProfileColumnArgs) -> Result<()> {
    let network = benchmark_network();
    let matrix = expand_profiles(&network, profiles, &columns.into())?;

    match out {
        Some(path) => {
            write_injections_json(path, &matrix)?;
            info!(
                "Wrote {} steps x {} columns to {}",
                matrix.n_steps(),
                matrix.n_columns(),
                path.display()
            );
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            matrix
                .write_json(&mut handle)
                .context("writing injections to stdout")?;
            writeln!(handle)?;
        }
    }
    Ok(())
}
