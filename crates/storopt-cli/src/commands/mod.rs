pub mod expand;
pub mod network;
pub mod optimize;
pub mod solvers;

use anyhow::{Context, Result};
use std::path::Path;
use storopt_core::Network;
use storopt_io::{build_cigre_mv_pv_wind, CigreMvConfig};
use storopt_ts::{expand_injections, read_profiles, GridSnapshot, InjectionMatrix, ProfileColumns};
use tracing::info;

/// The grid every command works on.
pub fn benchmark_network() -> Network {
    build_cigre_mv_pv_wind(&CigreMvConfig::default())
}

/// Read `profiles` and expand them against the load and generation points of `network`.
pub fn expand_profiles(
    network: &Network,
    profiles: &Path,
    columns: &ProfileColumns,
) -> Result<InjectionMatrix> {
    let snapshot = GridSnapshot::from_network(network).context("taking grid snapshot")?;
    let table = read_profiles(profiles, columns)
        .with_context(|| format!("reading profiles from {}", profiles.display()))?;
    info!(
        "Expanding {} profile steps over {} loads and {} generators",
        table.len(),
        snapshot.load_count(),
        snapshot.generation_count()
    );
    let matrix = expand_injections(&snapshot, &table).context("expanding profiles")?;
    Ok(matrix)
}
