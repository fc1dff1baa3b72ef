//! # storopt-io: canned grids and result files
//!
//! - [`sources::cigre`]: the CIGRE MV benchmark with PV, wind and a battery
//! - [`exporters`]: storage schedules to CSV plus `summary.json`, injection
//!   matrices to JSON

pub mod exporters;
pub mod sources;

pub use exporters::{write_injections_json, write_storage_results, SolutionExport};
pub use sources::{build_cigre_mv_pv_wind, CigreMvConfig};
