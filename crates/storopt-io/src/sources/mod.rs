pub mod cigre;

pub use cigre::{build_cigre_mv_pv_wind, CigreMvConfig, CIGRE_MV_BUS_COUNT};
