//! Time-series side of a storage run: profile ingestion and expansion of
//! profile curves into the per-step injection matrix handed to the optimizer.

pub mod error;
pub mod expander;
pub mod matrix;
pub mod profile;
pub mod snapshot;

pub use error::{ExpandError, ExpandResult};
pub use expander::expand_injections;
pub use matrix::InjectionMatrix;
pub use profile::{
    profiles_from_frame, profiles_from_json, read_profiles, ProfileColumns, ProfileRow,
    ProfileTable,
};
pub use snapshot::{GenerationPoint, GridSnapshot, LoadPoint};
