//! Expansion of profile curves into a dense injection matrix.
//!
//! Every load column scales its nominal draw with the residential factor;
//! every generation column scales its nominal output with the pv or wind
//! factor, chosen by the point's category, and flips the sign:
//!
//! ```text
//! matrix[t][i]     =  load_nominal[i] * residential[t]
//! matrix[t][L + j] = -gen_nominal[j]  * (pv[t] | wind[t])
//! ```
//!
//! Factors are used as given; no clipping or range check is applied.

use std::borrow::Cow;

use storopt_core::GenCategory;
use tracing::debug;

use crate::{
    error::{ExpandError, ExpandResult},
    matrix::InjectionMatrix,
    profile::{ProfileRow, ProfileTable},
    snapshot::GridSnapshot,
};

/// Expand `profiles` against `snapshot` into a T × (L+G) injection matrix.
///
/// Unsorted profile tables are stably sorted by step first. Fails with
/// [`ExpandError::EmptySeries`] for an empty table and with
/// [`ExpandError::ShapeMismatch`] when two rows share a step.
pub fn expand_injections(
    snapshot: &GridSnapshot,
    profiles: &ProfileTable,
) -> ExpandResult<InjectionMatrix> {
    if profiles.is_empty() {
        return Err(ExpandError::EmptySeries);
    }

    let profiles: Cow<'_, ProfileTable> = if profiles.is_sorted() {
        Cow::Borrowed(profiles)
    } else {
        debug!("profile table is not sorted by step; sorting");
        Cow::Owned(profiles.clone().sorted())
    };

    if let Some(pair) = profiles.rows().windows(2).find(|w| w[0].step == w[1].step) {
        return Err(ExpandError::shape(format!(
            "time step {} appears more than once in the profile table",
            pair[0].step
        )));
    }

    let n_loads = snapshot.load_count();
    let mut matrix = InjectionMatrix::zeros(
        profiles.steps().collect(),
        snapshot.column_labels(),
        n_loads,
    );

    for (t, row) in profiles.rows().iter().enumerate() {
        let out = matrix.row_mut(t);
        for (cell, load) in out[..n_loads].iter_mut().zip(snapshot.loads()) {
            *cell = load.nominal_mw * row.residential;
        }
        for (cell, gen) in out[n_loads..].iter_mut().zip(snapshot.generators()) {
            *cell = -gen.nominal_mw * generation_factor(gen.category, row);
        }
    }

    debug!(
        steps = matrix.n_steps(),
        loads = n_loads,
        generators = snapshot.generation_count(),
        "expanded profiles into injection matrix"
    );
    Ok(matrix)
}

fn generation_factor(category: GenCategory, row: &ProfileRow) -> f64 {
    match category {
        GenCategory::Wind => row.wind,
        // Snapshots only hold renewable points
        GenCategory::Photovoltaic | GenCategory::Conventional => row.pv,
    }
}
