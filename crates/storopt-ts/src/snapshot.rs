//! Static view of the injection entities of a grid.

use serde::Serialize;
use storopt_core::{GenCategory, Network};

use crate::error::{ExpandError, ExpandResult};

/// A load with its nominal real-power draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadPoint {
    pub name: String,
    pub nominal_mw: f64,
}

/// A renewable generator with its nominal real-power output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationPoint {
    pub name: String,
    pub nominal_mw: f64,
    /// Selects the profile curve (pv or wind) that scales this unit
    pub category: GenCategory,
}

/// Load and generation points whose count and order fix the columns of an
/// injection matrix: loads first, then generation points.
///
/// A snapshot always has at least one load, at least one generation point,
/// only photovoltaic or wind generation and exactly one wind point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridSnapshot {
    loads: Vec<LoadPoint>,
    generators: Vec<GenerationPoint>,
}

impl GridSnapshot {
    pub fn new(loads: Vec<LoadPoint>, generators: Vec<GenerationPoint>) -> ExpandResult<Self> {
        if loads.is_empty() {
            return Err(ExpandError::shape("grid snapshot has no load points"));
        }
        if generators.is_empty() {
            return Err(ExpandError::shape("grid snapshot has no generation points"));
        }
        if let Some(gen) = generators.iter().find(|g| !g.category.is_renewable()) {
            return Err(ExpandError::shape(format!(
                "generation point '{}' is {}; only pv and wind points have profiles",
                gen.name, gen.category
            )));
        }
        let wind_count = generators
            .iter()
            .filter(|g| g.category == GenCategory::Wind)
            .count();
        if wind_count != 1 {
            return Err(ExpandError::shape(format!(
                "grid snapshot needs exactly one wind generation point, found {wind_count}"
            )));
        }
        Ok(Self { loads, generators })
    }

    /// Build a snapshot from plain arrays, checking them against the declared counts.
    pub fn from_arrays(
        load_count: usize,
        generation_count: usize,
        load_nominal_mw: &[f64],
        gen_nominal_mw: &[f64],
        gen_categories: &[GenCategory],
    ) -> ExpandResult<Self> {
        if load_nominal_mw.len() != load_count {
            return Err(ExpandError::shape(format!(
                "{} load nominal values for {} declared load points",
                load_nominal_mw.len(),
                load_count
            )));
        }
        if gen_nominal_mw.len() != generation_count {
            return Err(ExpandError::shape(format!(
                "{} generation nominal values for {} declared generation points",
                gen_nominal_mw.len(),
                generation_count
            )));
        }
        if gen_categories.len() != generation_count {
            return Err(ExpandError::shape(format!(
                "{} generation categories for {} declared generation points",
                gen_categories.len(),
                generation_count
            )));
        }

        let loads = load_nominal_mw
            .iter()
            .enumerate()
            .map(|(i, &p)| LoadPoint {
                name: format!("load {i}"),
                nominal_mw: p,
            })
            .collect();
        let generators = gen_nominal_mw
            .iter()
            .zip(gen_categories)
            .enumerate()
            .map(|(i, (&p, &category))| GenerationPoint {
                name: format!("sgen {i}"),
                nominal_mw: p,
                category,
            })
            .collect();
        Self::new(loads, generators)
    }

    /// Collect in-service loads and renewable generators in graph order.
    pub fn from_network(network: &Network) -> ExpandResult<Self> {
        let loads = network
            .loads()
            .into_iter()
            .filter(|l| l.status)
            .map(|l| LoadPoint {
                name: l.name.clone(),
                nominal_mw: l.active_power.value(),
            })
            .collect();
        let generators = network
            .generators()
            .into_iter()
            .filter(|g| g.status && g.category.is_renewable())
            .map(|g| GenerationPoint {
                name: g.name.clone(),
                nominal_mw: g.active_power.value(),
                category: g.category,
            })
            .collect();
        Self::new(loads, generators)
    }

    pub fn loads(&self) -> &[LoadPoint] {
        &self.loads
    }

    pub fn generators(&self) -> &[GenerationPoint] {
        &self.generators
    }

    pub fn load_count(&self) -> usize {
        self.loads.len()
    }

    pub fn generation_count(&self) -> usize {
        self.generators.len()
    }

    /// Total number of injection columns (L + G)
    pub fn width(&self) -> usize {
        self.loads.len() + self.generators.len()
    }

    /// Position of the wind point among the generation points
    pub fn wind_position(&self) -> usize {
        self.generators
            .iter()
            .position(|g| g.category == GenCategory::Wind)
            .unwrap_or(self.generators.len() - 1)
    }

    pub fn total_load_mw(&self) -> f64 {
        self.loads.iter().map(|l| l.nominal_mw).sum()
    }

    /// Entity names in column order
    pub fn column_labels(&self) -> Vec<String> {
        self.loads
            .iter()
            .map(|l| l.name.clone())
            .chain(self.generators.iter().map(|g| g.name.clone()))
            .collect()
    }
}
