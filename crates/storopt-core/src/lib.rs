//! # storopt-core: distribution grid model
//!
//! Data structures for the static grid handed to a multi-period storage
//! optimization.
//!
//! Networks are **undirected graphs** where:
//! - **Nodes**: buses, loads, generators (external supply, PV, wind) and storage units
//! - **Edges**: lines between buses
//!
//! ```rust
//! use storopt_core::*;
//!
//! let mut network = Network::new();
//! let hv = network.graph.add_node(Node::Bus(Bus {
//!     id: BusId::new(0),
//!     name: "HV".to_string(),
//!     base_kv: Kilovolts(110.0),
//!     ..Bus::default()
//! }));
//! let mv = network.graph.add_node(Node::Bus(Bus {
//!     id: BusId::new(1),
//!     name: "MV 1".to_string(),
//!     base_kv: Kilovolts(20.0),
//!     ..Bus::default()
//! }));
//! network.graph.add_edge(hv, mv, Edge::Branch(Branch::new(
//!     BranchId::new(0),
//!     "Line 0-1".to_string(),
//!     BusId::new(0),
//!     BusId::new(1),
//! )));
//! network.graph.add_node(Node::Gen(
//!     Gen::new(GenId::new(0), "PV 1".to_string(), BusId::new(1))
//!         .with_category(GenCategory::Photovoltaic)
//!         .with_active_power(0.02),
//! ));
//! network.graph.add_node(Node::Storage(
//!     Storage::new(StorageId::new(0), "Battery".to_string(), BusId::new(1))
//!         .with_rating(0.5, 2.0)
//!         .controllable(),
//! ));
//!
//! assert_eq!(network.stats().num_gens, 1);
//! assert_eq!(network.controllable_storages().len(), 1);
//! ```

use petgraph::{prelude::*, Undirected};
use serde::{Deserialize, Serialize};

pub mod diagnostics;
pub mod error;
pub mod units;

pub use diagnostics::{DiagnosticIssue, Diagnostics, Severity};
pub use error::{GridError, GridResult};
pub use petgraph::graph::NodeIndex;
pub use units::{Kilovolts, MegawattHours, Megavars, Megawatts, PerUnit, Percent};

// Newtype wrappers for IDs for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BusId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BranchId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GenId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LoadId(usize);
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageId(usize);

macro_rules! impl_id {
    ($type:ident) => {
        impl $type {
            #[inline]
            pub fn new(value: usize) -> Self {
                $type(value)
            }
            #[inline]
            pub fn value(&self) -> usize {
                self.0
            }
        }

        impl std::fmt::Display for $type {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

impl_id!(BusId);
impl_id!(BranchId);
impl_id!(GenId);
impl_id!(LoadId);
impl_id!(StorageId);

#[derive(Debug, Clone)]
pub struct Bus {
    pub id: BusId,
    pub name: String,
    /// Nominal voltage in kilovolts
    pub base_kv: Kilovolts,
    /// Minimum voltage limit in per-unit
    pub vmin_pu: Option<PerUnit>,
    /// Maximum voltage limit in per-unit
    pub vmax_pu: Option<PerUnit>,
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            id: BusId(0),
            name: String::new(),
            base_kv: Kilovolts(0.0),
            vmin_pu: None,
            vmax_pu: None,
        }
    }
}

/// A line between two buses, parameterized per kilometre.
#[derive(Debug, Clone)]
pub struct Branch {
    pub id: BranchId,
    pub name: String,
    pub from_bus: BusId,
    pub to_bus: BusId,
    pub length_km: f64,
    pub r_ohm_per_km: f64,
    pub x_ohm_per_km: f64,
    pub c_nf_per_km: f64,
    /// Thermal current limit (kA), infinite when the line is unrated
    pub max_i_ka: f64,
    /// Loading limit the optimizer should respect
    pub max_loading_percent: Option<Percent>,
    pub status: bool,
}

impl Default for Branch {
    fn default() -> Self {
        Self {
            id: BranchId(0),
            name: String::new(),
            from_bus: BusId(0),
            to_bus: BusId(0),
            length_km: 1.0,
            r_ohm_per_km: 0.0,
            x_ohm_per_km: 0.0,
            c_nf_per_km: 0.0,
            max_i_ka: f64::INFINITY,
            max_loading_percent: None,
            status: true,
        }
    }
}

impl Branch {
    pub fn new(id: BranchId, name: String, from_bus: BusId, to_bus: BusId) -> Self {
        Self {
            id,
            name,
            from_bus,
            to_bus,
            ..Self::default()
        }
    }
}

/// Kind of generation behind a [`Gen`].
///
/// Renewable categories select which profile curve drives the unit over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenCategory {
    /// Dispatchable supply such as the external grid connection
    #[default]
    Conventional,
    Photovoltaic,
    Wind,
}

impl GenCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            GenCategory::Conventional => "conventional",
            GenCategory::Photovoltaic => "pv",
            GenCategory::Wind => "wind",
        }
    }

    pub fn is_renewable(&self) -> bool {
        !matches!(self, GenCategory::Conventional)
    }
}

impl std::fmt::Display for GenCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Gen {
    pub id: GenId,
    pub name: String,
    pub bus: BusId,
    /// Nominal active power output (MW)
    pub active_power: Megawatts,
    /// Nominal reactive power output (Mvar)
    pub reactive_power: Megavars,
    pub pmin: Megawatts,
    pub pmax: Megawatts,
    pub category: GenCategory,
    /// In-service status
    pub status: bool,
}

impl Default for Gen {
    fn default() -> Self {
        Self {
            id: GenId(0),
            name: String::new(),
            bus: BusId(0),
            active_power: Megawatts(0.0),
            reactive_power: Megavars(0.0),
            pmin: Megawatts(0.0),
            pmax: Megawatts(f64::INFINITY),
            category: GenCategory::Conventional,
            status: true,
        }
    }
}

impl Gen {
    /// Create a new in-service conventional generator with no limits
    pub fn new(id: GenId, name: String, bus: BusId) -> Self {
        Self {
            id,
            name,
            bus,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: GenCategory) -> Self {
        self.category = category;
        self
    }

    /// Set nominal active power (in MW)
    pub fn with_active_power(mut self, p_mw: f64) -> Self {
        self.active_power = Megawatts(p_mw);
        self
    }

    /// Set active power limits (in MW)
    pub fn with_p_limits(mut self, pmin: f64, pmax: f64) -> Self {
        self.pmin = Megawatts(pmin);
        self.pmax = Megawatts(pmax);
        self
    }
}

#[derive(Debug, Clone)]
pub struct Load {
    pub id: LoadId,
    pub name: String,
    pub bus: BusId,
    /// Nominal active power demand (MW)
    pub active_power: Megawatts,
    /// Nominal reactive power demand (Mvar)
    pub reactive_power: Megavars,
    pub status: bool,
}

/// Battery storage connected to a bus.
///
/// Positive power means charging (consumption), following the load sign
/// convention used for the injection matrix.
#[derive(Debug, Clone)]
pub struct Storage {
    pub id: StorageId,
    pub name: String,
    pub bus: BusId,
    /// Charge/discharge power rating
    pub max_p: Megawatts,
    pub max_q: Megavars,
    /// Usable energy capacity
    pub max_e: MegawattHours,
    /// Energy floor the optimizer must not discharge below
    pub min_e: MegawattHours,
    /// State of charge at the first time step
    pub soc_percent: Percent,
    /// Subject to optimization by the external solver
    pub controllable: bool,
    pub status: bool,
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            id: StorageId(0),
            name: String::new(),
            bus: BusId(0),
            max_p: Megawatts(0.0),
            max_q: Megavars(0.0),
            max_e: MegawattHours(0.0),
            min_e: MegawattHours(0.0),
            soc_percent: Percent(0.0),
            controllable: false,
            status: true,
        }
    }
}

impl Storage {
    pub fn new(id: StorageId, name: String, bus: BusId) -> Self {
        Self {
            id,
            name,
            bus,
            ..Self::default()
        }
    }

    /// Set power (MW) and energy (MWh) ratings
    pub fn with_rating(mut self, max_p_mw: f64, max_e_mwh: f64) -> Self {
        self.max_p = Megawatts(max_p_mw);
        self.max_e = MegawattHours(max_e_mwh);
        self
    }

    pub fn with_soc_percent(mut self, soc: f64) -> Self {
        self.soc_percent = Percent(soc);
        self
    }

    pub fn controllable(mut self) -> Self {
        self.controllable = true;
        self
    }

    /// Energy stored at the first time step
    pub fn initial_energy(&self) -> MegawattHours {
        self.soc_percent.of(self.max_e)
    }
}

#[derive(Debug, Clone)]
pub enum Node {
    Bus(Bus),
    Gen(Gen),
    Load(Load),
    Storage(Storage),
}

#[derive(Debug, Clone)]
pub enum Edge {
    Branch(Branch),
}

/// The core power network graph
#[derive(Debug, Default, Clone)]
pub struct Network {
    pub graph: Graph<Node, Edge, Undirected>,
}

impl Network {
    pub fn new() -> Self {
        Self {
            graph: Graph::new_undirected(),
        }
    }

    /// Compute basic statistics about the network
    pub fn stats(&self) -> NetworkStats {
        let mut stats = NetworkStats::default();

        for node in self.graph.node_weights() {
            match node {
                Node::Bus(_) => stats.num_buses += 1,
                Node::Gen(g) => {
                    stats.num_gens += 1;
                    if g.category.is_renewable() {
                        stats.total_der_mw += g.active_power.value();
                    }
                }
                Node::Load(l) => {
                    stats.num_loads += 1;
                    stats.total_load_mw += l.active_power.value();
                }
                Node::Storage(s) => {
                    stats.num_storages += 1;
                    stats.total_storage_mwh += s.max_e.value();
                }
            }
        }

        stats.num_branches = self.graph.edge_count();
        stats
    }

    /// Validate network data for issues that make it unusable for a storage run.
    pub fn validate_into(&self, diag: &mut Diagnostics) {
        let stats = self.stats();

        if stats.num_buses == 0 {
            diag.add_error("structure", "Network has no buses");
            return;
        }

        if stats.num_loads == 0 {
            diag.add_warning("structure", "Network has no loads");
        }

        if stats.num_gens == 0 {
            diag.add_error("structure", "Network has no generators");
        }

        if stats.num_branches == 0 && stats.num_buses > 1 {
            diag.add_error("structure", "Network has multiple buses but no branches");
        }

        let bus_ids: std::collections::HashSet<BusId> =
            self.buses().iter().map(|b| b.id).collect();
        for node in self.graph.node_weights() {
            let bus = match node {
                Node::Bus(_) => continue,
                Node::Gen(g) => g.bus,
                Node::Load(l) => l.bus,
                Node::Storage(s) => s.bus,
            };
            if !bus_ids.contains(&bus) {
                diag.add_error_with_entity(
                    "reference",
                    &format!("References unknown bus {}", bus),
                    node.label(),
                );
            }
        }

        for storage in self.storages() {
            if storage.max_e.value() <= 0.0 {
                diag.add_error_with_entity(
                    "storage",
                    "Energy capacity must be positive",
                    &storage.name,
                );
            }
            if storage.min_e > storage.max_e {
                diag.add_error_with_entity(
                    "storage",
                    "Minimum energy exceeds capacity",
                    &storage.name,
                );
            }
            if !(0.0..=100.0).contains(&storage.soc_percent.value()) {
                diag.add_error_with_entity(
                    "storage",
                    &format!(
                        "Initial state of charge {} is outside 0-100 %",
                        storage.soc_percent.value()
                    ),
                    &storage.name,
                );
            }
        }

        if self.controllable_storages().is_empty() {
            diag.add_warning("storage", "Network has no controllable storage");
        }
    }

    /// Get total nominal load (MW)
    pub fn total_load_mw(&self) -> f64 {
        self.loads()
            .iter()
            .filter(|l| l.status)
            .map(|l| l.active_power.value())
            .sum()
    }

    pub fn buses(&self) -> Vec<&Bus> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Bus(b) => Some(b),
                _ => None,
            })
            .collect()
    }

    /// All loads in graph insertion order
    pub fn loads(&self) -> Vec<&Load> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Load(l) => Some(l),
                _ => None,
            })
            .collect()
    }

    /// All generators in graph insertion order
    pub fn generators(&self) -> Vec<&Gen> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Gen(g) => Some(g),
                _ => None,
            })
            .collect()
    }

    pub fn storages(&self) -> Vec<&Storage> {
        self.graph
            .node_weights()
            .filter_map(|n| match n {
                Node::Storage(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    /// In-service storage units flagged for optimization
    pub fn controllable_storages(&self) -> Vec<&Storage> {
        self.storages()
            .into_iter()
            .filter(|s| s.controllable && s.status)
            .collect()
    }

    pub fn branches(&self) -> Vec<&Branch> {
        self.graph
            .edge_weights()
            .map(|e| match e {
                Edge::Branch(b) => b,
            })
            .collect()
    }
}

/// Statistics about a network's size and capacity
#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkStats {
    pub num_buses: usize,
    pub num_gens: usize,
    pub num_loads: usize,
    pub num_storages: usize,
    pub num_branches: usize,
    pub total_load_mw: f64,
    pub total_der_mw: f64,
    pub total_storage_mwh: f64,
}

impl std::fmt::Display for NetworkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} buses, {} lines, {} loads ({:.2} MW), {} gens ({:.2} MW DER), {} storage ({:.2} MWh)",
            self.num_buses,
            self.num_branches,
            self.num_loads,
            self.total_load_mw,
            self.num_gens,
            self.total_der_mw,
            self.num_storages,
            self.total_storage_mwh
        )
    }
}

impl Node {
    /// Returns a human-readable label for the node.
    pub fn label(&self) -> &str {
        match self {
            Node::Bus(bus) => &bus.name,
            Node::Gen(gen) => &gen.name,
            Node::Load(load) => &load.name,
            Node::Storage(storage) => &storage.name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus(id: usize, name: &str) -> Node {
        Node::Bus(Bus {
            id: BusId::new(id),
            name: name.to_string(),
            base_kv: Kilovolts(20.0),
            ..Bus::default()
        })
    }

    fn two_bus_network() -> Network {
        let mut network = Network::new();
        let b0 = network.graph.add_node(bus(0, "Bus 0"));
        let b1 = network.graph.add_node(bus(1, "Bus 1"));
        network.graph.add_edge(
            b0,
            b1,
            Edge::Branch(Branch::new(
                BranchId::new(0),
                "Line 0-1".to_string(),
                BusId::new(0),
                BusId::new(1),
            )),
        );
        network.graph.add_node(Node::Gen(Gen::new(
            GenId::new(0),
            "Grid".to_string(),
            BusId::new(0),
        )));
        network.graph.add_node(Node::Load(Load {
            id: LoadId::new(0),
            name: "Load 1".to_string(),
            bus: BusId::new(1),
            active_power: Megawatts(2.0),
            reactive_power: Megavars(0.5),
            status: true,
        }));
        network
    }

    #[test]
    fn test_network_validation_empty() {
        let network = Network::new();
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(diag.has_errors());
        assert!(diag.errors().any(|i| i.message.contains("no buses")));
    }

    #[test]
    fn test_network_without_storage_only_warns() {
        let network = two_bus_network();
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(!diag.has_errors(), "{diag}");
        assert!(diag
            .warnings()
            .any(|i| i.message.contains("no controllable storage")));
    }

    #[test]
    fn test_storage_checks() {
        let mut network = two_bus_network();
        network.graph.add_node(Node::Storage(
            Storage::new(StorageId::new(0), "Battery".to_string(), BusId::new(1))
                .with_rating(0.5, 0.0)
                .with_soc_percent(120.0)
                .controllable(),
        ));
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert_eq!(diag.error_count(), 2);
        assert!(diag.errors().all(|i| i.entity.as_deref() == Some("Battery")));
    }

    #[test]
    fn test_dangling_bus_reference() {
        let mut network = two_bus_network();
        network.graph.add_node(Node::Gen(
            Gen::new(GenId::new(1), "PV lost".to_string(), BusId::new(9))
                .with_category(GenCategory::Photovoltaic),
        ));
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(diag
            .errors()
            .any(|i| i.category == "reference" && i.entity.as_deref() == Some("PV lost")));
    }

    #[test]
    fn test_network_stats() {
        let mut network = two_bus_network();
        network.graph.add_node(Node::Gen(
            Gen::new(GenId::new(1), "WKA".to_string(), BusId::new(1))
                .with_category(GenCategory::Wind)
                .with_active_power(1.5),
        ));
        network.graph.add_node(Node::Storage(
            Storage::new(StorageId::new(0), "Battery".to_string(), BusId::new(1))
                .with_rating(0.5, 2.0),
        ));

        let stats = network.stats();
        assert_eq!(stats.num_buses, 2);
        assert_eq!(stats.num_gens, 2);
        assert_eq!(stats.num_loads, 1);
        assert_eq!(stats.num_storages, 1);
        assert_eq!(stats.num_branches, 1);
        assert!((stats.total_load_mw - 2.0).abs() < 1e-9);
        assert!((stats.total_der_mw - 1.5).abs() < 1e-9);
        assert!(network.controllable_storages().is_empty());
    }

    #[test]
    fn test_storage_initial_energy() {
        let storage = Storage::new(StorageId::new(0), "B".to_string(), BusId::new(0))
            .with_rating(1.0, 4.0)
            .with_soc_percent(25.0);
        assert_eq!(storage.initial_energy(), MegawattHours(1.0));
    }
}
