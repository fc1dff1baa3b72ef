//! Problem representation sent from storopt to a storage solver.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use storopt_core::{Edge, Network, Node};
use storopt_ts::InjectionMatrix;

use crate::error::{SolverError, SolverResult};

/// Knobs of a multi-period storage run that are not part of the grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProblemSettings {
    /// Duration of one time step in hours (0.25 for 15-minute profiles)
    pub time_elapsed_hr: f64,
    /// Timeout the solver should honour (0 = none)
    pub timeout_seconds: u64,
}

impl Default for ProblemSettings {
    fn default() -> Self {
        Self {
            time_elapsed_hr: 0.25,
            timeout_seconds: 0,
        }
    }
}

/// Everything a solver needs for one multi-period storage optimization.
///
/// Grid elements are flattened into columns; the injection map carries the
/// per-step load and generation values keyed by time step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageProblem {
    /// Protocol version for compatibility checking.
    pub protocol_version: i32,

    /// Hours covered by each time step.
    pub time_elapsed_hr: f64,

    pub n_timesteps: usize,

    /// Timeout in seconds (0 = no timeout).
    pub timeout_seconds: u64,

    // === Bus data ===
    pub bus_id: Vec<i64>,
    pub bus_name: Vec<String>,
    /// Nominal voltage (kV).
    pub bus_vn_kv: Vec<f64>,
    /// Minimum voltage magnitude (p.u.), `None` when unconstrained.
    pub bus_v_min: Vec<Option<f64>>,
    /// Maximum voltage magnitude (p.u.), `None` when unconstrained.
    pub bus_v_max: Vec<Option<f64>>,

    // === Line data ===
    pub line_id: Vec<i64>,
    pub line_from: Vec<i64>,
    pub line_to: Vec<i64>,
    pub line_length_km: Vec<f64>,
    pub line_r_ohm_per_km: Vec<f64>,
    pub line_x_ohm_per_km: Vec<f64>,
    pub line_c_nf_per_km: Vec<f64>,
    /// Thermal current limit (kA), `None` when unlimited.
    pub line_max_i_ka: Vec<Option<f64>>,
    /// Loading limit in percent, 100 when none is given.
    pub line_max_loading_percent: Vec<f64>,

    // === Load data ===
    pub load_id: Vec<i64>,
    pub load_bus: Vec<i64>,
    pub load_p_mw: Vec<f64>,
    pub load_q_mvar: Vec<f64>,

    // === Generator data ===
    pub gen_id: Vec<i64>,
    pub gen_bus: Vec<i64>,
    pub gen_p_mw: Vec<f64>,
    /// `conventional`, `pv` or `wind`.
    pub gen_category: Vec<String>,

    // === Storage data ===
    pub storage_id: Vec<i64>,
    pub storage_bus: Vec<i64>,
    pub storage_max_p_mw: Vec<f64>,
    pub storage_max_e_mwh: Vec<f64>,
    pub storage_min_e_mwh: Vec<f64>,
    pub storage_soc_percent: Vec<f64>,
    pub storage_controllable: Vec<bool>,

    // === Time series ===
    /// Entity names for the columns of each injection row.
    pub injection_columns: Vec<String>,
    /// Step index to flattened injection row (MW).
    pub injections: BTreeMap<i64, Vec<f64>>,
}

impl StorageProblem {
    /// Assemble a problem from a grid and its expanded injections.
    pub fn build(
        network: &Network,
        injections: &InjectionMatrix,
        settings: &ProblemSettings,
    ) -> SolverResult<Self> {
        if injections.n_steps() == 0 {
            return Err(SolverError::InvalidProblem(
                "injection matrix has no time steps".to_string(),
            ));
        }
        if !(settings.time_elapsed_hr > 0.0) {
            return Err(SolverError::InvalidProblem(format!(
                "time step duration must be positive, got {} h",
                settings.time_elapsed_hr
            )));
        }
        if network.controllable_storages().is_empty() {
            return Err(SolverError::InvalidProblem(
                "network has no controllable storage to optimize".to_string(),
            ));
        }

        check_finite_injections(injections)?;

        let mut problem = Self::empty(settings);
        problem.n_timesteps = injections.n_steps();
        problem.injection_columns = injections.columns().to_vec();
        problem.injections = injections.to_step_map();

        for node in network.graph.node_weights() {
            match node {
                Node::Bus(bus) => {
                    problem.bus_id.push(bus.id.value() as i64);
                    problem.bus_name.push(bus.name.clone());
                    problem.bus_vn_kv.push(bus.base_kv.value());
                    problem.bus_v_min.push(bus.vmin_pu.map(|v| v.value()));
                    problem.bus_v_max.push(bus.vmax_pu.map(|v| v.value()));
                }
                Node::Load(load) if load.status => {
                    problem.load_id.push(load.id.value() as i64);
                    problem.load_bus.push(load.bus.value() as i64);
                    problem.load_p_mw.push(load.active_power.value());
                    problem.load_q_mvar.push(load.reactive_power.value());
                }
                Node::Gen(gen) if gen.status => {
                    problem.gen_id.push(gen.id.value() as i64);
                    problem.gen_bus.push(gen.bus.value() as i64);
                    problem.gen_p_mw.push(gen.active_power.value());
                    problem.gen_category.push(gen.category.as_str().to_string());
                }
                Node::Storage(storage) if storage.status => {
                    problem.storage_id.push(storage.id.value() as i64);
                    problem.storage_bus.push(storage.bus.value() as i64);
                    problem.storage_max_p_mw.push(storage.max_p.value());
                    problem.storage_max_e_mwh.push(storage.max_e.value());
                    problem.storage_min_e_mwh.push(storage.min_e.value());
                    problem
                        .storage_soc_percent
                        .push(storage.soc_percent.value());
                    problem.storage_controllable.push(storage.controllable);
                }
                _ => {}
            }
        }

        for edge in network.graph.edge_weights() {
            let Edge::Branch(line) = edge;
            if !line.status {
                continue;
            }
            problem.line_id.push(line.id.value() as i64);
            problem.line_from.push(line.from_bus.value() as i64);
            problem.line_to.push(line.to_bus.value() as i64);
            problem.line_length_km.push(line.length_km);
            problem.line_r_ohm_per_km.push(line.r_ohm_per_km);
            problem.line_x_ohm_per_km.push(line.x_ohm_per_km);
            problem.line_c_nf_per_km.push(line.c_nf_per_km);
            problem
                .line_max_i_ka
                .push(line.max_i_ka.is_finite().then_some(line.max_i_ka));
            problem
                .line_max_loading_percent
                .push(line.max_loading_percent.map_or(100.0, |p| p.value()));
        }

        Ok(problem)
    }

    fn empty(settings: &ProblemSettings) -> Self {
        Self {
            protocol_version: crate::PROTOCOL_VERSION,
            time_elapsed_hr: settings.time_elapsed_hr,
            n_timesteps: 0,
            timeout_seconds: settings.timeout_seconds,
            bus_id: Vec::new(),
            bus_name: Vec::new(),
            bus_vn_kv: Vec::new(),
            bus_v_min: Vec::new(),
            bus_v_max: Vec::new(),
            line_id: Vec::new(),
            line_from: Vec::new(),
            line_to: Vec::new(),
            line_length_km: Vec::new(),
            line_r_ohm_per_km: Vec::new(),
            line_x_ohm_per_km: Vec::new(),
            line_c_nf_per_km: Vec::new(),
            line_max_i_ka: Vec::new(),
            line_max_loading_percent: Vec::new(),
            load_id: Vec::new(),
            load_bus: Vec::new(),
            load_p_mw: Vec::new(),
            load_q_mvar: Vec::new(),
            gen_id: Vec::new(),
            gen_bus: Vec::new(),
            gen_p_mw: Vec::new(),
            gen_category: Vec::new(),
            storage_id: Vec::new(),
            storage_bus: Vec::new(),
            storage_max_p_mw: Vec::new(),
            storage_max_e_mwh: Vec::new(),
            storage_min_e_mwh: Vec::new(),
            storage_soc_percent: Vec::new(),
            storage_controllable: Vec::new(),
            injection_columns: Vec::new(),
            injections: BTreeMap::new(),
        }
    }

    pub fn num_buses(&self) -> usize {
        self.bus_id.len()
    }

    pub fn num_lines(&self) -> usize {
        self.line_id.len()
    }

    /// Ids of the storage units the solver is expected to schedule.
    pub fn controllable_storage_ids(&self) -> Vec<i64> {
        self.storage_id
            .iter()
            .zip(&self.storage_controllable)
            .filter(|(_, &controllable)| controllable)
            .map(|(&id, _)| id)
            .collect()
    }

    /// Time steps in ascending order.
    pub fn steps(&self) -> Vec<i64> {
        self.injections.keys().copied().collect()
    }
}

/// JSON has no NaN or infinity, so every injection must be a finite number.
fn check_finite_injections(injections: &InjectionMatrix) -> SolverResult<()> {
    for (t, row) in injections.rows().enumerate() {
        if let Some(column) = row.iter().position(|v| !v.is_finite()) {
            return Err(SolverError::InvalidProblem(format!(
                "injection of '{}' at step {} is {}",
                injections.columns()[column],
                injections.steps()[t],
                row[column]
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use storopt_core::{
        Branch, BranchId, Bus, BusId, GenCategory, Gen, GenId, Kilovolts, Load, LoadId,
        Megavars, Megawatts, PerUnit, Storage, StorageId,
    };
    use storopt_ts::{expand_injections, GridSnapshot, ProfileRow, ProfileTable};

    fn feeder(controllable: bool) -> Network {
        let mut network = Network::new();
        let b0 = network.graph.add_node(Node::Bus(Bus {
            id: BusId::new(0),
            name: "Bus 0".to_string(),
            base_kv: Kilovolts(20.0),
            vmin_pu: Some(PerUnit(0.95)),
            vmax_pu: Some(PerUnit(1.05)),
        }));
        let b1 = network.graph.add_node(Node::Bus(Bus {
            id: BusId::new(1),
            name: "Bus 1".to_string(),
            base_kv: Kilovolts(20.0),
            ..Bus::default()
        }));
        network.graph.add_edge(
            b0,
            b1,
            Edge::Branch(Branch {
                length_km: 2.0,
                ..Branch::new(
                    BranchId::new(0),
                    "Line 0-1".to_string(),
                    BusId::new(0),
                    BusId::new(1),
                )
            }),
        );
        network.graph.add_node(Node::Load(Load {
            id: LoadId::new(0),
            name: "Load 1".to_string(),
            bus: BusId::new(1),
            active_power: Megawatts(1.0),
            reactive_power: Megavars(0.2),
            status: true,
        }));
        network.graph.add_node(Node::Gen(
            Gen::new(GenId::new(0), "WKA".to_string(), BusId::new(1))
                .with_category(GenCategory::Wind)
                .with_active_power(0.5),
        ));
        let battery = Storage::new(StorageId::new(0), "Battery".to_string(), BusId::new(1))
            .with_rating(0.5, 2.0)
            .with_soc_percent(50.0);
        network.graph.add_node(Node::Storage(if controllable {
            battery.controllable()
        } else {
            battery
        }));
        network
    }

    fn injections(network: &Network) -> InjectionMatrix {
        let snapshot = GridSnapshot::from_network(network).unwrap();
        let profiles = ProfileTable::new(vec![
            ProfileRow::new(0, 1.0, 0.5, 0.2),
            ProfileRow::new(1, 0.5, 1.0, 0.8),
        ]);
        expand_injections(&snapshot, &profiles).unwrap()
    }

    #[test]
    fn build_flattens_network_and_injections() {
        let network = feeder(true);
        let problem =
            StorageProblem::build(&network, &injections(&network), &ProblemSettings::default())
                .unwrap();

        assert_eq!(problem.protocol_version, crate::PROTOCOL_VERSION);
        assert_eq!(problem.n_timesteps, 2);
        assert_eq!(problem.num_buses(), 2);
        assert_eq!(problem.num_lines(), 1);
        assert_eq!(problem.bus_v_min, vec![Some(0.95), None]);
        assert_eq!(problem.line_max_loading_percent, vec![100.0]);
        // Branch::new leaves the current limit unbounded
        assert_eq!(problem.line_max_i_ka, vec![None]);
        assert_eq!(problem.gen_category, vec!["wind".to_string()]);
        assert_eq!(problem.controllable_storage_ids(), vec![0]);
        assert_eq!(problem.steps(), vec![0, 1]);
        assert_eq!(problem.injections[&1], vec![0.5, -0.4]);
        assert_eq!(problem.injection_columns.len(), 2);
    }

    #[test]
    fn build_requires_controllable_storage() {
        let network = feeder(false);
        let err =
            StorageProblem::build(&network, &injections(&network), &ProblemSettings::default())
                .unwrap_err();
        assert!(matches!(err, SolverError::InvalidProblem(_)));
    }

    #[test]
    fn build_rejects_non_positive_step_duration() {
        let network = feeder(true);
        let settings = ProblemSettings {
            time_elapsed_hr: 0.0,
            ..ProblemSettings::default()
        };
        let err = StorageProblem::build(&network, &injections(&network), &settings).unwrap_err();
        assert!(err.to_string().contains("time step duration"));
    }

    #[test]
    fn problem_survives_json() {
        let network = feeder(true);
        let problem =
            StorageProblem::build(&network, &injections(&network), &ProblemSettings::default())
                .unwrap();
        let mut buffer = Vec::new();
        crate::ipc::write_problem(&problem, &mut buffer).unwrap();
        let json = String::from_utf8(buffer.clone()).unwrap();
        assert!(json.contains(r#""line_max_i_ka":[null]"#));
        assert!(json.contains(r#""injections":{"0":[1.0,-0.1],"1":[0.5,-0.4]}"#));

        let back = crate::ipc::read_problem(buffer.as_slice()).unwrap();
        assert_eq!(back, problem);
    }

    #[test]
    fn rated_line_keeps_its_current_limit() {
        let mut network = feeder(true);
        for edge in network.graph.edge_weights_mut() {
            let Edge::Branch(line) = edge;
            line.max_i_ka = 0.145;
        }
        let problem =
            StorageProblem::build(&network, &injections(&network), &ProblemSettings::default())
                .unwrap();
        assert_eq!(problem.line_max_i_ka, vec![Some(0.145)]);
    }

    #[test]
    fn build_rejects_non_finite_injections() {
        let network = feeder(true);
        let snapshot = GridSnapshot::from_network(&network).unwrap();
        let profiles = ProfileTable::new(vec![
            ProfileRow::new(0, 1.0, 0.5, 0.2),
            ProfileRow::new(7, 0.5, 1.0, f64::NAN),
        ]);
        let matrix = expand_injections(&snapshot, &profiles).unwrap();

        let err = StorageProblem::build(&network, &matrix, &ProblemSettings::default())
            .unwrap_err();
        assert!(matches!(err, SolverError::InvalidProblem(_)));
        assert!(err.to_string().contains("'WKA' at step 7"));
    }
}
