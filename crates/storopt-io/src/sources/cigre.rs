/// CIGRE Medium Voltage (MV) benchmark network with photovoltaic and wind DER
///
/// Builds the 15-bus CIGRE MV distribution grid: an HV supply bus feeding two
/// MV feeders through 110/20 kV transformers, residential and commercial
/// loads, eight rooftop PV units, one wind park, and a controllable battery
/// for the storage optimization.
///
/// Reference: CIGRE Task Force C6.04.02, "Benchmark Systems for Network Integration
/// of Renewable and Distributed Energy Resources" (2014)
use std::collections::HashMap;

use storopt_core::{
    Branch, BranchId, Bus, BusId, Edge, Gen, GenCategory, GenId, Kilovolts, Load, LoadId,
    Megavars, Megawatts, Network, Node, NodeIndex, Percent, PerUnit, Storage, StorageId,
};

/// CIGRE MV network configuration
#[derive(Debug, Clone)]
pub struct CigreMvConfig {
    /// MV voltage level in kV (default: 20.0)
    pub base_kv: f64,
    /// HV supply voltage in kV (default: 110.0)
    pub hv_kv: f64,
    /// Scaling applied to every PV and wind rating (default: 1.0)
    pub der_scale: f64,
    /// Bus the battery connects to (default: 11)
    pub battery_bus: usize,
    /// Battery charge/discharge rating in MW (default: 0.5)
    pub battery_p_mw: f64,
    /// Battery energy capacity in MWh (default: 2.0)
    pub battery_e_mwh: f64,
    /// Initial state of charge in percent (default: 50.0)
    pub battery_soc_percent: f64,
    /// Lower bus voltage limit in p.u. (default: 0.9)
    pub vmin_pu: f64,
    /// Upper bus voltage limit in p.u. (default: 1.1)
    pub vmax_pu: f64,
}

impl Default for CigreMvConfig {
    fn default() -> Self {
        Self {
            base_kv: 20.0,
            hv_kv: 110.0,
            der_scale: 1.0,
            battery_bus: 11,
            battery_p_mw: 0.5,
            battery_e_mwh: 2.0,
            battery_soc_percent: 50.0,
            vmin_pu: 0.9,
            vmax_pu: 1.1,
        }
    }
}

/// Per-km parameters of the two CIGRE MV line types
#[derive(Clone, Copy)]
struct LineType {
    r_ohm_per_km: f64,
    x_ohm_per_km: f64,
    c_nf_per_km: f64,
    max_i_ka: f64,
}

const CABLE: LineType = LineType {
    r_ohm_per_km: 0.501,
    x_ohm_per_km: 0.716,
    c_nf_per_km: 151.1749,
    max_i_ka: 0.145,
};

const OVERHEAD: LineType = LineType {
    r_ohm_per_km: 0.510,
    x_ohm_per_km: 0.366,
    c_nf_per_km: 10.09679,
    max_i_ka: 0.195,
};

/// 25 MVA, 110/20 kV, vk = 12 %, vkr = 0.16 %, referred to the MV side
const TRAFO_RATING_MVA: f64 = 25.0;
const TRAFO_VK_PERCENT: f64 = 12.0;
const TRAFO_VKR_PERCENT: f64 = 0.16;

/// Number of buses in the network (HV bus 0 plus MV buses 1-14)
pub const CIGRE_MV_BUS_COUNT: usize = 15;

/// Build the CIGRE MV network with `pv_wind` DER and a battery
///
/// - Bus 0: HV supply with the external grid equivalent
/// - Buses 1-11: feeder 1, buses 12-14: feeder 2
/// - 18 loads, 8 PV units, 1 wind park (last generation point)
/// - Tie lines 11-4 and 14-8 are open and left out
pub fn build_cigre_mv_pv_wind(config: &CigreMvConfig) -> Network {
    let mut network = Network::new();
    let mut bus_nodes: HashMap<usize, NodeIndex> = HashMap::new();

    //   0 ==T== 1 -- 2 -- 3 -- 4 -- 5 -- 6 -- 7 -- 8 -- 9 -- 10 -- 11
    //                     |______________________|
    //   0 ==T== 12 -- 13 -- 14
    for i in 0..CIGRE_MV_BUS_COUNT {
        let node_idx = network.graph.add_node(Node::Bus(Bus {
            id: BusId::new(i),
            name: format!("Bus {}", i),
            base_kv: Kilovolts(if i == 0 { config.hv_kv } else { config.base_kv }),
            vmin_pu: Some(PerUnit(config.vmin_pu)),
            vmax_pu: Some(PerUnit(config.vmax_pu)),
        }));
        bus_nodes.insert(i, node_idx);
    }

    network.graph.add_node(Node::Gen(
        Gen::new(GenId::new(0), "External Grid".to_string(), BusId::new(0))
            .with_p_limits(-1000.0, 1000.0),
    ));

    let mut branch_id = 0;
    let trafo = transformer_as_line(config.base_kv);
    for mv_bus in [1, 12] {
        add_line(
            &mut network,
            &bus_nodes,
            BranchId::new(branch_id),
            format!("Trafo 0-{}", mv_bus),
            (0, mv_bus),
            1.0,
            trafo,
        );
        branch_id += 1;
    }

    let lines = [
        // (from, to, length_km, type)
        (1, 2, 2.82, CABLE),
        (2, 3, 4.42, CABLE),
        (3, 4, 0.61, CABLE),
        (4, 5, 0.56, CABLE),
        (5, 6, 1.54, CABLE),
        (7, 8, 1.67, CABLE),
        (8, 9, 0.32, CABLE),
        (9, 10, 0.77, CABLE),
        (10, 11, 0.33, CABLE),
        (3, 8, 1.30, CABLE),
        (12, 13, 4.89, OVERHEAD),
        (13, 14, 2.99, OVERHEAD),
        (6, 7, 0.24, CABLE),
    ];
    for (from, to, length_km, line_type) in lines {
        add_line(
            &mut network,
            &bus_nodes,
            BranchId::new(branch_id),
            format!("Line {}-{}", from, to),
            (from, to),
            length_km,
            line_type,
        );
        branch_id += 1;
    }

    let loads = [
        // (name, bus, P_MW, Q_Mvar)
        ("Load R1", 1, 14.994, 3.044662),
        ("Load R3", 3, 0.27645, 0.069285),
        ("Load R4", 4, 0.43165, 0.108182),
        ("Load R5", 5, 0.7275, 0.182329),
        ("Load R6", 6, 0.54805, 0.137354),
        ("Load R8", 8, 0.5863, 0.146941),
        ("Load R10", 10, 0.4753, 0.119118),
        ("Load R11", 11, 0.3298, 0.082656),
        ("Load R12", 12, 14.994, 3.044662),
        ("Load R14", 14, 0.20855, 0.052268),
        ("Load CI1", 1, 4.845, 1.592474),
        ("Load CI3", 3, 0.22525, 0.139597),
        ("Load CI7", 7, 0.0765, 0.04741),
        ("Load CI9", 9, 0.57375, 0.355578),
        ("Load CI10", 10, 0.068, 0.042143),
        ("Load CI12", 12, 5.016, 1.648679),
        ("Load CI13", 13, 0.034, 0.021071),
        ("Load CI14", 14, 0.3315, 0.205445),
    ];
    for (i, (name, bus, p_mw, q_mvar)) in loads.iter().enumerate() {
        network.graph.add_node(Node::Load(Load {
            id: LoadId::new(i),
            name: name.to_string(),
            bus: BusId::new(*bus),
            active_power: Megawatts(*p_mw),
            reactive_power: Megavars(*q_mvar),
            status: true,
        }));
    }

    let der = [
        // (name, bus, P_MW, category); the wind park stays last
        ("PV 3", 3, 0.02, GenCategory::Photovoltaic),
        ("PV 4", 4, 0.02, GenCategory::Photovoltaic),
        ("PV 5", 5, 0.03, GenCategory::Photovoltaic),
        ("PV 6", 6, 0.03, GenCategory::Photovoltaic),
        ("PV 8", 8, 0.03, GenCategory::Photovoltaic),
        ("PV 9", 9, 0.03, GenCategory::Photovoltaic),
        ("PV 10", 10, 0.04, GenCategory::Photovoltaic),
        ("PV 11", 11, 0.01, GenCategory::Photovoltaic),
        ("WKA 7", 7, 1.5, GenCategory::Wind),
    ];
    for (i, (name, bus, p_mw, category)) in der.iter().enumerate() {
        let p_mw = p_mw * config.der_scale;
        network.graph.add_node(Node::Gen(
            Gen::new(GenId::new(i + 1), name.to_string(), BusId::new(*bus))
                .with_category(*category)
                .with_active_power(p_mw)
                .with_p_limits(0.0, p_mw),
        ));
    }

    network.graph.add_node(Node::Storage(
        Storage::new(
            StorageId::new(0),
            "Battery".to_string(),
            BusId::new(config.battery_bus),
        )
        .with_rating(config.battery_p_mw, config.battery_e_mwh)
        .with_soc_percent(config.battery_soc_percent)
        .controllable(),
    ));

    network
}

/// Transformer equivalent as a 1 km line with the short-circuit impedance
fn transformer_as_line(mv_kv: f64) -> LineType {
    let z_base = mv_kv * mv_kv / TRAFO_RATING_MVA;
    let z = TRAFO_VK_PERCENT / 100.0 * z_base;
    let r = TRAFO_VKR_PERCENT / 100.0 * z_base;
    LineType {
        r_ohm_per_km: r,
        x_ohm_per_km: (z * z - r * r).sqrt(),
        c_nf_per_km: 0.0,
        max_i_ka: TRAFO_RATING_MVA / (3f64.sqrt() * mv_kv),
    }
}

fn add_line(
    network: &mut Network,
    bus_nodes: &HashMap<usize, NodeIndex>,
    id: BranchId,
    name: String,
    (from, to): (usize, usize),
    length_km: f64,
    line_type: LineType,
) {
    network.graph.add_edge(
        bus_nodes[&from],
        bus_nodes[&to],
        Edge::Branch(Branch {
            length_km,
            r_ohm_per_km: line_type.r_ohm_per_km,
            x_ohm_per_km: line_type.x_ohm_per_km,
            c_nf_per_km: line_type.c_nf_per_km,
            max_i_ka: line_type.max_i_ka,
            max_loading_percent: Some(Percent(100.0)),
            ..Branch::new(id, name, BusId::new(from), BusId::new(to))
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use storopt_core::Diagnostics;
    use storopt_ts::GridSnapshot;

    #[test]
    fn test_build_cigre_mv_pv_wind() {
        let network = build_cigre_mv_pv_wind(&CigreMvConfig::default());

        let stats = network.stats();
        assert_eq!(stats.num_buses, 15);
        assert_eq!(stats.num_branches, 15, "13 lines plus 2 transformers");
        assert_eq!(stats.num_gens, 10, "external grid, 8 PV, 1 wind");
        assert_eq!(stats.num_loads, 18);
        assert_eq!(stats.num_storages, 1);
        assert!(
            (stats.total_load_mw - 44.7416).abs() < 1e-6,
            "total load {}",
            stats.total_load_mw
        );
        assert!((stats.total_der_mw - 1.71).abs() < 1e-9);
    }

    #[test]
    fn test_network_validates_cleanly() {
        let network = build_cigre_mv_pv_wind(&CigreMvConfig::default());
        let mut diag = Diagnostics::new();
        network.validate_into(&mut diag);
        assert!(!diag.has_errors(), "{diag}");
        assert_eq!(diag.warning_count(), 0, "{diag}");
    }

    #[test]
    fn test_snapshot_has_wind_last() {
        let network = build_cigre_mv_pv_wind(&CigreMvConfig::default());
        let snapshot = GridSnapshot::from_network(&network).unwrap();
        assert_eq!(snapshot.load_count(), 18);
        assert_eq!(snapshot.generation_count(), 9);
        assert_eq!(snapshot.wind_position(), 8);
        assert_eq!(snapshot.generators()[8].name, "WKA 7");
    }

    #[test]
    fn test_config_scales_der_and_battery() {
        let config = CigreMvConfig {
            der_scale: 2.0,
            battery_bus: 5,
            battery_p_mw: 1.0,
            battery_e_mwh: 4.0,
            ..CigreMvConfig::default()
        };
        let network = build_cigre_mv_pv_wind(&config);
        let wind = network
            .generators()
            .into_iter()
            .find(|g| g.category == GenCategory::Wind)
            .unwrap();
        assert_eq!(wind.active_power.value(), 3.0);

        let battery = network.controllable_storages()[0];
        assert_eq!(battery.bus, BusId::new(5));
        assert_eq!(battery.max_e.value(), 4.0);
        assert_eq!(battery.initial_energy().value(), 2.0);
    }

    #[test]
    fn test_transformer_impedance() {
        let trafo = transformer_as_line(20.0);
        // z_base = 16 ohm, |z| = 1.92 ohm
        assert!((trafo.r_ohm_per_km - 0.0256).abs() < 1e-12);
        assert!((trafo.x_ohm_per_km.hypot(trafo.r_ohm_per_km) - 1.92).abs() < 1e-9);
        assert!((trafo.max_i_ka - 0.7217).abs() < 1e-4);
    }
}
