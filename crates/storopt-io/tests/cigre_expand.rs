use std::fs;

use storopt_io::exporters::{write_injections_json, ResultSummary, SUMMARY_FILE};
use storopt_io::{build_cigre_mv_pv_wind, write_storage_results, CigreMvConfig};
use storopt_solver_common::{
    ProblemSettings, SolutionStatus, StorageProblem, StorageSchedule, StorageSolution,
};
use storopt_ts::{expand_injections, read_profiles, GridSnapshot, ProfileColumns};
use tempfile::tempdir;

const PROFILES: &str = "\
step,residential,pv,wind
0,0.8,0.0,0.5
1,1.0,0.5,0.25
2,0.6,1.0,1.0
";

#[test]
fn canned_network_expands_to_eighteen_loads_and_nine_generators() {
    let dir = tempdir().unwrap();
    let csv = dir.path().join("profiles.csv");
    fs::write(&csv, PROFILES).unwrap();

    let network = build_cigre_mv_pv_wind(&CigreMvConfig::default());
    let snapshot = GridSnapshot::from_network(&network).unwrap();
    let profiles = read_profiles(&csv, &ProfileColumns::default()).unwrap();
    let matrix = expand_injections(&snapshot, &profiles).unwrap();

    assert_eq!(matrix.n_steps(), 3);
    assert_eq!(matrix.n_loads(), 18);
    assert_eq!(matrix.n_generators(), 9);
    assert_eq!(matrix.columns()[26], "WKA 7");

    // wind park 1.5 MW at factor 0.25
    assert!((matrix.value(1, 26) + 0.375).abs() < 1e-12);
    // PV 10 (0.04 MW) at full sun
    assert!((matrix.value(2, 24) + 0.04).abs() < 1e-12);
    // loads scale with the residential factor
    for (t, residential) in [0.8, 1.0, 0.6].into_iter().enumerate() {
        let load_sum: f64 = matrix.load_columns(t).iter().sum();
        assert!((load_sum - residential * snapshot.total_load_mw()).abs() < 1e-9);
        assert!(matrix.generation_columns(t).iter().all(|v| *v <= 0.0));
    }

    let out = dir.path().join("injections.json");
    write_injections_json(&out, &matrix).unwrap();
    let body: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(body["2"].as_array().unwrap().len(), 27);
}

#[test]
fn problem_from_canned_network_and_results_on_disk() {
    let network = build_cigre_mv_pv_wind(&CigreMvConfig::default());
    let snapshot = GridSnapshot::from_network(&network).unwrap();
    let dir = tempdir().unwrap();
    let csv = dir.path().join("profiles.csv");
    fs::write(&csv, PROFILES).unwrap();
    let profiles = read_profiles(&csv, &ProfileColumns::default()).unwrap();
    let matrix = expand_injections(&snapshot, &profiles).unwrap();

    let problem = StorageProblem::build(&network, &matrix, &ProblemSettings::default()).unwrap();
    assert_eq!(problem.num_buses(), 15);
    assert_eq!(problem.num_lines(), 15);
    assert_eq!(problem.controllable_storage_ids(), vec![0]);
    assert_eq!(problem.storage_bus, vec![11]);

    let solution = StorageSolution {
        status: SolutionStatus::Optimal,
        objective: Some(0.0),
        error_message: None,
        storages: [(
            0,
            StorageSchedule {
                step: vec![0, 1, 2],
                p_mw: vec![0.0, 0.5, -0.5],
                q_mvar: vec![0.0; 3],
                soc_mwh: vec![1.0, 1.125, 1.0],
                soc_percent: vec![50.0, 56.25, 50.0],
            },
        )]
        .into_iter()
        .collect(),
        ..StorageSolution::default()
    };
    solution.validate_against(&problem).unwrap();

    let out = dir.path().join("results");
    write_storage_results(&out, &solution).unwrap();
    let summary: ResultSummary =
        serde_json::from_str(&fs::read_to_string(out.join(SUMMARY_FILE)).unwrap()).unwrap();
    assert_eq!(summary.storages[0].max_soc_percent, Some(56.25));
}
