//! Basin Model Tests
//!
//! Whole-basin evaluations on the Nile walk: lever entry points, repeatable
//! evaluations, filling schedules and principle scoring.

use basin_sim_core_rs::core::time::STANDARD_DAYS_PER_MONTH;
use basin_sim_core_rs::models::{
    LevelStorageTable, LevelSurfaceTable, ReleaseBoundsTable, ReservoirConfig,
};
use basin_sim_core_rs::objectives::{EgalitarianWelfare, UtilitarianWelfare, WelfarePrinciple};
use basin_sim_core_rs::orchestrator::{nile_routing, NILE_HASSANAB_WARMUP_INFLOW};
use basin_sim_core_rs::{
    BasinConfig, BasinModel, FillingPlan, FlowSource, HydropowerPlantConfig, HydrologyInput,
    ModelError, ObjectiveConfig, PolicyConfig, Principle, RoutingNode,
};
use std::collections::{BTreeMap, HashMap};

const HORIZON: usize = 4;
const RESERVOIRS: [&str; 4] = ["GERD", "Roseires", "Sennar", "HAD"];
const CATCHMENTS: [&str; 8] = [
    "BlueNile",
    "GERDToRoseires",
    "RoseiresToAbuNaama",
    "SukiToSennar",
    "Dinder",
    "Rahad",
    "WhiteNile",
    "Atbara",
];
const DISTRICTS: [&str; 6] = ["USSennar", "Gezira", "DSSennar", "Taminiat", "Hassanab", "Egypt"];
const FILLING_RELEASE: f64 = 1000.0;

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn reservoir(name: &str) -> ReservoirConfig {
    let capacity = 5.0e10;
    let gerd = name == "GERD";
    ReservoirConfig {
        name: name.to_string(),
        initial_storage: 2.0e10,
        level_storage: LevelStorageTable {
            levels: vec![400.0, 500.0],
            storages: vec![0.0, capacity],
        },
        level_surface: LevelSurfaceTable {
            levels: vec![400.0, 500.0],
            surfaces: vec![0.0, 1.0e9],
        },
        release_bounds: ReleaseBoundsTable {
            storages: vec![0.0, capacity],
            min_release: vec![0.0, 0.0],
            max_release: vec![5000.0, 5000.0],
        },
        evaporation_rates: [10.0; 12],
        hydropower_plants: if gerd {
            vec![HydropowerPlantConfig {
                efficiency: 0.93,
                max_turbine_flow: 4000.0,
                head_start_level: 400.0,
                max_capacity: 6000.0,
            }]
        } else {
            Vec::new()
        },
        filling_schedule: gerd.then(|| vec![FILLING_RELEASE; 12]),
        filling_duration_months: gerd.then_some(1),
        filling_plan: None,
    }
}

fn nile_config(policy: PolicyConfig) -> BasinConfig {
    BasinConfig {
        simulation_horizon: HORIZON,
        init_month: 1,
        days_per_month: STANDARD_DAYS_PER_MONTH,
        sub_steps_per_month: 1,
        initial_total_inflow: 0.0,
        reservoirs: RESERVOIRS.iter().map(|name| reservoir(name)).collect(),
        catchments: strings(&CATCHMENTS),
        irrigation_districts: strings(&DISTRICTS),
        routing: nile_routing(),
        objectives: ObjectiveConfig {
            primary_district: "Egypt".to_string(),
            district_group: None,
            low_level_reservoir: "HAD".to_string(),
            low_level_threshold: 459.0,
            hydropower_reservoir: "GERD".to_string(),
            percentile: 90.0,
        },
        principle: Principle::Utilitarian,
        policy,
    }
}

fn rbf_policy(n_rbf: usize) -> PolicyConfig {
    // storages, month, total inflow
    let mut input_min = vec![0.0; 4];
    let mut input_max = vec![5.0e10; 4];
    input_min.extend([1.0, 0.0]);
    input_max.extend([12.0, 5.0e3]);
    PolicyConfig::Rbf {
        n_rbf,
        input_min,
        input_max,
    }
}

fn nile_hydrology() -> HydrologyInput {
    let inflows = CATCHMENTS
        .iter()
        .map(|name| {
            let flow = if *name == "BlueNile" { 2000.0 } else { 100.0 };
            (name.to_string(), vec![flow; HORIZON])
        })
        .collect();
    let demands = DISTRICTS
        .iter()
        .map(|name| (name.to_string(), vec![200.0; HORIZON]))
        .collect();
    HydrologyInput { inflows, demands }
}

/// Deterministic lever values in (0, 1)
fn levers(count: usize) -> Vec<f64> {
    (0..count).map(|i| ((i * 37 % 101) as f64 + 0.5) / 101.0).collect()
}

fn nile_model() -> BasinModel {
    BasinModel::new(nile_config(rbf_policy(2)), nile_hydrology()).unwrap()
}

// ============================================================================
// Toy Basin
// ============================================================================

#[test]
fn test_zero_flow_basin_has_perfect_objectives() {
    let small = |name: &str| ReservoirConfig {
        hydropower_plants: Vec::new(),
        filling_schedule: None,
        filling_duration_months: None,
        filling_plan: None,
        evaporation_rates: [0.0; 12],
        ..reservoir(name)
    };
    let config = BasinConfig {
        simulation_horizon: 3,
        reservoirs: vec![small("Upper"), small("Lower")],
        catchments: strings(&["Tributary"]),
        irrigation_districts: strings(&["Farms"]),
        routing: vec![
            RoutingNode::reservoir("Upper", vec![FlowSource::catchment("Tributary")]),
            RoutingNode::reservoir("Lower", vec![FlowSource::release("Upper")]),
            RoutingNode::irrigation("Farms", vec![FlowSource::release("Lower")]),
        ],
        objectives: ObjectiveConfig {
            primary_district: "Farms".to_string(),
            district_group: None,
            low_level_reservoir: "Lower".to_string(),
            low_level_threshold: 0.0,
            hydropower_reservoir: "Upper".to_string(),
            percentile: 90.0,
        },
        policy: PolicyConfig::Constant {
            decisions: vec![0.0, 0.0],
        },
        ..nile_config(rbf_policy(1))
    };
    let hydrology = HydrologyInput {
        inflows: BTreeMap::from([("Tributary".to_string(), vec![0.0; 3])]),
        demands: BTreeMap::from([("Farms".to_string(), vec![0.0; 3])]),
    };

    let mut model = BasinModel::new(config, hydrology).unwrap();
    let evaluation = model.evaluate(&[]).unwrap();

    assert_eq!(evaluation.objectives.to_array(), [0.0; 6]);
    assert_eq!(evaluation.principle, Some(6.0));
    assert_eq!(model.steps_completed(), 3);
    assert_eq!(model.reservoir("Upper").unwrap().storage(), &[2.0e10; 4]);
}

// ============================================================================
// Lever Entry Points
// ============================================================================

#[test]
fn test_rbf_parameter_count_on_nile() {
    // 4 reservoirs: (2 * 6 + 4) per basis function
    assert_eq!(nile_model().parameter_count(), 2 * 16);
}

#[test]
fn test_named_levers_match_positional() {
    let mut model = nile_model();
    let parameters = levers(model.parameter_count());
    let named: HashMap<String, f64> = parameters
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("v{}", i), *v))
        .collect();

    let positional = model.evaluate(&parameters).unwrap();
    let by_name = model.evaluate_named(&named).unwrap();
    assert_eq!(positional, by_name);
}

#[test]
fn test_missing_lever_is_reported() {
    let mut model = nile_model();
    let mut named: HashMap<String, f64> = levers(model.parameter_count())
        .into_iter()
        .enumerate()
        .map(|(i, v)| (format!("v{}", i), v))
        .collect();
    named.remove("v3");

    assert_eq!(
        model.evaluate_named(&named),
        Err(ModelError::MissingLever("v3".to_string()))
    );
}

#[test]
fn test_wrong_parameter_length_is_fatal() {
    let mut model = nile_model();
    let too_short = levers(model.parameter_count() - 1);
    assert!(matches!(
        model.evaluate(&too_short),
        Err(ModelError::Policy(_))
    ));
}

// ============================================================================
// Repeatability
// ============================================================================

#[test]
fn test_reevaluation_is_bit_identical() {
    let mut model = nile_model();
    let first_levers = levers(model.parameter_count());
    let other_levers: Vec<f64> = first_levers.iter().map(|v| 1.0 - v).collect();

    let first = model.evaluate(&first_levers).unwrap();
    let first_snapshot = model.snapshot();

    model.evaluate(&other_levers).unwrap();

    let again = model.evaluate(&first_levers).unwrap();
    assert_eq!(first, again);
    assert_eq!(first_snapshot, model.snapshot());
    assert_eq!(
        first_snapshot.to_json().unwrap(),
        model.snapshot().to_json().unwrap()
    );
}

#[test]
fn test_config_hash_is_stable_and_sensitive() {
    let a = nile_model();
    let b = nile_model();
    assert_eq!(a.config_hash(), b.config_hash());
    assert_eq!(a.config_hash().len(), 64);

    let mut config = nile_config(rbf_policy(2));
    config.objectives.low_level_threshold = 460.0;
    let c = BasinModel::new(config, nile_hydrology()).unwrap();
    assert_ne!(a.config_hash(), c.config_hash());
}

// ============================================================================
// Nile Walk
// ============================================================================

#[test]
fn test_series_have_horizon_length() {
    let mut model = nile_model();
    let parameters = levers(model.parameter_count());
    model.evaluate(&parameters).unwrap();

    for reservoir in model.reservoirs() {
        assert_eq!(reservoir.storage().len(), HORIZON + 1);
        assert_eq!(reservoir.release().len(), HORIZON);
        assert_eq!(reservoir.hydropower_production().len(), HORIZON);
    }
    for district in model.districts() {
        assert_eq!(district.received_flow().len(), HORIZON);
        assert_eq!(district.deficit().len(), HORIZON);
    }
}

#[test]
fn test_egypt_receives_high_aswan_release() {
    let mut model = nile_model();
    let parameters = levers(model.parameter_count());
    model.evaluate(&parameters).unwrap();

    let had = model.reservoir("HAD").unwrap();
    let egypt = model.district("Egypt").unwrap();
    assert_eq!(egypt.received_flow_raw(), had.release());
}

#[test]
fn test_hassanab_starts_from_warmup_inflow() {
    let mut model = nile_model();
    let parameters = levers(model.parameter_count());
    model.evaluate(&parameters).unwrap();

    let hassanab = model.district("Hassanab").unwrap();
    assert_eq!(hassanab.received_flow_raw()[0], NILE_HASSANAB_WARMUP_INFLOW);

    // From then on: Taminiat leftover and Atbara, one month late
    let taminiat = model.district("Taminiat").unwrap();
    let taminiat_leftover =
        taminiat.received_flow_raw()[0] - taminiat.received_flow()[0];
    let expected = taminiat_leftover.max(0.0) + 100.0;
    assert!((hassanab.received_flow_raw()[1] - expected).abs() < 1e-9);
}

#[test]
fn test_objectives_are_ratios() {
    let mut model = nile_model();
    let parameters = levers(model.parameter_count());
    let evaluation = model.evaluate(&parameters).unwrap();

    for value in evaluation.objectives.to_array() {
        assert!((0.0..=1.0).contains(&value), "objective {}", value);
    }
}

// ============================================================================
// Filling Schedule
// ============================================================================

#[test]
fn test_filling_schedule_forces_release_until_duration() {
    let policy = PolicyConfig::Constant {
        decisions: vec![0.5; 4],
    };
    let mut model = BasinModel::new(nile_config(policy), nile_hydrology()).unwrap();
    model.evaluate(&[]).unwrap();

    // Forced at steps 0 and 1, dropped after step 1
    let gerd = model.reservoir("GERD").unwrap();
    assert_eq!(gerd.release()[0], FILLING_RELEASE);
    assert_eq!(gerd.release()[1], FILLING_RELEASE);
    assert_eq!(gerd.release()[2], 2500.0);
    assert!(gerd.filling_schedule().is_none());

    // Other reservoirs follow the policy from the start
    assert_eq!(model.reservoir("Roseires").unwrap().release()[0], 2500.0);
}

#[test]
fn test_filling_schedule_restored_on_reevaluation() {
    let policy = PolicyConfig::Constant {
        decisions: vec![0.5; 4],
    };
    let mut model = BasinModel::new(nile_config(policy), nile_hydrology()).unwrap();
    model.evaluate(&[]).unwrap();

    model.reset();
    assert_eq!(
        model.reservoir("GERD").unwrap().filling_schedule(),
        Some(&[FILLING_RELEASE; 12][..])
    );

    model.evaluate(&[]).unwrap();
    assert_eq!(model.reservoir("GERD").unwrap().release()[0], FILLING_RELEASE);
}

#[test]
fn test_filling_plan_derives_gains_from_storage_target() {
    let mut config = nile_config(PolicyConfig::Constant {
        decisions: vec![0.5; 4],
    });
    let gerd = &mut config.reservoirs[0];
    gerd.filling_schedule = None;
    gerd.filling_duration_months = None;
    gerd.filling_plan = Some(FillingPlan {
        target_storage: 5.0e10,
        duration_years: 3,
        weights_catchment: "BlueNile".to_string(),
    });

    let mut hydrology = nile_hydrology();
    hydrology
        .inflows
        .insert("BlueNile".to_string(), vec![1000.0, 2000.0, 3000.0, 4000.0]);

    let mut model = BasinModel::new(config, hydrology).unwrap();
    let gerd = model.reservoir("GERD").unwrap();
    assert_eq!(gerd.filling_duration_months(), Some(36));

    // 3e10 m³ over three years is 317.098 m³/s; January carries a tenth
    // of the weight, so it retains 12 * 317.098 * 0.1 m³/s
    let gains = gerd.filling_schedule().unwrap();
    let expected = [380.517_503_805, 761.035_007_610, 1_141.552_511_416, 1_522.070_015_221];
    for (gain, expected) in gains.iter().zip(expected) {
        assert!((gain - expected).abs() < 1e-6, "gain {} != {}", gain, expected);
    }
    assert!(gains[4..].iter().all(|&g| g == 0.0));

    model.evaluate(&[]).unwrap();
    let gerd = model.reservoir("GERD").unwrap();
    assert!((gerd.release()[0] - (1000.0 - 380.517_503_805)).abs() < 1e-6);
    assert!((gerd.release()[1] - (2000.0 - 761.035_007_610)).abs() < 1e-6);
    assert!(gerd.filling_schedule().is_some());
}

#[test]
fn test_filling_plan_needs_known_catchment() {
    let mut config = nile_config(rbf_policy(1));
    let gerd = &mut config.reservoirs[0];
    gerd.filling_schedule = None;
    gerd.filling_duration_months = None;
    gerd.filling_plan = Some(FillingPlan {
        target_storage: 5.0e10,
        duration_years: 3,
        weights_catchment: "Sobat".to_string(),
    });

    assert!(matches!(
        BasinModel::new(config, nile_hydrology()),
        Err(ModelError::UnknownEntity(_))
    ));
}

// ============================================================================
// Adversarial Levers
// ============================================================================

#[test]
fn test_extreme_levers_yield_well_formed_objectives() {
    let mut model = nile_model();
    let count = model.parameter_count();

    for value in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 1e308, -1e308, 0.0] {
        let evaluation = model.evaluate(&vec![value; count]).unwrap();
        for objective in evaluation.objectives.to_array() {
            assert!(
                (0.0..=1.0).contains(&objective),
                "lever {} gave objective {}",
                value,
                objective
            );
        }
        assert!(evaluation.principle.unwrap().is_finite());
        assert_eq!(model.steps_completed(), HORIZON);
    }
}

#[test]
fn test_basin_model_is_send() {
    fn assert_send<T: Send>() {}
    assert_send::<BasinModel>();
}

// ============================================================================
// Principles
// ============================================================================

#[test]
fn test_principle_switching() {
    let mut model = nile_model();
    let parameters = levers(model.parameter_count());

    let uwf = model.evaluate(&parameters).unwrap();
    let objectives = uwf.objectives.to_array();
    assert_eq!(uwf.principle, Some(UtilitarianWelfare.score(&objectives)));

    model.set_principle(Principle::Egalitarian);
    let gini = model.evaluate(&parameters).unwrap();
    assert_eq!(gini.objectives, uwf.objectives);
    assert_eq!(gini.principle, Some(EgalitarianWelfare.score(&objectives)));

    model.set_principle(Principle::None);
    assert_eq!(model.evaluate(&parameters).unwrap().principle, None);
}
