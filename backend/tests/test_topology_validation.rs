//! Topology Validation Tests
//!
//! A routing walk is accepted only if every entity is routed exactly once
//! and each node reads from nodes routed before it.

use basin_sim_core_rs::core::time::STANDARD_DAYS_PER_MONTH;
use basin_sim_core_rs::models::{
    LevelStorageTable, LevelSurfaceTable, ReleaseBoundsTable, ReservoirConfig,
};
use basin_sim_core_rs::orchestrator::nile_routing;
use basin_sim_core_rs::{
    BasinConfig, BasinModel, FlowSource, HydrologyInput, ModelError, ObjectiveConfig,
    PolicyConfig, Principle, RoutingNode,
};
use std::collections::BTreeMap;

fn reservoir(name: &str) -> ReservoirConfig {
    ReservoirConfig {
        name: name.to_string(),
        initial_storage: 1.0e9,
        level_storage: LevelStorageTable {
            levels: vec![100.0, 200.0],
            storages: vec![0.0, 2.0e9],
        },
        level_surface: LevelSurfaceTable {
            levels: vec![100.0, 200.0],
            surfaces: vec![0.0, 0.0],
        },
        release_bounds: ReleaseBoundsTable {
            storages: vec![0.0, 2.0e9],
            min_release: vec![0.0, 0.0],
            max_release: vec![100.0, 100.0],
        },
        evaporation_rates: [0.0; 12],
        hydropower_plants: Vec::new(),
        filling_schedule: None,
        filling_duration_months: None,
        filling_plan: None,
    }
}

fn strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Reservoirs Upper and Lower, catchment Tributary, districts Farms and City
fn config(routing: Vec<RoutingNode>) -> BasinConfig {
    BasinConfig {
        simulation_horizon: 2,
        init_month: 1,
        days_per_month: STANDARD_DAYS_PER_MONTH,
        sub_steps_per_month: 1,
        initial_total_inflow: 0.0,
        reservoirs: vec![reservoir("Upper"), reservoir("Lower")],
        catchments: strings(&["Tributary"]),
        irrigation_districts: strings(&["Farms", "City"]),
        routing,
        objectives: ObjectiveConfig {
            primary_district: "City".to_string(),
            district_group: None,
            low_level_reservoir: "Lower".to_string(),
            low_level_threshold: 120.0,
            hydropower_reservoir: "Upper".to_string(),
            percentile: 90.0,
        },
        principle: Principle::None,
        policy: PolicyConfig::Constant {
            decisions: vec![0.5, 0.5],
        },
    }
}

fn hydrology() -> HydrologyInput {
    HydrologyInput {
        inflows: BTreeMap::from([("Tributary".to_string(), vec![10.0, 10.0])]),
        demands: BTreeMap::from([
            ("Farms".to_string(), vec![5.0, 5.0]),
            ("City".to_string(), vec![5.0, 5.0]),
        ]),
    }
}

fn valid_routing() -> Vec<RoutingNode> {
    vec![
        RoutingNode::reservoir("Upper", vec![FlowSource::catchment("Tributary")]),
        RoutingNode::irrigation("Farms", vec![FlowSource::release("Upper")]),
        RoutingNode::reservoir("Lower", vec![FlowSource::leftover("Farms")]),
        RoutingNode::irrigation("City", vec![FlowSource::release("Lower")]),
    ]
}

fn build(routing: Vec<RoutingNode>) -> Result<BasinModel, ModelError> {
    BasinModel::new(config(routing), hydrology())
}

#[test]
fn test_valid_routing_builds() {
    assert!(build(valid_routing()).is_ok());
}

#[test]
fn test_unrouted_district_is_rejected() {
    let mut routing = valid_routing();
    routing.pop();
    assert!(matches!(build(routing), Err(ModelError::InvalidTopology(_))));
}

#[test]
fn test_reservoir_routed_twice_is_rejected() {
    let mut routing = valid_routing();
    routing.push(RoutingNode::reservoir("Upper", vec![]));
    assert!(matches!(build(routing), Err(ModelError::InvalidTopology(_))));
}

#[test]
fn test_forward_reference_is_rejected() {
    let routing = vec![
        RoutingNode::irrigation("Farms", vec![FlowSource::release("Upper")]),
        RoutingNode::reservoir("Upper", vec![FlowSource::catchment("Tributary")]),
        RoutingNode::reservoir("Lower", vec![FlowSource::leftover("Farms")]),
        RoutingNode::irrigation("City", vec![FlowSource::release("Lower")]),
    ];
    assert!(matches!(build(routing), Err(ModelError::InvalidTopology(_))));
}

#[test]
fn test_self_reference_is_rejected() {
    let routing = vec![
        RoutingNode::reservoir("Upper", vec![FlowSource::release("Upper")]),
        RoutingNode::irrigation("Farms", vec![FlowSource::catchment("Tributary")]),
        RoutingNode::reservoir("Lower", vec![FlowSource::leftover("Farms")]),
        RoutingNode::irrigation("City", vec![FlowSource::release("Lower")]),
    ];
    assert!(matches!(build(routing), Err(ModelError::InvalidTopology(_))));
}

#[test]
fn test_release_feeding_two_nodes_is_rejected() {
    let routing = vec![
        RoutingNode::reservoir("Upper", vec![FlowSource::catchment("Tributary")]),
        RoutingNode::irrigation("Farms", vec![FlowSource::release("Upper")]),
        RoutingNode::reservoir("Lower", vec![FlowSource::release("Upper")]),
        RoutingNode::irrigation("City", vec![FlowSource::release("Lower")]),
    ];
    assert!(matches!(build(routing), Err(ModelError::InvalidTopology(_))));
}

#[test]
fn test_unknown_catchment_is_rejected() {
    let mut routing = valid_routing();
    routing[0] = RoutingNode::reservoir("Upper", vec![FlowSource::catchment("Sobat")]);
    assert!(matches!(build(routing), Err(ModelError::UnknownEntity(_))));
}

#[test]
fn test_lag_above_one_is_rejected() {
    let mut routing = valid_routing();
    routing[2] = RoutingNode::reservoir("Lower", vec![FlowSource::leftover("Farms").lagged(2)]);
    assert!(matches!(build(routing), Err(ModelError::InvalidTopology(_))));
}

#[test]
fn test_negative_warmup_is_rejected() {
    let mut routing = valid_routing();
    routing[2] = RoutingNode::reservoir("Lower", vec![FlowSource::leftover("Farms").lagged(1)])
        .with_warmup_inflow(-1.0);
    assert!(matches!(build(routing), Err(ModelError::InvalidTopology(_))));
}

#[test]
fn test_missing_demand_series_is_rejected() {
    let mut hydrology = hydrology();
    hydrology.demands.remove("City");
    assert_eq!(
        BasinModel::new(config(valid_routing()), hydrology).err(),
        Some(ModelError::MissingSeries("City".to_string()))
    );
}

#[test]
fn test_short_inflow_series_is_rejected() {
    let mut hydrology = hydrology();
    hydrology
        .inflows
        .insert("Tributary".to_string(), vec![10.0]);
    assert!(matches!(
        BasinModel::new(config(valid_routing()), hydrology),
        Err(ModelError::SeriesTooShort { .. })
    ));
}

#[test]
fn test_nile_routing_from_json_round_trip() {
    let json = serde_json::to_string(&nile_routing()).unwrap();
    let parsed: Vec<RoutingNode> = serde_json::from_str(&json).unwrap();
    assert_eq!(parsed, nile_routing());
}

#[test]
fn test_routing_json_rejects_unknown_field() {
    let json = r#"[{"kind": "reservoir", "name": "Upper", "inflows": [], "delay": 1}]"#;
    assert!(serde_json::from_str::<Vec<RoutingNode>>(json).is_err());
}
