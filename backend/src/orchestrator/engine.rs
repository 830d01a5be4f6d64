//! Basin Model Engine
//!
//! Main simulation loop integrating all components:
//! - Policy evaluation (one call per month for all reservoirs)
//! - Routing walk (reservoir integration, district withdrawals)
//! - Deficit and hydropower accounting
//! - Objective aggregation and welfare scoring
//!
//! # Architecture
//!
//! ```text
//! evaluate(parameters):
//!   reset all series, assign policy parameters
//!   For each step t in 0..horizon:
//!   1. Look up calendar month and day count
//!   2. Assemble policy input [storages.., month, total inflow of t - 1]
//!   3. Call the policy once, one decision per reservoir
//!   4. Walk the routing nodes in order
//!      - reservoir: integrate(decision, summed inflow)
//!      - district:  receive(summed inflow), shift delay buffer
//!   5. Total inflow = sum of all catchments at t
//!   6. Record district deficits
//!   7. Record reservoir hydropower
//!   8. Drop filling schedules whose duration ends at t
//!   aggregate objectives, score principle
//! ```
//!
//! The loop never fails: every numerical hazard is clamped inside the
//! entity models. Errors surface only at construction and when the
//! parameter vector has the wrong length.
//!
//! # Example
//!
//! ```rust
//! use basin_sim_core_rs::orchestrator::{BasinConfig, BasinModel, HydrologyInput};
//!
//! let config = BasinConfig::from_json_str(r#"{
//!     "simulation_horizon": 3,
//!     "init_month": 1,
//!     "reservoirs": [{
//!         "name": "Upper",
//!         "initial_storage": 1.0e9,
//!         "level_storage": {"levels": [100.0, 200.0], "storages": [0.0, 2.0e9]},
//!         "level_surface": {"levels": [100.0, 200.0], "surfaces": [0.0, 0.0]},
//!         "release_bounds": {"storages": [0.0, 2.0e9], "min_release": [0.0, 0.0], "max_release": [100.0, 100.0]},
//!         "hydropower_plants": [{"efficiency": 0.9, "max_turbine_flow": 100.0, "head_start_level": 90.0, "max_capacity": 50.0}]
//!     }],
//!     "catchments": ["Tributary"],
//!     "irrigation_districts": ["Farms"],
//!     "routing": [
//!         {"kind": "reservoir", "name": "Upper", "inflows": [{"source": "catchment", "name": "Tributary"}]},
//!         {"kind": "irrigation", "name": "Farms", "inflows": [{"source": "release", "reservoir": "Upper"}]}
//!     ],
//!     "objectives": {
//!         "primary_district": "Farms",
//!         "low_level_reservoir": "Upper",
//!         "low_level_threshold": 110.0,
//!         "hydropower_reservoir": "Upper"
//!     },
//!     "principle": "uwf",
//!     "policy": {"type": "constant", "decisions": [0.5]}
//! }"#).unwrap();
//!
//! let hydrology = HydrologyInput::from_json_str(r#"{
//!     "inflows": {"Tributary": [80.0, 80.0, 80.0]},
//!     "demands": {"Farms": [40.0, 40.0, 40.0]}
//! }"#).unwrap();
//!
//! let mut model = BasinModel::new(config, hydrology).unwrap();
//! let evaluation = model.evaluate(&[]).unwrap();
//!
//! // Half-open gate releases 50 m³/s, enough for the 40 m³/s demand
//! assert_eq!(evaluation.objectives.primary_agg_deficit_ratio, 0.0);
//! assert!(evaluation.principle.is_some());
//! ```

use super::config::{BasinConfig, HydrologyInput};
use super::snapshot::{compute_config_hash, BasinSnapshot};
use super::topology::{DelayBuffer, NodeTarget, ResolvedNode, ResolvedSource, RoutingPlan};
use crate::core::time::SimulationCalendar;
use crate::models::{Catchment, CurveError, IrrigationDistrict, Reservoir};
use crate::objectives::aggregate::ObjectivePlan;
use crate::objectives::{build_principle, Objectives, Principle};
use crate::policy::{build_policy, PolicyError, ReleasePolicy};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

// ============================================================================
// Errors
// ============================================================================

/// Errors raised while building or evaluating a basin model
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("Unknown principle: {0}")]
    UnknownPrinciple(String),

    #[error("Missing time series: {0}")]
    MissingSeries(String),

    #[error("Series '{name}' has {len} values, horizon needs {horizon}")]
    SeriesTooShort {
        name: String,
        len: usize,
        horizon: usize,
    },

    #[error("Unknown {0}")]
    UnknownEntity(String),

    #[error("Missing lever: {0}")]
    MissingLever(String),

    #[error(transparent)]
    Curve(#[from] CurveError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

// ============================================================================
// Evaluation Result
// ============================================================================

/// Outcome of one policy evaluation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub objectives: Objectives,

    /// Welfare score, absent when the principle is `None`
    pub principle: Option<f64>,
}

// ============================================================================
// Basin Model
// ============================================================================

/// The basin simulator
///
/// Built once per configuration and reused across evaluations. Each
/// evaluation starts from the same initial state, so evaluating the same
/// parameters twice gives bit-identical results.
pub struct BasinModel {
    config: BasinConfig,
    config_hash: String,
    calendar: SimulationCalendar,

    reservoirs: Vec<Reservoir>,
    catchments: Vec<Catchment>,
    districts: Vec<IrrigationDistrict>,

    plan: RoutingPlan,
    delay_buffers: Vec<DelayBuffer>,
    /// Leftover of each district at the current step
    leftovers: Vec<f64>,

    objective_plan: ObjectivePlan,
    principle: Principle,

    policy: Box<dyn ReleasePolicy>,
    policy_input: Vec<f64>,
    decisions: Vec<f64>,

    /// Steps completed by the latest simulation
    steps_completed: usize,
}

fn check_unique(kind: &str, names: &[String]) -> Result<(), ModelError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name.as_str()) {
            return Err(ModelError::InvalidConfig(format!(
                "duplicate {} name '{}'",
                kind, name
            )));
        }
    }
    Ok(())
}

impl BasinModel {
    /// Build every entity, validate the routing walk and the policy shape
    ///
    /// # Errors
    ///
    /// Any configuration problem: bad calendar, malformed tables, duplicate
    /// or unknown names, series shorter than the horizon, an invalid walk.
    pub fn new(config: BasinConfig, hydrology: HydrologyInput) -> Result<Self, ModelError> {
        let horizon = config.simulation_horizon;

        if horizon == 0 {
            return Err(ModelError::InvalidConfig(
                "simulation_horizon must be > 0".to_string(),
            ));
        }

        if config.sub_steps_per_month == 0 {
            return Err(ModelError::InvalidConfig(
                "sub_steps_per_month must be > 0".to_string(),
            ));
        }

        if !config.initial_total_inflow.is_finite() {
            return Err(ModelError::InvalidConfig(
                "initial_total_inflow must be finite".to_string(),
            ));
        }

        if config.reservoirs.is_empty() {
            return Err(ModelError::InvalidConfig(
                "at least one reservoir is required".to_string(),
            ));
        }

        let calendar = SimulationCalendar::new(config.init_month, config.days_per_month)?;

        let reservoir_names = config.reservoir_names();
        check_unique("reservoir", &reservoir_names)?;
        check_unique("catchment", &config.catchments)?;
        check_unique("irrigation district", &config.irrigation_districts)?;

        let mut reservoirs = config
            .reservoirs
            .iter()
            .cloned()
            .map(Reservoir::new)
            .collect::<Result<Vec<_>, _>>()?;

        let HydrologyInput {
            mut inflows,
            mut demands,
        } = hydrology;

        let catchments = config
            .catchments
            .iter()
            .map(|name| {
                HydrologyInput::take_series(&mut inflows, name, horizon)
                    .map(|series| Catchment::new(name.clone(), series))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for reservoir in reservoirs.iter_mut() {
            let Some(plan) = reservoir.filling_plan().cloned() else {
                continue;
            };
            let catchment = catchments
                .iter()
                .find(|c| c.name() == plan.weights_catchment)
                .ok_or_else(|| {
                    ModelError::UnknownEntity(format!("catchment '{}'", plan.weights_catchment))
                })?;
            let initial_storage = reservoir.initial_storage();
            let gains = plan.storage_gains(initial_storage, catchment.inflow(), &calendar);
            debug!(
                reservoir = reservoir.name(),
                mean_gain = plan.mean_gain_rate(initial_storage),
                months = plan.duration_months(),
                "filling schedule derived from storage target"
            );
            reservoir.apply_filling_gains(gains);
        }

        let districts = config
            .irrigation_districts
            .iter()
            .map(|name| {
                HydrologyInput::take_series(&mut demands, name, horizon)
                    .map(|series| IrrigationDistrict::new(name.clone(), series))
            })
            .collect::<Result<Vec<_>, _>>()?;

        for name in inflows.keys().chain(demands.keys()) {
            warn!(series = %name, "hydrology series not used by any entity");
        }

        let plan = RoutingPlan::resolve(
            &config.routing,
            &reservoir_names,
            &config.irrigation_districts,
            &config.catchments,
        )?;

        let objective_plan = ObjectivePlan::resolve(
            &config.objectives,
            &config.irrigation_districts,
            &reservoir_names,
        )?;

        let policy = build_policy(&config.policy, reservoirs.len())?;
        if policy.input_count() != reservoirs.len() + 2 || policy.output_count() != reservoirs.len()
        {
            return Err(ModelError::InvalidConfig(format!(
                "policy shape {} -> {} does not match {} reservoirs",
                policy.input_count(),
                policy.output_count(),
                reservoirs.len()
            )));
        }

        let config_hash = compute_config_hash(&config)?;

        info!(
            reservoirs = reservoirs.len(),
            catchments = catchments.len(),
            districts = districts.len(),
            horizon,
            parameters = policy.parameter_count(),
            principle = %config.principle,
            config_hash = %config_hash,
            "basin model built"
        );

        Ok(Self {
            config_hash,
            calendar,
            delay_buffers: vec![DelayBuffer::new(); plan.buffer_count],
            leftovers: vec![0.0; districts.len()],
            policy_input: Vec::with_capacity(reservoirs.len() + 2),
            decisions: vec![0.0; reservoirs.len()],
            principle: config.principle,
            reservoirs,
            catchments,
            districts,
            plan,
            objective_plan,
            policy,
            steps_completed: 0,
            config,
        })
    }

    /// Evaluate one candidate policy
    ///
    /// Resets every series, assigns `parameters`, simulates the full horizon
    /// and aggregates the objectives.
    ///
    /// # Errors
    ///
    /// `ModelError::Policy` when `parameters` has the wrong length.
    pub fn evaluate(&mut self, parameters: &[f64]) -> Result<Evaluation, ModelError> {
        self.reset();
        self.policy.assign_parameters(parameters)?;
        self.simulate();

        let objectives = self
            .objective_plan
            .compute(&self.districts, &self.reservoirs);
        let principle =
            build_principle(self.principle).map(|scorer| scorer.score(&objectives.to_array()));

        debug!(
            objectives = ?objectives.to_array(),
            principle = ?principle,
            "evaluation complete"
        );

        Ok(Evaluation {
            objectives,
            principle,
        })
    }

    /// Evaluate with levers named `v0..v{N-1}`
    ///
    /// # Errors
    ///
    /// `ModelError::MissingLever` naming the first absent lever.
    pub fn evaluate_named(&mut self, levers: &HashMap<String, f64>) -> Result<Evaluation, ModelError> {
        let parameters = (0..self.parameter_count())
            .map(|i| {
                let key = format!("v{}", i);
                levers
                    .get(&key)
                    .copied()
                    .ok_or(ModelError::MissingLever(key))
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.evaluate(&parameters)
    }

    /// Return every entity to its initial state
    pub fn reset(&mut self) {
        self.reservoirs.iter_mut().for_each(Reservoir::reset);
        self.districts.iter_mut().for_each(IrrigationDistrict::reset);
        self.delay_buffers.iter_mut().for_each(DelayBuffer::reset);
        self.leftovers.fill(0.0);
        self.steps_completed = 0;
    }

    fn simulate(&mut self) {
        let horizon = self.config.simulation_horizon;
        let sub_steps = self.config.sub_steps_per_month;
        let mut total_inflow = self.config.initial_total_inflow;

        for t in 0..horizon {
            let month = self.calendar.month_of_year(t);
            let days = self.calendar.days_in_month(t);

            self.policy_input.clear();
            self.policy_input
                .extend(self.reservoirs.iter().map(Reservoir::current_storage));
            self.policy_input.push(month as f64);
            self.policy_input.push(total_inflow);

            self.policy.decide(&self.policy_input, &mut self.decisions);

            for node in &self.plan.nodes {
                let inflow = node_inflow(
                    node,
                    t,
                    &self.catchments,
                    &self.reservoirs,
                    &self.leftovers,
                    &self.delay_buffers,
                );

                match node.target {
                    NodeTarget::Reservoir(r) => {
                        self.reservoirs[r].integrate(days, self.decisions[r], inflow, month, sub_steps)
                    }
                    NodeTarget::Irrigation(d) => {
                        let leftover = self.districts[d].receive(t, inflow);
                        self.leftovers[d] = leftover;
                        if let Some(buffer) = self.plan.delay_for_district[d] {
                            self.delay_buffers[buffer].shift(leftover);
                        }
                    }
                }
            }

            total_inflow = self.catchments.iter().map(|c| c.inflow_at(t)).sum();

            for district in &mut self.districts {
                district.record_deficit(t);
            }

            for reservoir in &mut self.reservoirs {
                reservoir.record_hydropower(days);
                if reservoir.filling_duration_months() == Some(t) {
                    reservoir.clear_filling_schedule();
                    debug!(reservoir = reservoir.name(), step = t, "filling schedule ended");
                }
            }

            trace!(step = t, month, total_inflow, decisions = ?self.decisions, "step complete");
            self.steps_completed = t + 1;
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &BasinConfig {
        &self.config
    }

    /// SHA-256 of the canonical JSON configuration
    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn calendar(&self) -> &SimulationCalendar {
        &self.calendar
    }

    pub fn horizon(&self) -> usize {
        self.config.simulation_horizon
    }

    pub fn steps_completed(&self) -> usize {
        self.steps_completed
    }

    /// Number of free policy parameters an evaluation expects
    pub fn parameter_count(&self) -> usize {
        self.policy.parameter_count()
    }

    pub fn principle(&self) -> Principle {
        self.principle
    }

    pub fn set_principle(&mut self, principle: Principle) {
        self.principle = principle;
    }

    pub fn reservoirs(&self) -> &[Reservoir] {
        &self.reservoirs
    }

    pub fn reservoir(&self, name: &str) -> Option<&Reservoir> {
        self.reservoirs.iter().find(|r| r.name() == name)
    }

    pub fn catchments(&self) -> &[Catchment] {
        &self.catchments
    }

    pub fn catchment(&self, name: &str) -> Option<&Catchment> {
        self.catchments.iter().find(|c| c.name() == name)
    }

    pub fn districts(&self) -> &[IrrigationDistrict] {
        &self.districts
    }

    pub fn district(&self, name: &str) -> Option<&IrrigationDistrict> {
        self.districts.iter().find(|d| d.name() == name)
    }

    /// Every entity's series after the latest evaluation
    pub fn snapshot(&self) -> BasinSnapshot {
        BasinSnapshot {
            steps: self.steps_completed,
            config_hash: self.config_hash.clone(),
            reservoirs: self.reservoirs.iter().map(Into::into).collect(),
            districts: self.districts.iter().map(Into::into).collect(),
        }
    }
}

/// Sum of a node's sources at step `t`
///
/// A node with lagged sources takes its warmup inflow at `t = 0`; without
/// one the lagged terms read zero.
fn node_inflow(
    node: &ResolvedNode,
    t: usize,
    catchments: &[Catchment],
    reservoirs: &[Reservoir],
    leftovers: &[f64],
    delay_buffers: &[DelayBuffer],
) -> f64 {
    if t == 0 && node.lagged {
        if let Some(warmup) = node.warmup_inflow {
            return warmup;
        }
    }

    node.sources
        .iter()
        .map(|source| match *source {
            ResolvedSource::Catchment { index, lagged: false } => catchments[index].inflow_at(t),
            ResolvedSource::Catchment { index, lagged: true } => match t.checked_sub(1) {
                Some(previous) => catchments[index].inflow_at(previous),
                None => 0.0,
            },
            ResolvedSource::Release { reservoir } => reservoirs[reservoir].last_release(),
            ResolvedSource::Leftover { district } => leftovers[district],
            ResolvedSource::DelayedLeftover { buffer } => delay_buffers[buffer].front(),
        })
        .sum()
}
