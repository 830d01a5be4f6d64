//! Reservoir model
//!
//! A reservoir integrates its own mass balance month by month:
//!
//! ```text
//! dS/dt = inflow - evaporation - release
//! ```
//!
//! using a fixed number of explicit Euler sub-steps per month. The release at
//! each sub-step maps the policy decision (a fraction in [0, 1]) onto the
//! feasible release interval for the current storage.
//!
//! Units: storage in m³, flows in m³/s (monthly means), levels in m a.s.l.,
//! evaporation rates in cm per month, hydropower in TWh.
//!
//! CRITICAL: `integrate` never fails and never drives storage negative. It
//! runs inside the optimisation hot loop and must tolerate any decision the
//! outer search produces.

use super::curve::Curve;
use super::deficit_from_target;
use super::filling::{FillingPlan, FillingSchedule};
use super::hydropower::{HydropowerPlant, HydropowerPlantConfig};
use crate::core::time::SECONDS_PER_DAY;
use crate::orchestrator::ModelError;
use serde::{Deserialize, Serialize};

/// Level ↔ storage table (levels in m a.s.l., storages in m³)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelStorageTable {
    pub levels: Vec<f64>,
    pub storages: Vec<f64>,
}

/// Level → surface area table (levels in m a.s.l., surfaces in m²)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LevelSurfaceTable {
    pub levels: Vec<f64>,
    pub surfaces: Vec<f64>,
}

/// Storage → feasible release interval table (storages in m³, releases in m³/s)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseBoundsTable {
    pub storages: Vec<f64>,
    pub min_release: Vec<f64>,
    pub max_release: Vec<f64>,
}

/// Static reservoir parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReservoirConfig {
    /// Unique reservoir name (also its position in the policy vectors)
    pub name: String,

    /// Storage at the start of every evaluation (m³)
    pub initial_storage: f64,

    pub level_storage: LevelStorageTable,

    pub level_surface: LevelSurfaceTable,

    pub release_bounds: ReleaseBoundsTable,

    /// Open-water evaporation per calendar month, January first (cm/month)
    #[serde(default)]
    pub evaporation_rates: [f64; 12],

    #[serde(default)]
    pub hydropower_plants: Vec<HydropowerPlantConfig>,

    /// Release forced during the initial filling period, indexed by
    /// calendar month (January first, m³/s)
    #[serde(default)]
    pub filling_schedule: Option<Vec<f64>>,

    /// Step after which the filling schedule is dropped
    #[serde(default)]
    pub filling_duration_months: Option<usize>,

    /// Derive the filling schedule from a storage target instead; excludes
    /// `filling_schedule` and `filling_duration_months`
    #[serde(default)]
    pub filling_plan: Option<FillingPlan>,
}

/// A reservoir and its per-evaluation time series
///
/// Series invariant after step `t` (0-indexed): `storage` holds `t + 2`
/// values (index 0 is the initial storage), every other series `t + 1`.
#[derive(Debug, Clone)]
pub struct Reservoir {
    name: String,
    initial_storage: f64,

    storage_to_level: Curve,
    level_to_surface: Curve,
    min_release: Curve,
    max_release: Curve,
    evaporation_rates: [f64; 12],

    hydropower_plants: Vec<HydropowerPlant>,

    /// Schedule restored on every reset
    configured_schedule: Option<FillingSchedule>,
    filling_schedule: Option<FillingSchedule>,
    filling_duration_months: Option<usize>,
    filling_plan: Option<FillingPlan>,

    storage: Vec<f64>,
    level: Vec<f64>,
    release: Vec<f64>,
    evaporation: Vec<f64>,
    hydropower_production: Vec<f64>,
    hydropower_deficit: Vec<f64>,
    hydropower_target: Vec<f64>,
}

impl Reservoir {
    /// Build a reservoir from its configuration
    pub fn new(config: ReservoirConfig) -> Result<Self, ModelError> {
        let name = config.name;

        if !config.initial_storage.is_finite() || config.initial_storage < 0.0 {
            return Err(ModelError::InvalidConfig(format!(
                "reservoir '{}': initial_storage must be finite and >= 0",
                name
            )));
        }

        if config.evaporation_rates.iter().any(|r| !r.is_finite()) {
            return Err(ModelError::InvalidConfig(format!(
                "reservoir '{}': evaporation rates must be finite",
                name
            )));
        }

        let storage_to_level = Curve::new(
            &format!("{}.storage_to_level", name),
            config.level_storage.storages,
            config.level_storage.levels,
        )?;
        let level_to_surface = Curve::new(
            &format!("{}.level_to_surface", name),
            config.level_surface.levels,
            config.level_surface.surfaces,
        )?;
        let min_release = Curve::new(
            &format!("{}.min_release", name),
            config.release_bounds.storages.clone(),
            config.release_bounds.min_release,
        )?;
        let max_release = Curve::new(
            &format!("{}.max_release", name),
            config.release_bounds.storages,
            config.release_bounds.max_release,
        )?;

        if let Some(schedule) = &config.filling_schedule {
            if schedule.is_empty() || schedule.iter().any(|r| !r.is_finite()) {
                return Err(ModelError::InvalidConfig(format!(
                    "reservoir '{}': filling_schedule must be non-empty and finite",
                    name
                )));
            }
        }

        if let Some(plan) = &config.filling_plan {
            if config.filling_schedule.is_some() || config.filling_duration_months.is_some() {
                return Err(ModelError::InvalidConfig(format!(
                    "reservoir '{}': filling_plan excludes filling_schedule and filling_duration_months",
                    name
                )));
            }
            plan.validate(&name)?;
        }

        let configured_schedule = config.filling_schedule.map(FillingSchedule::Release);

        let hydropower_plants = config
            .hydropower_plants
            .into_iter()
            .map(HydropowerPlant::new)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name,
            initial_storage: config.initial_storage,
            storage_to_level,
            level_to_surface,
            min_release,
            max_release,
            evaporation_rates: config.evaporation_rates,
            hydropower_plants,
            filling_schedule: configured_schedule.clone(),
            configured_schedule,
            filling_duration_months: config.filling_duration_months,
            filling_plan: config.filling_plan,
            storage: vec![config.initial_storage],
            level: Vec::new(),
            release: Vec::new(),
            evaporation: Vec::new(),
            hydropower_production: Vec::new(),
            hydropower_deficit: Vec::new(),
            hydropower_target: Vec::new(),
        })
    }

    /// Advance the reservoir by one calendar month
    ///
    /// # Arguments
    /// * `days_in_month` - Length of the month
    /// * `decision` - Policy output, mapped onto the feasible release interval
    /// * `inflow` - Monthly mean inflow (m³/s)
    /// * `month_of_year` - Calendar month (1-12), selects evaporation rate
    ///   and filling-schedule entry
    /// * `sub_steps` - Number of equal integration steps in the month
    ///
    /// Appends one value each to `storage`, `level`, `release` and
    /// `evaporation`. Nothing else is touched.
    pub fn integrate(
        &mut self,
        days_in_month: u32,
        decision: f64,
        inflow: f64,
        month_of_year: u32,
        sub_steps: usize,
    ) {
        let sub_steps = sub_steps.max(1);
        let dt = days_in_month as f64 * SECONDS_PER_DAY / sub_steps as f64;
        let month_index = (month_of_year as usize + 11) % 12;

        let inflow = if inflow.is_finite() { inflow.max(0.0) } else { 0.0 };
        let fraction = if decision.is_nan() {
            0.0
        } else {
            decision.clamp(0.0, 1.0)
        };
        let scheduled = self
            .filling_schedule
            .as_ref()
            .and_then(|schedule| schedule.forced_release(month_index, inflow));
        let evaporation_depth = self.evaporation_rates[month_index] / 100.0 / sub_steps as f64;

        let mut storage = self.current_storage();
        let mut release_sum = 0.0;
        let mut evaporation_total = 0.0;

        for _ in 0..sub_steps {
            let level = self.storage_to_level.interpolate(storage);
            let surface = self.level_to_surface.interpolate(level).max(0.0);

            let mut available = storage + inflow * dt;
            let evaporation = (surface * evaporation_depth).min(available);
            available -= evaporation;

            let (min_release, max_release) = self.release_bounds(storage);
            let release = match scheduled {
                Some(forced) => forced.clamp(min_release, max_release),
                None => min_release + fraction * (max_release - min_release),
            };
            // Never release more water than the reservoir holds
            let release = release.min(available.max(0.0) / dt).max(0.0);

            storage = (available - release * dt).max(0.0);
            release_sum += release;
            evaporation_total += evaporation;
        }

        self.storage.push(storage);
        self.level.push(self.storage_to_level.interpolate(storage));
        self.release.push(release_sum / sub_steps as f64);
        self.evaporation.push(evaporation_total);
    }

    /// Feasible `(min, max)` release (m³/s) at the given storage
    ///
    /// An inverted table entry (min above max) collapses onto max.
    pub fn release_bounds(&self, storage: f64) -> (f64, f64) {
        let max_release = self.max_release.interpolate(storage).max(0.0);
        let min_release = self.min_release.interpolate(storage).max(0.0).min(max_release);
        (min_release, max_release)
    }

    /// Level (m a.s.l.) corresponding to a storage (m³)
    pub fn storage_to_level(&self, storage: f64) -> f64 {
        self.storage_to_level.interpolate(storage)
    }

    /// Sum production over owned plants for the month just integrated
    ///
    /// Appends to `hydropower_production`, `hydropower_target` and
    /// `hydropower_deficit = max(0, target - production)`.
    pub fn record_hydropower(&mut self, days_in_month: u32) {
        let release = self.last_release();
        let level = self
            .level
            .last()
            .copied()
            .unwrap_or_else(|| self.storage_to_level(self.initial_storage));

        let (production, target) = self
            .hydropower_plants
            .iter()
            .map(|plant| plant.produce(release, level, days_in_month))
            .fold((0.0, 0.0), |(p, t), (plant_p, plant_t)| (p + plant_p, t + plant_t));

        self.hydropower_production.push(production);
        self.hydropower_target.push(target);
        self.hydropower_deficit.push(deficit_from_target(production, target));
    }

    /// Install the storage gains computed from the filling plan
    ///
    /// The gains become the schedule restored on every reset, and the
    /// plan's duration becomes the filling duration.
    pub fn apply_filling_gains(&mut self, gains: Vec<f64>) {
        let schedule = FillingSchedule::StorageGain(gains);
        self.filling_duration_months = self.filling_plan.as_ref().map(FillingPlan::duration_months);
        self.configured_schedule = Some(schedule.clone());
        self.filling_schedule = Some(schedule);
    }

    /// Drop the filling schedule; policy releases apply from now on
    pub fn clear_filling_schedule(&mut self) {
        self.filling_schedule = None;
    }

    /// Return to the initial condition
    ///
    /// Keeps only the initial storage, clears every other series and
    /// restores the configured filling schedule.
    pub fn reset(&mut self) {
        self.storage.truncate(1);
        self.level.clear();
        self.release.clear();
        self.evaporation.clear();
        self.hydropower_production.clear();
        self.hydropower_deficit.clear();
        self.hydropower_target.clear();
        self.filling_schedule = self.configured_schedule.clone();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Storage at the end of the latest integrated month
    pub fn current_storage(&self) -> f64 {
        self.storage.last().copied().unwrap_or(self.initial_storage)
    }

    /// Mean release of the latest integrated month (0 before the first)
    pub fn last_release(&self) -> f64 {
        self.release.last().copied().unwrap_or(0.0)
    }

    pub fn storage(&self) -> &[f64] {
        &self.storage
    }

    pub fn level(&self) -> &[f64] {
        &self.level
    }

    pub fn release(&self) -> &[f64] {
        &self.release
    }

    pub fn evaporation(&self) -> &[f64] {
        &self.evaporation
    }

    pub fn hydropower_production(&self) -> &[f64] {
        &self.hydropower_production
    }

    pub fn hydropower_deficit(&self) -> &[f64] {
        &self.hydropower_deficit
    }

    pub fn hydropower_target(&self) -> &[f64] {
        &self.hydropower_target
    }

    pub fn hydropower_plants(&self) -> &[HydropowerPlant] {
        &self.hydropower_plants
    }

    /// Entries of the active filling schedule
    pub fn filling_schedule(&self) -> Option<&[f64]> {
        self.filling_schedule.as_ref().map(FillingSchedule::entries)
    }

    pub fn filling(&self) -> Option<&FillingSchedule> {
        self.filling_schedule.as_ref()
    }

    pub fn filling_plan(&self) -> Option<&FillingPlan> {
        self.filling_plan.as_ref()
    }

    pub fn initial_storage(&self) -> f64 {
        self.initial_storage
    }

    pub fn filling_duration_months(&self) -> Option<usize> {
        self.filling_duration_months
    }
}
