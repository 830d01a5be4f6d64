//! Model configuration
//!
//! Everything that is fixed across evaluations: the calendar, the entities,
//! the routing walk, the objective selection and the policy shape. Loaded
//! from JSON once; time series arrive separately as [`HydrologyInput`].

use super::topology::RoutingNode;
use super::ModelError;
use crate::core::time::STANDARD_DAYS_PER_MONTH;
use crate::models::ReservoirConfig;
use crate::objectives::{ObjectiveConfig, Principle};
use crate::policy::PolicyConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

fn default_days_per_month() -> [u32; 12] {
    STANDARD_DAYS_PER_MONTH
}

fn default_sub_steps() -> usize {
    1
}

/// Static basin model configuration
///
/// Declaration order matters: reservoirs are laid out in the policy input
/// and output vectors in the order listed here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BasinConfig {
    /// Number of monthly steps per evaluation
    pub simulation_horizon: usize,

    /// Calendar month (1-12) of the first step
    pub init_month: u32,

    #[serde(default = "default_days_per_month")]
    pub days_per_month: [u32; 12],

    /// Euler sub-steps per month in reservoir integration
    #[serde(default = "default_sub_steps")]
    pub sub_steps_per_month: usize,

    /// Total catchment inflow fed to the policy at the first step (m³/s)
    #[serde(default)]
    pub initial_total_inflow: f64,

    pub reservoirs: Vec<ReservoirConfig>,

    /// Catchment names; inflow series come from the hydrology input
    pub catchments: Vec<String>,

    /// District names; demand series come from the hydrology input
    pub irrigation_districts: Vec<String>,

    /// Monthly walk, upstream first
    pub routing: Vec<RoutingNode>,

    pub objectives: ObjectiveConfig,

    #[serde(default)]
    pub principle: Principle,

    pub policy: PolicyConfig,
}

impl BasinConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|e| ModelError::Parse(format!("basin config: {}", e)))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn reservoir_names(&self) -> Vec<String> {
        self.reservoirs.iter().map(|r| r.name.clone()).collect()
    }
}

/// Inflow and demand series, keyed by catchment and district name (m³/s)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HydrologyInput {
    pub inflows: BTreeMap<String, Vec<f64>>,
    pub demands: BTreeMap<String, Vec<f64>>,
}

impl HydrologyInput {
    pub fn from_json_str(json: &str) -> Result<Self, ModelError> {
        serde_json::from_str(json).map_err(|e| ModelError::Parse(format!("hydrology: {}", e)))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    /// Remove the series for `name`, checking it covers the horizon
    pub(crate) fn take_series(
        series: &mut BTreeMap<String, Vec<f64>>,
        name: &str,
        horizon: usize,
    ) -> Result<Vec<f64>, ModelError> {
        let values = series
            .remove(name)
            .ok_or_else(|| ModelError::MissingSeries(name.to_string()))?;

        if values.len() < horizon {
            return Err(ModelError::SeriesTooShort {
                name: name.to_string(),
                len: values.len(),
                horizon,
            });
        }

        Ok(values)
    }
}
