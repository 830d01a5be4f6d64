//! Hydropower plant model
//!
//! Converts a reservoir's monthly mean release and end-of-month level into
//! energy produced, alongside the energy the plant would produce running at
//! rated capacity for the whole month.
//!
//! Units: flows in m³/s, levels in m a.s.l., power in MW, energy in TWh.

use crate::orchestrator::ModelError;
use serde::{Deserialize, Serialize};

/// Density of water (kg/m³)
pub const WATER_DENSITY: f64 = 1000.0;

/// Gravitational acceleration (m/s²)
pub const GRAVITY: f64 = 9.81;

/// Static plant parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HydropowerPlantConfig {
    /// Turbine-generator efficiency (0, 1]
    pub efficiency: f64,

    /// Maximum flow the turbines can pass (m³/s)
    pub max_turbine_flow: f64,

    /// Tailwater reference level; head is measured above it (m a.s.l.)
    pub head_start_level: f64,

    /// Rated installed capacity (MW)
    pub max_capacity: f64,
}

/// A hydropower plant owned by one reservoir
///
/// # Example
/// ```
/// use basin_sim_core_rs::models::hydropower::{HydropowerPlant, HydropowerPlantConfig};
///
/// let plant = HydropowerPlant::new(HydropowerPlantConfig {
///     efficiency: 0.9,
///     max_turbine_flow: 1000.0,
///     head_start_level: 500.0,
///     max_capacity: 6000.0,
/// })
/// .unwrap();
///
/// // Level at the tailwater reference: no head, no energy
/// let (actual, target) = plant.produce(800.0, 500.0, 30);
/// assert_eq!(actual, 0.0);
/// assert!((target - 6000.0 * 24.0 * 30.0 / 1e6).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HydropowerPlant {
    config: HydropowerPlantConfig,
}

impl HydropowerPlant {
    /// Create a plant, rejecting physically meaningless parameters
    pub fn new(config: HydropowerPlantConfig) -> Result<Self, ModelError> {
        let finite = [
            config.efficiency,
            config.max_turbine_flow,
            config.head_start_level,
            config.max_capacity,
        ]
        .iter()
        .all(|v| v.is_finite());

        if !finite {
            return Err(ModelError::InvalidConfig(
                "hydropower plant parameters must be finite".to_string(),
            ));
        }

        if config.efficiency <= 0.0 || config.efficiency > 1.0 {
            return Err(ModelError::InvalidConfig(format!(
                "hydropower efficiency must be in (0, 1], got {}",
                config.efficiency
            )));
        }

        if config.max_turbine_flow < 0.0 || config.max_capacity < 0.0 {
            return Err(ModelError::InvalidConfig(
                "hydropower max_turbine_flow and max_capacity must be >= 0".to_string(),
            ));
        }

        Ok(Self { config })
    }

    /// Energy produced and target energy for one month
    ///
    /// # Arguments
    /// * `release` - Monthly mean release through the dam (m³/s)
    /// * `level` - Reservoir level at the end of the month (m a.s.l.)
    /// * `days_in_month` - Length of the month
    ///
    /// # Returns
    /// `(actual_energy, target_energy)` in TWh
    pub fn produce(&self, release: f64, level: f64, days_in_month: u32) -> (f64, f64) {
        let release = if release.is_finite() { release } else { 0.0 };
        let level = if level.is_finite() {
            level
        } else {
            self.config.head_start_level
        };

        let turbine_flow = release.clamp(0.0, self.config.max_turbine_flow);
        let head = (level - self.config.head_start_level).max(0.0);

        let power_mw = (WATER_DENSITY * GRAVITY * self.config.efficiency * turbine_flow * head
            / 1e6)
            .min(self.config.max_capacity);

        (
            Self::energy_twh(power_mw, days_in_month),
            self.target_energy(days_in_month),
        )
    }

    /// Energy at rated capacity for the whole month (TWh)
    pub fn target_energy(&self, days_in_month: u32) -> f64 {
        Self::energy_twh(self.config.max_capacity, days_in_month)
    }

    fn energy_twh(power_mw: f64, days_in_month: u32) -> f64 {
        power_mw * 24.0 * days_in_month as f64 / 1e6
    }

    /// Plant parameters
    pub fn config(&self) -> &HydropowerPlantConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plant() -> HydropowerPlant {
        HydropowerPlant::new(HydropowerPlantConfig {
            efficiency: 0.8,
            max_turbine_flow: 500.0,
            head_start_level: 100.0,
            max_capacity: 1_000.0,
        })
        .unwrap()
    }

    #[test]
    fn test_zero_release_produces_nothing() {
        let (actual, target) = plant().produce(0.0, 150.0, 31);
        assert_eq!(actual, 0.0);
        assert!(target > 0.0);
    }

    #[test]
    fn test_level_below_reference_produces_nothing() {
        let (actual, _) = plant().produce(300.0, 80.0, 31);
        assert_eq!(actual, 0.0);
    }

    #[test]
    fn test_production_below_capacity() {
        // 1000 * 9.81 * 0.8 * 100 m³/s * 50 m / 1e6 = 39.24 MW
        let (actual, _) = plant().produce(100.0, 150.0, 30);
        let expected = 39.24 * 24.0 * 30.0 / 1e6;
        assert!((actual - expected).abs() < 1e-12);
    }

    #[test]
    fn test_turbine_flow_is_capped() {
        let (capped, _) = plant().produce(5_000.0, 110.0, 30);
        let (at_cap, _) = plant().produce(500.0, 110.0, 30);
        assert_eq!(capped, at_cap);
    }

    #[test]
    fn test_power_is_capped_at_capacity() {
        let (actual, target) = plant().produce(500.0, 1_000.0, 28);
        assert_eq!(actual, target);
    }

    #[test]
    fn test_non_finite_inputs_are_neutral() {
        let (actual, _) = plant().produce(f64::NAN, f64::INFINITY, 30);
        assert_eq!(actual, 0.0);
    }

    #[test]
    fn test_rejects_zero_efficiency() {
        let result = HydropowerPlant::new(HydropowerPlantConfig {
            efficiency: 0.0,
            max_turbine_flow: 1.0,
            head_start_level: 0.0,
            max_capacity: 1.0,
        });
        assert!(result.is_err());
    }
}
