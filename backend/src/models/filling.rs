//! Initial filling of a new reservoir
//!
//! A filling schedule holds one entry per calendar month (January first)
//! and overrides the policy release until the filling period ends. It is
//! either given directly as forced releases, or derived from a
//! `FillingPlan`:
//!
//! ```text
//! rate      = max(0, target_storage - initial_storage) / (duration_years * 365 * 86400)
//! gain[m]   = 12 * rate * w[m] / Σ w
//! release   = clamp(inflow - gain[m], min_release, max_release)
//! ```
//!
//! where `w[m]` is the inflow of the weighting catchment during the first
//! simulated step that falls in calendar month `m`. Wet months therefore
//! retain more water, and the gains average to `rate` over a year.

use crate::core::time::{SimulationCalendar, SECONDS_PER_DAY};
use crate::orchestrator::ModelError;
use serde::{Deserialize, Serialize};

/// Forced behaviour during the filling period
#[derive(Debug, Clone, PartialEq)]
pub enum FillingSchedule {
    /// Release per calendar month (m³/s)
    Release(Vec<f64>),

    /// Storage gain retained per calendar month (m³/s); the rest of the
    /// inflow is released
    StorageGain(Vec<f64>),
}

impl FillingSchedule {
    pub fn entries(&self) -> &[f64] {
        match self {
            FillingSchedule::Release(entries) | FillingSchedule::StorageGain(entries) => entries,
        }
    }

    /// Release forced in the given month, before bound clamping
    pub(crate) fn forced_release(&self, month_index: usize, inflow: f64) -> Option<f64> {
        match self {
            FillingSchedule::Release(entries) => entries.get(month_index).copied(),
            FillingSchedule::StorageGain(entries) => {
                entries.get(month_index).map(|gain| inflow - gain)
            }
        }
    }
}

/// Filling schedule computed from a storage target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FillingPlan {
    /// Storage to reach by the end of the filling period (m³)
    pub target_storage: f64,

    /// Length of the filling period
    pub duration_years: usize,

    /// Catchment whose inflow distributes the gain across months
    pub weights_catchment: String,
}

impl FillingPlan {
    pub fn duration_months(&self) -> usize {
        self.duration_years * 12
    }

    pub(crate) fn validate(&self, reservoir: &str) -> Result<(), ModelError> {
        if !self.target_storage.is_finite() || self.target_storage < 0.0 {
            return Err(ModelError::InvalidConfig(format!(
                "reservoir '{}': filling target_storage must be finite and >= 0",
                reservoir
            )));
        }
        if self.duration_years == 0 {
            return Err(ModelError::InvalidConfig(format!(
                "reservoir '{}': filling duration_years must be > 0",
                reservoir
            )));
        }
        Ok(())
    }

    /// Mean storage gain over the filling period (m³/s)
    pub fn mean_gain_rate(&self, initial_storage: f64) -> f64 {
        let seconds = self.duration_years as f64 * 365.0 * SECONDS_PER_DAY;
        (self.target_storage - initial_storage).max(0.0) / seconds
    }

    /// Monthly storage gains (m³/s), January first
    ///
    /// Months the weighting series never reaches get no gain. An all-zero
    /// weighting spreads the rate evenly.
    pub fn storage_gains(
        &self,
        initial_storage: f64,
        weights_inflow: &[f64],
        calendar: &SimulationCalendar,
    ) -> Vec<f64> {
        let mut weights = [0.0; 12];
        let mut seen = [false; 12];
        for (t, inflow) in weights_inflow.iter().enumerate().take(12) {
            let month_index = calendar.month_of_year(t) as usize - 1;
            if !seen[month_index] {
                weights[month_index] = if inflow.is_finite() { inflow.max(0.0) } else { 0.0 };
                seen[month_index] = true;
            }
        }

        let rate = self.mean_gain_rate(initial_storage);
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            weights.iter().map(|w| 12.0 * rate * w / total).collect()
        } else {
            vec![rate; 12]
        }
    }
}
