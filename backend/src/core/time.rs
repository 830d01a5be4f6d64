//! Time management for the simulation
//!
//! The simulation operates in discrete monthly steps. This module maps a
//! step index onto its calendar month and day count.

use crate::orchestrator::ModelError;
use serde::{Deserialize, Serialize};

/// Seconds in one day, used to convert m³/s rates into monthly volumes
pub const SECONDS_PER_DAY: f64 = 86_400.0;

/// Day counts of a non-leap Gregorian year, January first
pub const STANDARD_DAYS_PER_MONTH: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

/// Maps simulation steps onto calendar months
///
/// # Example
/// ```
/// use basin_sim_core_rs::SimulationCalendar;
/// use basin_sim_core_rs::core::time::STANDARD_DAYS_PER_MONTH;
///
/// let calendar = SimulationCalendar::new(11, STANDARD_DAYS_PER_MONTH).unwrap();
/// assert_eq!(calendar.month_of_year(0), 11);
/// assert_eq!(calendar.month_of_year(2), 1); // wraps into January
/// assert_eq!(calendar.days_in_month(1), 31); // December
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationCalendar {
    /// Calendar month (1-12) of step 0
    init_month: u32,
    /// Number of days in each calendar month, January first
    days_per_month: [u32; 12],
}

impl SimulationCalendar {
    /// Create a new calendar
    ///
    /// # Arguments
    /// * `init_month` - Calendar month of the first simulated step (1-12)
    /// * `days_per_month` - Day count per calendar month, January first
    pub fn new(init_month: u32, days_per_month: [u32; 12]) -> Result<Self, ModelError> {
        if !(1..=12).contains(&init_month) {
            return Err(ModelError::InvalidConfig(format!(
                "init_month must be in 1..=12, got {}",
                init_month
            )));
        }

        if let Some(index) = days_per_month.iter().position(|&days| days == 0) {
            return Err(ModelError::InvalidConfig(format!(
                "days_per_month[{}] must be > 0",
                index
            )));
        }

        Ok(Self {
            init_month,
            days_per_month,
        })
    }

    /// Calendar month (1-12) of the given step
    pub fn month_of_year(&self, step: usize) -> u32 {
        ((self.init_month as usize + step - 1) % 12 + 1) as u32
    }

    /// Number of days in the calendar month of the given step
    pub fn days_in_month(&self, step: usize) -> u32 {
        self.days_per_month[self.month_of_year(step) as usize - 1]
    }

    /// Number of seconds in the calendar month of the given step
    pub fn seconds_in_month(&self, step: usize) -> f64 {
        self.days_in_month(step) as f64 * SECONDS_PER_DAY
    }

    /// Calendar month of step 0
    pub fn init_month(&self) -> u32 {
        self.init_month
    }

    /// Day counts per calendar month
    pub fn days_per_month(&self) -> &[u32; 12] {
        &self.days_per_month
    }
}
