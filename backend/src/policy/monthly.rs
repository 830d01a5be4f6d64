//! Monthly Table Policy
//!
//! One decision per (calendar month, reservoir). The month is read from the
//! policy input vector, so a parameter vector fully determines a fixed
//! decision sequence for the whole horizon.
//!
//! # Parameter Layout
//!
//! `12 * n_reservoirs` values, month-major:
//! `[jan_r0, jan_r1, ..., feb_r0, ...]`

use super::{PolicyError, ReleasePolicy};

/// Month-indexed decision table
///
/// # Example
///
/// ```
/// use basin_sim_core_rs::policy::{MonthlyTablePolicy, ReleasePolicy};
///
/// let mut policy = MonthlyTablePolicy::new(1);
/// let table: Vec<f64> = (1..=12).map(|m| m as f64 / 12.0).collect();
/// policy.assign_parameters(&table).unwrap();
///
/// let mut output = [0.0];
/// policy.decide(&[1.0e9, 6.0, 0.0], &mut output); // June
/// assert_eq!(output[0], 0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTablePolicy {
    n_reservoirs: usize,
    table: Vec<f64>,
}

impl MonthlyTablePolicy {
    /// Create a table policy; all decisions start at zero
    pub fn new(n_reservoirs: usize) -> Self {
        Self {
            n_reservoirs,
            table: vec![0.0; 12 * n_reservoirs],
        }
    }

    fn month_index(&self, input: &[f64]) -> usize {
        let month = input.get(self.n_reservoirs).copied().unwrap_or(1.0);
        if month.is_nan() {
            return 0;
        }
        (month.round().clamp(1.0, 12.0) as usize) - 1
    }
}

impl ReleasePolicy for MonthlyTablePolicy {
    fn input_count(&self) -> usize {
        self.n_reservoirs + 2
    }

    fn output_count(&self) -> usize {
        self.n_reservoirs
    }

    fn parameter_count(&self) -> usize {
        self.table.len()
    }

    fn assign_parameters(&mut self, parameters: &[f64]) -> Result<(), PolicyError> {
        PolicyError::check_count(self.table.len(), parameters)?;
        self.table.copy_from_slice(parameters);
        Ok(())
    }

    fn decide(&self, input: &[f64], output: &mut [f64]) {
        let row = self.month_index(input) * self.n_reservoirs;
        for (slot, decision) in output
            .iter_mut()
            .zip(&self.table[row..row + self.n_reservoirs])
        {
            *slot = *decision;
        }
    }
}
