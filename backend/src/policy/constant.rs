//! Constant Policy
//!
//! Returns the same decision vector every month. Has no free parameters;
//! used for baselines and regression runs.

use super::{PolicyError, ReleasePolicy};

/// Constant policy: fixed decision per reservoir
///
/// # Example
///
/// ```
/// use basin_sim_core_rs::policy::{ConstantPolicy, ReleasePolicy};
///
/// let policy = ConstantPolicy::new(vec![0.25, 1.0]);
/// let mut output = [0.0; 2];
/// policy.decide(&[1.0, 2.0, 3.0, 0.0], &mut output);
/// assert_eq!(output, [0.25, 1.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ConstantPolicy {
    decisions: Vec<f64>,
}

impl ConstantPolicy {
    pub fn new(decisions: Vec<f64>) -> Self {
        Self { decisions }
    }
}

impl ReleasePolicy for ConstantPolicy {
    fn input_count(&self) -> usize {
        self.decisions.len() + 2
    }

    fn output_count(&self) -> usize {
        self.decisions.len()
    }

    fn parameter_count(&self) -> usize {
        0
    }

    fn assign_parameters(&mut self, parameters: &[f64]) -> Result<(), PolicyError> {
        PolicyError::check_count(0, parameters)
    }

    fn decide(&self, _input: &[f64], output: &mut [f64]) {
        for (slot, decision) in output.iter_mut().zip(&self.decisions) {
            *slot = *decision;
        }
    }
}
