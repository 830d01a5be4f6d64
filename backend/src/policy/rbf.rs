//! Gaussian RBF Policy
//!
//! Radial-basis-function network mapping the normalised input vector to one
//! release decision per reservoir:
//!
//! ```text
//! phi_i(x) = exp(-Σ_j (x_j - c_ij)² / r_ij²)
//! u_k(x)   = clamp(Σ_i w_ik · phi_i(x), 0, 1)
//! ```
//!
//! Inputs are normalised to [0, 1] with the configured `input_min` /
//! `input_max` bounds before evaluation.
//!
//! # Parameter Layout
//!
//! Each basis function contributes `2 * n_inputs + n_outputs` parameters:
//! `n_inputs` (centre, radius) pairs followed by `n_outputs` weights.

use super::{PolicyError, ReleasePolicy};

/// Smallest squared radius used in the kernel exponent
const MIN_RADIUS_SQUARED: f64 = 1e-12;

/// Gaussian RBF network policy
///
/// # Example
///
/// ```
/// use basin_sim_core_rs::policy::{RbfPolicy, ReleasePolicy};
///
/// // One reservoir → 3 inputs, 1 output; one RBF → 2 * 3 + 1 = 7 parameters
/// let mut policy = RbfPolicy::new(1, 1, vec![0.0; 3], vec![1.0; 3]).unwrap();
/// assert_eq!(policy.parameter_count(), 7);
///
/// policy
///     .assign_parameters(&[0.5, 1.0, 0.5, 1.0, 0.5, 1.0, 0.8])
///     .unwrap();
///
/// // Input at the centre: kernel = 1, decision = weight
/// let mut output = [0.0];
/// policy.decide(&[0.5, 0.5, 0.5], &mut output);
/// assert!((output[0] - 0.8).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RbfPolicy {
    n_rbf: usize,
    n_inputs: usize,
    n_outputs: usize,
    input_min: Vec<f64>,
    input_span: Vec<f64>,
    /// `n_rbf * n_inputs`, row per basis function
    centers: Vec<f64>,
    /// `n_rbf * n_inputs`
    radii: Vec<f64>,
    /// `n_rbf * n_outputs`
    weights: Vec<f64>,
}

impl RbfPolicy {
    /// Create an RBF network for `n_reservoirs` reservoirs
    ///
    /// All parameters start at zero (every decision is 0 until assigned).
    pub fn new(
        n_rbf: usize,
        n_reservoirs: usize,
        input_min: Vec<f64>,
        input_max: Vec<f64>,
    ) -> Result<Self, PolicyError> {
        let n_inputs = n_reservoirs + 2;

        if n_rbf == 0 {
            return Err(PolicyError::InvalidConfig(
                "n_rbf must be > 0".to_string(),
            ));
        }

        if input_min.len() != n_inputs || input_max.len() != n_inputs {
            return Err(PolicyError::InvalidConfig(format!(
                "input_min and input_max need {} entries, got {} and {}",
                n_inputs,
                input_min.len(),
                input_max.len()
            )));
        }

        if input_min
            .iter()
            .zip(&input_max)
            .any(|(lo, hi)| !lo.is_finite() || !hi.is_finite() || hi < lo)
        {
            return Err(PolicyError::InvalidConfig(
                "input bounds must be finite with input_max >= input_min".to_string(),
            ));
        }

        let input_span = input_min
            .iter()
            .zip(&input_max)
            .map(|(lo, hi)| hi - lo)
            .collect();

        Ok(Self {
            n_rbf,
            n_inputs,
            n_outputs: n_reservoirs,
            input_min,
            input_span,
            centers: vec![0.0; n_rbf * n_inputs],
            radii: vec![0.0; n_rbf * n_inputs],
            weights: vec![0.0; n_rbf * n_reservoirs],
        })
    }

    fn parameters_per_rbf(&self) -> usize {
        2 * self.n_inputs + self.n_outputs
    }

    fn normalise(&self, j: usize, value: f64) -> f64 {
        let span = self.input_span[j];
        if span > 0.0 {
            (value - self.input_min[j]) / span
        } else {
            0.0
        }
    }
}

impl ReleasePolicy for RbfPolicy {
    fn input_count(&self) -> usize {
        self.n_inputs
    }

    fn output_count(&self) -> usize {
        self.n_outputs
    }

    fn parameter_count(&self) -> usize {
        self.n_rbf * self.parameters_per_rbf()
    }

    fn assign_parameters(&mut self, parameters: &[f64]) -> Result<(), PolicyError> {
        PolicyError::check_count(self.parameter_count(), parameters)?;

        let (n_in, n_out) = (self.n_inputs, self.n_outputs);
        for (i, block) in parameters.chunks_exact(self.parameters_per_rbf()).enumerate() {
            for j in 0..n_in {
                self.centers[i * n_in + j] = block[2 * j];
                self.radii[i * n_in + j] = block[2 * j + 1];
            }
            self.weights[i * n_out..(i + 1) * n_out].copy_from_slice(&block[2 * n_in..]);
        }

        Ok(())
    }

    fn decide(&self, input: &[f64], output: &mut [f64]) {
        output.fill(0.0);

        for i in 0..self.n_rbf {
            let mut exponent = 0.0;
            for (j, value) in input.iter().take(self.n_inputs).enumerate() {
                let offset = self.normalise(j, *value) - self.centers[i * self.n_inputs + j];
                let radius = self.radii[i * self.n_inputs + j];
                exponent += offset * offset / (radius * radius).max(MIN_RADIUS_SQUARED);
            }
            let kernel = (-exponent).exp();

            for (k, slot) in output.iter_mut().enumerate().take(self.n_outputs) {
                *slot += self.weights[i * self.n_outputs + k] * kernel;
            }
        }

        for slot in output.iter_mut() {
            *slot = if slot.is_nan() { 0.0 } else { slot.clamp(0.0, 1.0) };
        }
    }
}
