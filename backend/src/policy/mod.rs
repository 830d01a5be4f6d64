//! Release Policy Module
//!
//! This module defines the interface between the simulation loop and the
//! parametric control policy that decides reservoir releases.
//!
//! # Overview
//!
//! Once per month the simulation loop builds an input vector
//!
//! ```text
//! [storage_0, ..., storage_{n-1}, month_of_year, total_inflow_previous_month]
//! ```
//!
//! with reservoir storages in the declared reservoir order, calls the policy
//! exactly once, and reads back one decision per reservoir in the same order.
//! A decision is a fraction in [0, 1] of the reservoir's feasible release
//! interval.
//!
//! # Policy Interface
//!
//! All policies implement the `ReleasePolicy` trait:
//! ```rust
//! use basin_sim_core_rs::policy::{PolicyError, ReleasePolicy};
//!
//! struct HalfOpen {
//!     n_reservoirs: usize,
//! }
//!
//! impl ReleasePolicy for HalfOpen {
//!     fn input_count(&self) -> usize {
//!         self.n_reservoirs + 2
//!     }
//!
//!     fn output_count(&self) -> usize {
//!         self.n_reservoirs
//!     }
//!
//!     fn parameter_count(&self) -> usize {
//!         0
//!     }
//!
//!     fn assign_parameters(&mut self, parameters: &[f64]) -> Result<(), PolicyError> {
//!         PolicyError::check_count(0, parameters)
//!     }
//!
//!     fn decide(&self, _input: &[f64], output: &mut [f64]) {
//!         output.fill(0.5);
//!     }
//! }
//! ```
//!
//! Available policies (selected with `PolicyConfig`):
//! 1. **Rbf**: Gaussian radial-basis-function approximator (optimised levers)
//! 2. **MonthlyTable**: one decision per calendar month and reservoir
//! 3. **Constant**: fixed decisions, no free parameters

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod constant;
pub mod monthly;
pub mod rbf;

pub use constant::ConstantPolicy;
pub use monthly::MonthlyTablePolicy;
pub use rbf::RbfPolicy;

/// Errors raised while configuring a policy or assigning its parameters
#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("Expected {expected} policy parameters, got {actual}")]
    ParameterCount { expected: usize, actual: usize },

    #[error("Invalid policy config: {0}")]
    InvalidConfig(String),
}

impl PolicyError {
    /// Fail unless `parameters` has exactly `expected` entries
    pub fn check_count(expected: usize, parameters: &[f64]) -> Result<(), PolicyError> {
        if parameters.len() == expected {
            Ok(())
        } else {
            Err(PolicyError::ParameterCount {
                expected,
                actual: parameters.len(),
            })
        }
    }
}

/// A parametric release policy
///
/// `decide` is a pure function of the assigned parameters and the input.
/// It must not fail: any numerical trouble is the caller's to clamp.
pub trait ReleasePolicy: Send {
    /// Length of the input vector (reservoir count + 2)
    fn input_count(&self) -> usize;

    /// Length of the output vector (reservoir count)
    fn output_count(&self) -> usize;

    /// Number of free parameters the outer search controls
    fn parameter_count(&self) -> usize;

    /// Replace the free parameters
    ///
    /// The only fallible operation: a wrong-length vector is a
    /// configuration bug of the caller.
    fn assign_parameters(&mut self, parameters: &[f64]) -> Result<(), PolicyError>;

    /// Map `input` onto one decision per reservoir, written into `output`
    fn decide(&self, input: &[f64], output: &mut [f64]);
}

/// Policy selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Gaussian RBF network
    Rbf {
        /// Number of radial basis functions
        n_rbf: usize,
        /// Lower normalisation bound per input
        input_min: Vec<f64>,
        /// Upper normalisation bound per input
        input_max: Vec<f64>,
    },

    /// Lookup table indexed by calendar month
    MonthlyTable,

    /// Fixed decisions, one per reservoir
    Constant { decisions: Vec<f64> },
}

/// Build the configured policy for `n_reservoirs` reservoirs
pub fn build_policy(
    config: &PolicyConfig,
    n_reservoirs: usize,
) -> Result<Box<dyn ReleasePolicy>, PolicyError> {
    let policy: Box<dyn ReleasePolicy> = match config {
        PolicyConfig::Rbf {
            n_rbf,
            input_min,
            input_max,
        } => Box::new(RbfPolicy::new(
            *n_rbf,
            n_reservoirs,
            input_min.clone(),
            input_max.clone(),
        )?),
        PolicyConfig::MonthlyTable => Box::new(MonthlyTablePolicy::new(n_reservoirs)),
        PolicyConfig::Constant { decisions } => {
            if decisions.len() != n_reservoirs {
                return Err(PolicyError::InvalidConfig(format!(
                    "constant policy needs {} decisions, got {}",
                    n_reservoirs,
                    decisions.len()
                )));
            }
            Box::new(ConstantPolicy::new(decisions.clone()))
        }
    };

    Ok(policy)
}
