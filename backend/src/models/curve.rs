//! Piecewise-linear relationship tables
//!
//! Reservoir physics (level-storage, level-surface, storage-release bounds)
//! are tabulated curves. Evaluation interpolates linearly between points and
//! holds the end values outside the tabulated range.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while building a curve from configuration
#[derive(Debug, Error, PartialEq)]
pub enum CurveError {
    #[error("Curve '{name}' has no points")]
    Empty { name: String },

    #[error("Curve '{name}' has {x_len} abscissa values but {y_len} ordinate values")]
    LengthMismatch {
        name: String,
        x_len: usize,
        y_len: usize,
    },

    #[error("Curve '{name}' abscissa must be strictly increasing (violated at index {index})")]
    NotIncreasing { name: String, index: usize },

    #[error("Curve '{name}' contains a non-finite value")]
    NonFinite { name: String },
}

/// A validated piecewise-linear function `y = f(x)`
///
/// # Example
/// ```
/// use basin_sim_core_rs::models::curve::Curve;
///
/// let curve = Curve::new("storage_to_level", vec![0.0, 10.0], vec![100.0, 120.0]).unwrap();
/// assert_eq!(curve.interpolate(5.0), 110.0);
/// assert_eq!(curve.interpolate(-3.0), 100.0); // held at the first point
/// assert_eq!(curve.interpolate(50.0), 120.0); // held at the last point
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Curve {
    /// Build a curve, checking the table is usable for interpolation
    pub fn new(name: &str, x: Vec<f64>, y: Vec<f64>) -> Result<Self, CurveError> {
        if x.is_empty() {
            return Err(CurveError::Empty {
                name: name.to_string(),
            });
        }

        if x.len() != y.len() {
            return Err(CurveError::LengthMismatch {
                name: name.to_string(),
                x_len: x.len(),
                y_len: y.len(),
            });
        }

        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(CurveError::NonFinite {
                name: name.to_string(),
            });
        }

        if let Some(index) = x.windows(2).position(|pair| pair[1] <= pair[0]) {
            return Err(CurveError::NotIncreasing {
                name: name.to_string(),
                index: index + 1,
            });
        }

        Ok(Self { x, y })
    }

    /// Evaluate the curve at `at`
    ///
    /// NaN evaluates as the first tabulated point.
    pub fn interpolate(&self, at: f64) -> f64 {
        let last = self.x.len() - 1;

        if at.is_nan() || at <= self.x[0] {
            return self.y[0];
        }
        if at >= self.x[last] {
            return self.y[last];
        }

        // First index with x > at; at lies in [x[upper - 1], x[upper])
        let upper = self.x.partition_point(|&x| x <= at);
        let (x0, x1) = (self.x[upper - 1], self.x[upper]);
        let (y0, y1) = (self.y[upper - 1], self.y[upper]);

        y0 + (at - x0) * (y1 - y0) / (x1 - x0)
    }
}
