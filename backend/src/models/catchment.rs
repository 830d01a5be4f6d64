//! Catchment model
//!
//! A tributary catchment is a read-only carrier of a precomputed monthly
//! inflow sequence (m³/s). It never changes after construction.

/// A tributary catchment and its inflow time series
///
/// # Example
/// ```
/// use basin_sim_core_rs::Catchment;
///
/// let catchment = Catchment::new("Atbara".to_string(), vec![10.0, 20.0]);
/// assert_eq!(catchment.inflow_at(1), 20.0);
/// assert_eq!(catchment.inflow_at(5), 0.0); // past the end of the series
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Catchment {
    name: String,
    inflow: Vec<f64>,
}

impl Catchment {
    pub fn new(name: String, inflow: Vec<f64>) -> Self {
        Self { name, inflow }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inflow at step `t`; zero outside the series or when not finite
    pub fn inflow_at(&self, t: usize) -> f64 {
        match self.inflow.get(t) {
            Some(value) if value.is_finite() => *value,
            _ => 0.0,
        }
    }

    pub fn inflow(&self) -> &[f64] {
        &self.inflow
    }
}
