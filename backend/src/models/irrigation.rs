//! Irrigation district model
//!
//! A district withdraws water up to its monthly demand (m³/s) from the flow
//! reaching it and passes the remainder (the leftover) downstream.

use super::deficit_from_target;

/// An irrigation withdrawal point and its accumulated series
///
/// # Example
/// ```
/// use basin_sim_core_rs::IrrigationDistrict;
///
/// let mut district = IrrigationDistrict::new("Gezira".to_string(), vec![100.0]);
/// let leftover = district.receive(0, 130.0);
/// district.record_deficit(0);
///
/// assert_eq!(leftover, 30.0);
/// assert_eq!(district.received_flow(), &[100.0]);
/// assert_eq!(district.deficit(), &[0.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct IrrigationDistrict {
    name: String,
    demand: Vec<f64>,

    received_flow: Vec<f64>,
    received_flow_raw: Vec<f64>,
    deficit: Vec<f64>,
    target: Vec<f64>,
}

impl IrrigationDistrict {
    pub fn new(name: String, demand: Vec<f64>) -> Self {
        Self {
            name,
            demand,
            received_flow: Vec::new(),
            received_flow_raw: Vec::new(),
            deficit: Vec::new(),
            target: Vec::new(),
        }
    }

    /// Demand at step `t`; zero outside the series or when not finite
    pub fn demand_at(&self, t: usize) -> f64 {
        match self.demand.get(t) {
            Some(value) if value.is_finite() => value.max(0.0),
            _ => 0.0,
        }
    }

    /// Take up to the month's demand from `input`
    ///
    /// Records `received_flow_raw = input` and
    /// `received_flow = min(input, demand)`, and returns the leftover
    /// `max(0, input - received_flow)` forwarded downstream.
    pub fn receive(&mut self, t: usize, input: f64) -> f64 {
        let input = if input.is_nan() { 0.0 } else { input };
        let received = input.max(0.0).min(self.demand_at(t));

        self.received_flow_raw.push(input);
        self.received_flow.push(received);

        (input - received).max(0.0)
    }

    /// Append the deficit and target for step `t`
    ///
    /// Uses the flow received at this step (zero if nothing was routed).
    pub fn record_deficit(&mut self, t: usize) {
        let demand = self.demand_at(t);
        let received = if self.received_flow.len() > t {
            self.received_flow[t]
        } else {
            0.0
        };

        self.deficit.push(deficit_from_target(received, demand));
        self.target.push(demand);
    }

    /// Clear all accumulated series
    pub fn reset(&mut self) {
        self.received_flow.clear();
        self.received_flow_raw.clear();
        self.deficit.clear();
        self.target.clear();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn demand(&self) -> &[f64] {
        &self.demand
    }

    pub fn received_flow(&self) -> &[f64] {
        &self.received_flow
    }

    pub fn received_flow_raw(&self) -> &[f64] {
        &self.received_flow_raw
    }

    pub fn deficit(&self) -> &[f64] {
        &self.deficit
    }

    pub fn target(&self) -> &[f64] {
        &self.target
    }
}
