//! Objective Aggregation
//!
//! This module provides:
//! - Reduction statistics over accumulated series (`metrics`)
//! - The six basin objectives (`aggregate`)
//! - Welfare principles scalarising those objectives (`principles`)
//!
//! All six objectives are oriented so that lower is better. Principle
//! scores are oriented so that higher is better.

pub mod aggregate;
pub mod metrics;
pub mod principles;

// Re-exports
pub use aggregate::{ObjectiveConfig, Objectives, OBJECTIVE_COUNT};
pub use metrics::{
    aggregate_deficit_ratio, frequency_below, monthly_deficit_ratios,
    percentile_closest_observation, stack_sum,
};
pub use principles::{
    build_principle, EgalitarianWelfare, Principle, PrioritarianWelfare, UtilitarianWelfare,
    WelfarePrinciple,
};
