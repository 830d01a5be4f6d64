//! Domain models for the basin simulator

pub mod catchment;
pub mod curve;
pub mod filling;
pub mod hydropower;
pub mod irrigation;
pub mod reservoir;

// Re-exports
pub use catchment::Catchment;
pub use curve::{Curve, CurveError};
pub use filling::{FillingPlan, FillingSchedule};
pub use hydropower::{HydropowerPlant, HydropowerPlantConfig};
pub use irrigation::IrrigationDistrict;
pub use reservoir::{
    LevelStorageTable, LevelSurfaceTable, ReleaseBoundsTable, Reservoir, ReservoirConfig,
};

/// Shortfall of a realisation against its target, never negative
pub fn deficit_from_target(realisation: f64, target: f64) -> f64 {
    (target - realisation).max(0.0)
}
