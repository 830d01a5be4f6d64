//! Basin Simulator Core - Rust Engine
//!
//! Monthly river-basin simulator for evaluating reservoir release policies
//! with deterministic execution.
//!
//! # Architecture
//!
//! - **core**: Calendar (step → month, day counts)
//! - **models**: Domain types (Reservoir, HydropowerPlant, Catchment, IrrigationDistrict)
//! - **policy**: Release policies (RBF, monthly table, constant)
//! - **orchestrator**: Routing topology and main simulation loop
//! - **objectives**: Objective aggregation and welfare principles
//!
//! # Critical Invariants
//!
//! 1. All flows are monthly mean rates in m³/s, storages in m³
//! 2. Storage never goes negative, releases stay inside the feasible bounds
//! 3. Re-evaluating the same parameters is bit-identical
//! 4. FFI boundary is minimal and safe

// Module declarations
pub mod core;
pub mod models;
pub mod objectives;
pub mod orchestrator;
pub mod policy;

// Re-exports for convenience
pub use core::time::SimulationCalendar;
pub use models::{
    Catchment, Curve, CurveError, FillingPlan, HydropowerPlant, HydropowerPlantConfig,
    IrrigationDistrict, Reservoir, ReservoirConfig,
};
pub use objectives::{ObjectiveConfig, Objectives, Principle, OBJECTIVE_COUNT};
pub use orchestrator::{
    BasinConfig, BasinModel, BasinSnapshot, Evaluation, FlowSource, HydrologyInput, ModelError,
    NodeKind, RoutingNode,
};
pub use policy::{PolicyConfig, PolicyError, ReleasePolicy};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn basin_sim_core_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::model::PyBasinModel>()?;
    Ok(())
}
