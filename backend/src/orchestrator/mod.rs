//! Orchestrator - basin simulation loop
//!
//! Builds the basin from its configuration, walks the routing topology
//! month by month and reduces the result to objectives.
//!
//! See `engine.rs` for the loop itself.

pub mod config;
pub mod engine;
pub mod snapshot;
pub mod topology;

// Re-export main types for convenience
pub use config::{BasinConfig, HydrologyInput};
pub use engine::{BasinModel, Evaluation, ModelError};
pub use snapshot::{compute_config_hash, BasinSnapshot, DistrictSnapshot, ReservoirSnapshot};
pub use topology::{
    nile_routing, DelayBuffer, FlowSource, NodeKind, RoutingNode, NILE_HASSANAB_WARMUP_INFLOW,
};
