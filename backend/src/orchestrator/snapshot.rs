//! Snapshot - Export Simulation Series
//!
//! Captures every entity's series after an evaluation, tagged with a hash of
//! the configuration that produced it.
//!
//! # Critical Invariants
//!
//! - **Determinism**: the same configuration and parameters produce an
//!   identical snapshot
//! - **Config Matching**: `config_hash` identifies the configuration,
//!   independent of JSON key order

use crate::models::{IrrigationDistrict, Reservoir};
use crate::orchestrator::ModelError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ============================================================================
// Snapshot Structures
// ============================================================================

/// Complete run snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasinSnapshot {
    /// Steps simulated by the latest evaluation
    pub steps: usize,

    /// SHA256 hash of the basin configuration
    pub config_hash: String,

    pub reservoirs: Vec<ReservoirSnapshot>,

    pub districts: Vec<DistrictSnapshot>,
}

/// Reservoir series snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReservoirSnapshot {
    pub name: String,
    pub storage: Vec<f64>,
    pub level: Vec<f64>,
    pub release: Vec<f64>,
    pub evaporation: Vec<f64>,
    pub hydropower_production: Vec<f64>,
    pub hydropower_deficit: Vec<f64>,
    pub hydropower_target: Vec<f64>,
}

impl From<&Reservoir> for ReservoirSnapshot {
    fn from(reservoir: &Reservoir) -> Self {
        ReservoirSnapshot {
            name: reservoir.name().to_string(),
            storage: reservoir.storage().to_vec(),
            level: reservoir.level().to_vec(),
            release: reservoir.release().to_vec(),
            evaporation: reservoir.evaporation().to_vec(),
            hydropower_production: reservoir.hydropower_production().to_vec(),
            hydropower_deficit: reservoir.hydropower_deficit().to_vec(),
            hydropower_target: reservoir.hydropower_target().to_vec(),
        }
    }
}

/// Irrigation district series snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictSnapshot {
    pub name: String,
    pub received_flow: Vec<f64>,
    pub received_flow_raw: Vec<f64>,
    pub deficit: Vec<f64>,
    pub target: Vec<f64>,
}

impl From<&IrrigationDistrict> for DistrictSnapshot {
    fn from(district: &IrrigationDistrict) -> Self {
        DistrictSnapshot {
            name: district.name().to_string(),
            received_flow: district.received_flow().to_vec(),
            received_flow_raw: district.received_flow_raw().to_vec(),
            deficit: district.deficit().to_vec(),
            target: district.target().to_vec(),
        }
    }
}

impl BasinSnapshot {
    pub fn to_json(&self) -> Result<String, ModelError> {
        serde_json::to_string(self)
            .map_err(|e| ModelError::Parse(format!("Snapshot serialization failed: {}", e)))
    }
}

// ============================================================================
// Config Hashing
// ============================================================================

/// Compute SHA256 hash of a configuration
///
/// Serializes to JSON with object keys sorted recursively so that the hash
/// does not depend on field order.
///
/// # Example
/// ```
/// use basin_sim_core_rs::orchestrator::compute_config_hash;
/// use serde_json::json;
///
/// let a = compute_config_hash(&json!({"horizon": 240, "init_month": 1})).unwrap();
/// let b = compute_config_hash(&json!({"init_month": 1, "horizon": 240})).unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.len(), 64);
/// ```
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, ModelError> {
    use serde_json::Value;
    use std::collections::BTreeMap;

    let value = serde_json::to_value(config)
        .map_err(|e| ModelError::Parse(format!("Config serialization failed: {}", e)))?;

    fn canonicalize(value: Value) -> Value {
        match value {
            Value::Object(map) => {
                let sorted: BTreeMap<String, Value> =
                    map.into_iter().map(|(k, v)| (k, canonicalize(v))).collect();
                Value::Object(sorted.into_iter().collect())
            }
            Value::Array(arr) => Value::Array(arr.into_iter().map(canonicalize).collect()),
            other => other,
        }
    }

    let json = serde_json::to_string(&canonicalize(value))
        .map_err(|e| ModelError::Parse(format!("Config serialization failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_hash_changes_with_content() {
        let a = compute_config_hash(&json!({"horizon": 240})).unwrap();
        let b = compute_config_hash(&json!({"horizon": 241})).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_district_snapshot_starts_empty() {
        let district = IrrigationDistrict::new("Gezira".to_string(), vec![10.0]);
        let snapshot = DistrictSnapshot::from(&district);
        assert_eq!(snapshot.name, "Gezira");
        assert!(snapshot.deficit.is_empty());
    }
}
