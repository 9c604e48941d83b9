//! Checkpoint - capture and resume simulator state
//!
//! A snapshot records everything the harness itself owns at a tick boundary:
//! RNG state, counters, schedule positions and the cached validator set.
//! The ledger's own state is not part of it; resuming requires a ledger that
//! is in the state the snapshot saw.
//!
//! # Critical Invariants
//!
//! - **Determinism**: same seed + config + registration order produce equal
//!   snapshots at equal ticks
//! - **Config Matching**: a snapshot can only be resumed with the config it
//!   was taken under (compared by SHA-256 of canonical JSON)

use crate::core::time::Tick;
use crate::ledger::ValidatorSnapshot;
use crate::models::counters::Counters;
use crate::orchestrator::SimulationError;
use crate::scheduler::ScheduleEntry;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Harness state at a tick boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    /// Next tick to be evaluated
    pub tick: Tick,

    /// RNG state (CRITICAL for determinism)
    pub rng_state: u64,

    pub counters: Counters,

    /// Operation schedule positions, registration order
    pub schedule: Vec<ScheduleEntry>,

    /// Cached validators, insertion order
    pub validators: Vec<ValidatorSnapshot>,

    /// Events logged so far
    pub event_count: usize,

    /// SHA256 of the config the run was started with
    pub config_hash: String,
}

impl SimulationSnapshot {
    pub fn to_json(&self) -> Result<String, SimulationError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            SimulationError::Serialization(format!("Snapshot serialization failed: {}", e))
        })
    }

    pub fn from_json(json: &str) -> Result<Self, SimulationError> {
        serde_json::from_str(json)
            .map_err(|e| SimulationError::Serialization(format!("Snapshot parse failed: {}", e)))
    }

    /// SHA256 over the canonical snapshot, for comparing runs
    pub fn fingerprint(&self) -> Result<String, SimulationError> {
        compute_hash(self)
    }
}

/// Deterministic SHA256 of a config
///
/// Uses canonical JSON (sorted object keys) so field order never changes the
/// hash.
pub fn compute_config_hash<T: Serialize>(config: &T) -> Result<String, SimulationError> {
    compute_hash(config)
}

fn compute_hash<T: Serialize>(value: &T) -> Result<String, SimulationError> {
    let value = serde_json::to_value(value)
        .map_err(|e| SimulationError::Serialization(format!("Serialization failed: {}", e)))?;

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
        .map_err(|e| SimulationError::Serialization(format!("Serialization failed: {}", e)))?;

    let mut hasher = Sha256::new();
    hasher.update(json.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Reject a snapshot taken under a different config
pub fn validate_snapshot(
    snapshot: &SimulationSnapshot,
    config_hash: &str,
) -> Result<(), SimulationError> {
    if snapshot.config_hash != config_hash {
        return Err(SimulationError::ConfigMismatch {
            expected: config_hash.to_string(),
            actual: snapshot.config_hash.clone(),
        });
    }
    Ok(())
}
