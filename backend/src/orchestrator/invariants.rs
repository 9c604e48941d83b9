//! Post-tick invariants
//!
//! System-wide properties asserted over the state view after every tick.
//! A violation is a test failure, not a runtime error: it is logged and
//! collected in the run report, and the run keeps going. This keeps it
//! distinguishable from a harness-fatal `SimulationError`.

use crate::core::time::Tick;
use crate::models::ratio::RatioBps;
use crate::models::state::StateView;
use crate::models::validator::ValidatorFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InvariantConfig {
    /// Bonded locked ratio never above `bps`
    MaxLockedRatio { bps: RatioBps },

    /// Bonded locked ratio never below `bps`
    MinLockedRatio { bps: RatioBps },
}

impl InvariantConfig {
    pub fn name(&self) -> &'static str {
        match self {
            InvariantConfig::MaxLockedRatio { .. } => "MaxLockedRatio",
            InvariantConfig::MinLockedRatio { .. } => "MinLockedRatio",
        }
    }

    /// Evaluate against the current state
    pub fn check(&self, state: &StateView, tick: Tick) -> Option<InvariantViolation> {
        let ratio = state.locked_ratio(ValidatorFilter::bonded());
        let detail = match self {
            InvariantConfig::MaxLockedRatio { bps } if ratio.exceeds(*bps) => {
                format!("locked ratio {} above {}", ratio, bps)
            }
            InvariantConfig::MinLockedRatio { bps } if ratio.below(*bps) => {
                format!("locked ratio {} below {}", ratio, bps)
            }
            _ => return None,
        };

        Some(InvariantViolation {
            tick,
            invariant: self.name().to_string(),
            detail,
        })
    }
}

/// A failed invariant check
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("invariant {invariant} violated at tick {tick}: {detail}")]
pub struct InvariantViolation {
    pub tick: Tick,
    pub invariant: String,
    pub detail: String,
}

/// Every violation among `invariants`, in declaration order
pub fn check_all(
    invariants: &[InvariantConfig],
    state: &StateView,
    tick: Tick,
) -> Vec<InvariantViolation> {
    invariants
        .iter()
        .filter_map(|inv| inv.check(state, tick))
        .collect()
}
