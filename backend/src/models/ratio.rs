//! Ratios in basis points
//!
//! Guard thresholds and invariant bounds are stored as integer basis points
//! and compared by cross-multiplication, so a ratio check never rounds:
//! `locked / total` vs `bps / 10_000` becomes `locked * 10_000` vs
//! `bps * total`.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Basis points in a ratio of 1.0
pub const BPS_SCALE: u32 = 10_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RatioError {
    #[error("Ratio {bps} bps exceeds {max} bps")]
    OutOfRange { bps: u32, max: u32 },
}

/// A ratio in `[0, 1]` expressed in basis points
///
/// # Example
/// ```
/// use ledger_simulator_core::models::RatioBps;
///
/// let half = RatioBps::new(5_000).unwrap();
/// assert_eq!(half.bps(), 5_000);
/// assert!(RatioBps::new(10_001).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct RatioBps(u32);

impl RatioBps {
    pub const ZERO: RatioBps = RatioBps(0);
    pub const ONE: RatioBps = RatioBps(BPS_SCALE);

    pub fn new(bps: u32) -> Result<Self, RatioError> {
        if bps > BPS_SCALE {
            return Err(RatioError::OutOfRange {
                bps,
                max: BPS_SCALE,
            });
        }
        Ok(Self(bps))
    }

    pub fn bps(&self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for RatioBps {
    type Error = RatioError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatioBps> for u32 {
    fn from(value: RatioBps) -> Self {
        value.0
    }
}

impl fmt::Display for RatioBps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

/// Locked validators out of a population
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedRatio {
    pub locked: usize,
    pub total: usize,
}

impl LockedRatio {
    pub fn new(locked: usize, total: usize) -> Self {
        Self { locked, total }
    }

    /// Exact comparison against a bound
    ///
    /// An empty population compares `Equal` to every bound.
    pub fn compare(&self, bound: RatioBps) -> Ordering {
        let lhs = self.locked as u128 * BPS_SCALE as u128;
        let rhs = bound.bps() as u128 * self.total as u128;
        lhs.cmp(&rhs)
    }

    pub fn exceeds(&self, bound: RatioBps) -> bool {
        self.compare(bound) == Ordering::Greater
    }

    pub fn below(&self, bound: RatioBps) -> bool {
        self.compare(bound) == Ordering::Less
    }

    /// The same population with a different locked count
    pub fn with_locked(&self, locked: usize) -> Self {
        Self {
            locked,
            total: self.total,
        }
    }

    /// Truncated basis points, for display only
    pub fn bps_floor(&self) -> Option<u32> {
        if self.total == 0 {
            return None;
        }
        Some((self.locked as u64 * BPS_SCALE as u64 / self.total as u64) as u32)
    }
}

impl fmt::Display for LockedRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.locked, self.total)
    }
}
