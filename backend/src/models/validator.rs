//! Simulated validators
//!
//! A `SimValidator` is the harness's cached copy of what the ledger last
//! reported for one validator. It is never edited in place by operations:
//! the record phase replaces it with a fresh ledger snapshot.

use crate::ledger::ValidatorSnapshot;
use crate::models::account::Address;
use serde::{Deserialize, Serialize};

/// Bonding status reported by the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidatorStatus {
    Bonded,
    Unbonding,
    Unbonded,
}

/// Cached validator snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimValidator {
    operator_address: Address,
    status: ValidatorStatus,
    rewards_locked: bool,
    auto_renewal: bool,
    /// Bonded stake in base units
    stake: u64,
    /// Commission rate in basis points
    commission_bps: u32,
}

impl SimValidator {
    pub fn operator_address(&self) -> &Address {
        &self.operator_address
    }

    /// Alias used by operations: validators are addressed by operator
    pub fn address(&self) -> &Address {
        &self.operator_address
    }

    pub fn status(&self) -> ValidatorStatus {
        self.status
    }

    pub fn is_bonded(&self) -> bool {
        self.status == ValidatorStatus::Bonded
    }

    pub fn rewards_locked(&self) -> bool {
        self.rewards_locked
    }

    pub fn auto_renewal_enabled(&self) -> bool {
        self.auto_renewal
    }

    pub fn stake(&self) -> u64 {
        self.stake
    }

    pub fn commission_bps(&self) -> u32 {
        self.commission_bps
    }
}

impl From<ValidatorSnapshot> for SimValidator {
    fn from(snapshot: ValidatorSnapshot) -> Self {
        Self {
            operator_address: snapshot.operator_address,
            status: snapshot.status,
            rewards_locked: snapshot.rewards_locked,
            auto_renewal: snapshot.auto_renewal,
            stake: snapshot.stake,
            commission_bps: snapshot.commission_bps,
        }
    }
}

impl From<&SimValidator> for ValidatorSnapshot {
    fn from(validator: &SimValidator) -> Self {
        ValidatorSnapshot {
            operator_address: validator.operator_address.clone(),
            status: validator.status,
            rewards_locked: validator.rewards_locked,
            auto_renewal: validator.auto_renewal,
            stake: validator.stake,
            commission_bps: validator.commission_bps,
        }
    }
}

/// Predicate over validators
///
/// Status flags are OR-ed together; `locked_only` is AND-ed on top.
///
/// # Example
/// ```
/// use ledger_simulator_core::models::ValidatorFilter;
///
/// let bonded_and_locked = ValidatorFilter::bonded().with_locked_only();
/// assert!(bonded_and_locked.bonded && bonded_and_locked.locked_only);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorFilter {
    pub bonded: bool,
    pub unbonding: bool,
    pub unbonded: bool,
    pub locked_only: bool,
}

impl ValidatorFilter {
    /// Every validator regardless of status
    pub fn all() -> Self {
        Self {
            bonded: true,
            unbonding: true,
            unbonded: true,
            locked_only: false,
        }
    }

    pub fn bonded() -> Self {
        Self {
            bonded: true,
            unbonding: false,
            unbonded: false,
            locked_only: false,
        }
    }

    /// Locked validators of any status
    pub fn locked() -> Self {
        Self::all().with_locked_only()
    }

    pub fn with_locked_only(mut self) -> Self {
        self.locked_only = true;
        self
    }

    pub fn matches_parts(&self, status: ValidatorStatus, rewards_locked: bool) -> bool {
        let status_ok = match status {
            ValidatorStatus::Bonded => self.bonded,
            ValidatorStatus::Unbonding => self.unbonding,
            ValidatorStatus::Unbonded => self.unbonded,
        };
        status_ok && (!self.locked_only || rewards_locked)
    }

    pub fn matches(&self, validator: &SimValidator) -> bool {
        self.matches_parts(validator.status, validator.rewards_locked)
    }
}

impl Default for ValidatorFilter {
    fn default() -> Self {
        Self::all()
    }
}
