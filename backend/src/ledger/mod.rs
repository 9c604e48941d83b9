//! Ledger client boundary
//!
//! The harness never executes state transitions itself. Everything that
//! changes the ledger goes through `LedgerClient::submit_action`; everything
//! the harness knows about the ledger comes back through the query calls.
//!
//! | Call | Failure |
//! |---|---|
//! | `submit_action` | `LedgerError`, harness-fatal |
//! | `query_validators` | none (empty when nothing matches) |
//! | `query_account` | `None`, non-fatal |
//!
//! Calls may block (network or consensus round-trip). The harness does not
//! time them out.

pub mod memory;

use crate::models::account::{Address, SimAccount};
use crate::models::validator::{ValidatorFilter, ValidatorStatus};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use memory::{InMemoryLedger, Submission};

/// State-changing action the harness can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    LockRewards,
    UnlockRewards,
    DisableAutoRenewal,
    EnableAutoRenewal,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ActionKind::LockRewards => "lock-rewards",
            ActionKind::UnlockRewards => "unlock-rewards",
            ActionKind::DisableAutoRenewal => "disable-auto-renewal",
            ActionKind::EnableAutoRenewal => "enable-auto-renewal",
        };
        f.write_str(name)
    }
}

/// Validator state as reported by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidatorSnapshot {
    pub operator_address: Address,
    pub status: ValidatorStatus,
    pub rewards_locked: bool,
    pub auto_renewal: bool,
    pub stake: u64,
    pub commission_bps: u32,
}

impl ValidatorSnapshot {
    /// Unlocked validator with auto-renewal enabled and zero commission
    pub fn new(operator_address: Address, status: ValidatorStatus, stake: u64) -> Self {
        Self {
            operator_address,
            status,
            rewards_locked: false,
            auto_renewal: true,
            stake,
            commission_bps: 0,
        }
    }

    pub fn with_rewards_locked(mut self, locked: bool) -> Self {
        self.rewards_locked = locked;
        self
    }

    pub fn with_auto_renewal(mut self, enabled: bool) -> Self {
        self.auto_renewal = enabled;
        self
    }

    pub fn with_commission_bps(mut self, commission_bps: u32) -> Self {
        self.commission_bps = commission_bps;
        self
    }
}

/// Account state as reported by the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub address: Address,
    /// Accepted submissions signed by this account
    pub sequence: u64,
}

/// Ledger-side failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("{action} rejected for validator {validator}: {reason}")]
    Rejected {
        action: ActionKind,
        validator: Address,
        reason: String,
    },

    #[error("Signer {signer} is not the operator of validator {validator}")]
    Unauthorized { signer: Address, validator: Address },

    #[error("Unknown validator: {0}")]
    UnknownValidator(Address),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// The narrow interface the harness drives the ledger through
pub trait LedgerClient {
    /// Execute one action signed by `signer` against `validator`
    ///
    /// Returns the validator's state after the action.
    fn submit_action(
        &mut self,
        signer: &SimAccount,
        validator: &Address,
        action: ActionKind,
    ) -> Result<ValidatorSnapshot, LedgerError>;

    /// Validators matching `filter`, in the ledger's order
    fn query_validators(&self, filter: &ValidatorFilter) -> Vec<ValidatorSnapshot>;

    fn query_account(&self, address: &Address) -> Option<AccountSnapshot>;

    /// Single-validator lookup
    fn query_validator(&self, address: &Address) -> Option<ValidatorSnapshot> {
        self.query_validators(&ValidatorFilter::all())
            .into_iter()
            .find(|v| &v.operator_address == address)
    }
}

impl<L: LedgerClient + ?Sized> LedgerClient for &mut L {
    fn submit_action(
        &mut self,
        signer: &SimAccount,
        validator: &Address,
        action: ActionKind,
    ) -> Result<ValidatorSnapshot, LedgerError> {
        (**self).submit_action(signer, validator, action)
    }

    fn query_validators(&self, filter: &ValidatorFilter) -> Vec<ValidatorSnapshot> {
        (**self).query_validators(filter)
    }

    fn query_account(&self, address: &Address) -> Option<AccountSnapshot> {
        (**self).query_account(address)
    }

    fn query_validator(&self, address: &Address) -> Option<ValidatorSnapshot> {
        (**self).query_validator(address)
    }
}

impl<L: LedgerClient + ?Sized> LedgerClient for Box<L> {
    fn submit_action(
        &mut self,
        signer: &SimAccount,
        validator: &Address,
        action: ActionKind,
    ) -> Result<ValidatorSnapshot, LedgerError> {
        (**self).submit_action(signer, validator, action)
    }

    fn query_validators(&self, filter: &ValidatorFilter) -> Vec<ValidatorSnapshot> {
        (**self).query_validators(filter)
    }

    fn query_account(&self, address: &Address) -> Option<AccountSnapshot> {
        (**self).query_account(address)
    }

    fn query_validator(&self, address: &Address) -> Option<ValidatorSnapshot> {
        (**self).query_validator(address)
    }
}
