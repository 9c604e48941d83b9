//! In-memory ledger
//!
//! A `LedgerClient` backed by plain maps. It applies the ledger-side rules the
//! harness relies on (operator-only signing, no double lock, no unlock of an
//! unlocked validator) and supports fault injection so failure paths can be
//! exercised deterministically.
//!
//! NOTE: Available in all builds so integration tests and the CLI can use it,
//! but it is a test double, not a ledger.

use super::{AccountSnapshot, ActionKind, LedgerClient, LedgerError, ValidatorSnapshot};
use crate::models::account::{Address, SimAccount};
use crate::models::validator::{ValidatorFilter, ValidatorStatus};
use std::collections::{HashMap, VecDeque};

/// One `submit_action` call, accepted or not
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub signer: Address,
    pub validator: Address,
    pub action: ActionKind,
    pub accepted: bool,
}

#[derive(Debug, Clone)]
enum Fault {
    /// Reject the next call with this action
    RejectNext { action: ActionKind, reason: String },
    /// Let `remaining` calls through, then fail every call with a transport error
    TransportAfter { remaining: usize, reason: String },
}

/// Map-backed ledger double
///
/// # Example
/// ```
/// use ledger_simulator_core::ledger::{ActionKind, InMemoryLedger, LedgerClient};
///
/// let (mut ledger, accounts) = InMemoryLedger::with_bonded_population(3, 1_000);
/// let validator = accounts[0].address().clone();
///
/// let snapshot = ledger
///     .submit_action(&accounts[0], &validator, ActionKind::LockRewards)
///     .unwrap();
/// assert!(snapshot.rewards_locked);
/// assert!(ledger
///     .submit_action(&accounts[0], &validator, ActionKind::LockRewards)
///     .is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedger {
    validators: Vec<ValidatorSnapshot>,
    validator_index: HashMap<Address, usize>,
    accounts: HashMap<Address, AccountSnapshot>,
    submissions: Vec<Submission>,
    faults: VecDeque<Fault>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// `n` bonded validators `val-0 .. val-{n-1}` and their operator accounts
    pub fn with_bonded_population(n: usize, stake: u64) -> (Self, Vec<SimAccount>) {
        let mut ledger = Self::new();
        let mut accounts = Vec::with_capacity(n);
        for i in 0..n {
            let account = SimAccount::with_derived_key(&format!("val-{}", i));
            ledger.add_validator(ValidatorSnapshot::new(
                account.address().clone(),
                ValidatorStatus::Bonded,
                stake,
            ));
            accounts.push(account);
        }
        (ledger, accounts)
    }

    /// Register an account with the ledger
    pub fn add_account(&mut self, address: Address) {
        self.accounts
            .entry(address.clone())
            .or_insert(AccountSnapshot {
                address,
                sequence: 0,
            });
    }

    /// Register (or replace) a validator; its operator account is created too
    pub fn add_validator(&mut self, snapshot: ValidatorSnapshot) {
        self.add_account(snapshot.operator_address.clone());
        match self.validator_index.get(&snapshot.operator_address) {
            Some(&i) => self.validators[i] = snapshot,
            None => {
                self.validator_index
                    .insert(snapshot.operator_address.clone(), self.validators.len());
                self.validators.push(snapshot);
            }
        }
    }

    /// Change a validator's bonding status out of band
    pub fn set_status(&mut self, validator: &Address, status: ValidatorStatus) -> bool {
        match self.validator_index.get(validator) {
            Some(&i) => {
                self.validators[i].status = status;
                true
            }
            None => false,
        }
    }

    /// Reject the next `action` call with `reason`
    pub fn fail_next(&mut self, action: ActionKind, reason: impl Into<String>) {
        self.faults.push_back(Fault::RejectNext {
            action,
            reason: reason.into(),
        });
    }

    /// Accept `calls` more submissions, then fail all later ones
    pub fn fail_transport_after(&mut self, calls: usize, reason: impl Into<String>) {
        self.faults.push_back(Fault::TransportAfter {
            remaining: calls,
            reason: reason.into(),
        });
    }

    pub fn validator(&self, address: &Address) -> Option<&ValidatorSnapshot> {
        self.validator_index
            .get(address)
            .map(|&i| &self.validators[i])
    }

    pub fn validators(&self) -> &[ValidatorSnapshot] {
        &self.validators
    }

    /// Every submission in call order
    pub fn submissions(&self) -> &[Submission] {
        &self.submissions
    }

    pub fn submission_count(&self) -> usize {
        self.submissions.len()
    }

    pub fn locked_count(&self) -> usize {
        self.validators.iter().filter(|v| v.rewards_locked).count()
    }

    /// Injected failure for this call, if any
    ///
    /// A matching rejection wins and leaves transport countdowns untouched.
    fn take_fault(&mut self, action: ActionKind, validator: &Address) -> Option<LedgerError> {
        let rejection = self.faults.iter().position(|fault| match fault {
            Fault::RejectNext { action: expected, .. } => *expected == action,
            Fault::TransportAfter { .. } => false,
        });
        let removed = rejection.and_then(|pos| self.faults.remove(pos));
        if let Some(Fault::RejectNext { reason, .. }) = removed {
            return Some(LedgerError::Rejected {
                action,
                validator: validator.clone(),
                reason,
            });
        }

        let mut hit = None;
        for fault in self.faults.iter_mut() {
            if let Fault::TransportAfter { remaining, reason } = fault {
                if *remaining == 0 {
                    hit = Some(LedgerError::Transport(reason.clone()));
                    break;
                }
                *remaining -= 1;
            }
        }
        hit
    }

    fn apply(
        &mut self,
        signer: &SimAccount,
        validator: &Address,
        action: ActionKind,
    ) -> Result<ValidatorSnapshot, LedgerError> {
        if let Some(err) = self.take_fault(action, validator) {
            return Err(err);
        }

        let idx = *self
            .validator_index
            .get(validator)
            .ok_or_else(|| LedgerError::UnknownValidator(validator.clone()))?;

        if signer.address() != &self.validators[idx].operator_address {
            return Err(LedgerError::Unauthorized {
                signer: signer.address().clone(),
                validator: validator.clone(),
            });
        }

        let reject = |reason: &str| LedgerError::Rejected {
            action,
            validator: validator.clone(),
            reason: reason.to_string(),
        };

        let target = &mut self.validators[idx];
        match action {
            ActionKind::LockRewards if target.rewards_locked => {
                return Err(reject("rewards already locked"))
            }
            ActionKind::UnlockRewards if !target.rewards_locked => {
                return Err(reject("rewards not locked"))
            }
            ActionKind::DisableAutoRenewal if !target.auto_renewal => {
                return Err(reject("auto-renewal already disabled"))
            }
            ActionKind::EnableAutoRenewal if target.auto_renewal => {
                return Err(reject("auto-renewal already enabled"))
            }
            ActionKind::LockRewards => target.rewards_locked = true,
            ActionKind::UnlockRewards => target.rewards_locked = false,
            ActionKind::DisableAutoRenewal => target.auto_renewal = false,
            ActionKind::EnableAutoRenewal => target.auto_renewal = true,
        }
        let snapshot = target.clone();

        if let Some(account) = self.accounts.get_mut(signer.address()) {
            account.sequence += 1;
        }
        Ok(snapshot)
    }
}

impl LedgerClient for InMemoryLedger {
    fn submit_action(
        &mut self,
        signer: &SimAccount,
        validator: &Address,
        action: ActionKind,
    ) -> Result<ValidatorSnapshot, LedgerError> {
        let result = self.apply(signer, validator, action);
        self.submissions.push(Submission {
            signer: signer.address().clone(),
            validator: validator.clone(),
            action,
            accepted: result.is_ok(),
        });
        result
    }

    fn query_validators(&self, filter: &ValidatorFilter) -> Vec<ValidatorSnapshot> {
        self.validators
            .iter()
            .filter(|v| filter.matches_parts(v.status, v.rewards_locked))
            .cloned()
            .collect()
    }

    fn query_account(&self, address: &Address) -> Option<AccountSnapshot> {
        self.accounts.get(address).cloned()
    }

    fn query_validator(&self, address: &Address) -> Option<ValidatorSnapshot> {
        self.validator(address).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fail_next_only_matches_its_action() {
        let (mut ledger, accounts) = InMemoryLedger::with_bonded_population(1, 10);
        let val = accounts[0].address().clone();
        ledger.fail_next(ActionKind::DisableAutoRenewal, "boom");

        assert!(ledger
            .submit_action(&accounts[0], &val, ActionKind::LockRewards)
            .is_ok());
        let err = ledger
            .submit_action(&accounts[0], &val, ActionKind::DisableAutoRenewal)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Rejected { .. }));

        // fault consumed
        assert!(ledger
            .submit_action(&accounts[0], &val, ActionKind::DisableAutoRenewal)
            .is_ok());
    }

    #[test]
    fn test_transport_fault_counts_calls() {
        let (mut ledger, accounts) = InMemoryLedger::with_bonded_population(2, 10);
        ledger.fail_transport_after(1, "connection reset");

        let v0 = accounts[0].address().clone();
        let v1 = accounts[1].address().clone();
        assert!(ledger
            .submit_action(&accounts[0], &v0, ActionKind::LockRewards)
            .is_ok());
        assert_eq!(
            ledger.submit_action(&accounts[1], &v1, ActionKind::LockRewards),
            Err(LedgerError::Transport("connection reset".to_string()))
        );
        assert_eq!(ledger.submission_count(), 2);
        assert!(!ledger.submissions()[1].accepted);
    }

    #[test]
    fn test_rejected_call_does_not_use_up_transport_allowance() {
        let (mut ledger, accounts) = InMemoryLedger::with_bonded_population(2, 10);
        ledger.fail_transport_after(1, "connection reset");
        ledger.fail_next(ActionKind::LockRewards, "busy");

        let v0 = accounts[0].address().clone();
        let v1 = accounts[1].address().clone();
        let err = ledger
            .submit_action(&accounts[0], &v0, ActionKind::LockRewards)
            .unwrap_err();
        assert!(matches!(err, LedgerError::Rejected { .. }));

        // the one allowed call is still available
        assert!(ledger
            .submit_action(&accounts[1], &v1, ActionKind::LockRewards)
            .is_ok());
        assert_eq!(
            ledger.submit_action(&accounts[0], &v0, ActionKind::LockRewards),
            Err(LedgerError::Transport("connection reset".to_string()))
        );
        assert_eq!(ledger.submission_count(), 3);
    }

    #[test]
    fn test_sequence_counts_accepted_calls_only() {
        let (mut ledger, accounts) = InMemoryLedger::with_bonded_population(1, 10);
        let val = accounts[0].address().clone();

        ledger
            .submit_action(&accounts[0], &val, ActionKind::LockRewards)
            .unwrap();
        let _ = ledger.submit_action(&accounts[0], &val, ActionKind::LockRewards);

        assert_eq!(ledger.query_account(&val).unwrap().sequence, 1);
    }
}
