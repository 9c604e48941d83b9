//! State view
//!
//! The harness's single source of truth for what the simulated population
//! looks like: every account it can sign for and the last snapshot the ledger
//! reported for every validator.
//!
//! # Critical Invariants
//!
//! 1. **One operator, one account**: every validator's operator address
//!    resolves to exactly one `SimAccount`
//! 2. **Insertion order**: sequences come back in load order unless a caller
//!    asks for a shuffled permutation
//! 3. **No stale reads**: a validator mutated in a tick is refreshed by the
//!    record phase before the next operation reads it

use crate::ledger::ValidatorSnapshot;
use crate::models::account::{Address, SimAccount};
use crate::models::ratio::LockedRatio;
use crate::models::validator::{SimValidator, ValidatorFilter};
use crate::rng::SimRng;
use std::collections::HashMap;
use thiserror::Error;

/// Population consistency errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
    #[error("Duplicate account address: {0}")]
    DuplicateAccount(Address),

    #[error("Duplicate validator operator: {0}")]
    DuplicateValidator(Address),

    #[error("Validator {0} has no matching account")]
    MissingOperatorAccount(Address),

    #[error("Validator {0} is not in the population")]
    UnknownValidator(Address),
}

/// Anything addressable that can live in an indexed sequence
pub trait Addressed {
    fn key(&self) -> &Address;
}

impl Addressed for SimAccount {
    fn key(&self) -> &Address {
        self.address()
    }
}

impl Addressed for SimValidator {
    fn key(&self) -> &Address {
        self.operator_address()
    }
}

/// Ordered sequence with address lookup
#[derive(Debug, Clone)]
pub struct Indexed<T> {
    items: Vec<T>,
    index: HashMap<Address, usize>,
}

/// Validator sequence returned by `StateView`
pub type Validators = Indexed<SimValidator>;

/// Account sequence returned by `StateView`
pub type Accounts = Indexed<SimAccount>;

impl<T> Default for Indexed<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: Addressed> Indexed<T> {
    /// Build from items, rejecting duplicate addresses (returns the offender)
    fn from_items(items: Vec<T>) -> Result<Self, Address> {
        let mut seq = Self::default();
        for item in items {
            if seq.index.contains_key(item.key()) {
                return Err(item.key().clone());
            }
            seq.index.insert(item.key().clone(), seq.items.len());
            seq.items.push(item);
        }
        Ok(seq)
    }

    /// Build from items already known to have unique addresses
    fn from_unique(items: Vec<T>) -> Self {
        let index = items
            .iter()
            .enumerate()
            .map(|(i, item)| (item.key().clone(), i))
            .collect();
        Self { items, index }
    }

    /// Lookup by address
    pub fn get_by_address(&self, address: &Address) -> Option<&T> {
        self.index.get(address).map(|&i| &self.items[i])
    }

    /// Fresh random permutation drawn from the simulator's generator
    pub fn get_shuffled(&self, rng: &mut SimRng) -> Vec<&T> {
        let mut view: Vec<&T> = self.items.iter().collect();
        rng.shuffle(&mut view);
        view
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn addresses(&self) -> Vec<&Address> {
        self.items.iter().map(|i| i.key()).collect()
    }
}

impl Indexed<SimValidator> {
    /// Validators with rewards locked
    pub fn get_locked(&self) -> Vec<&SimValidator> {
        self.items.iter().filter(|v| v.rewards_locked()).collect()
    }

    pub fn locked_ratio(&self) -> LockedRatio {
        LockedRatio::new(self.get_locked().len(), self.len())
    }
}

impl<'a, T> IntoIterator for &'a Indexed<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Current simulated population
///
/// # Example
///
/// ```rust
/// use ledger_simulator_core::ledger::ValidatorSnapshot;
/// use ledger_simulator_core::models::{Address, StateView, ValidatorStatus};
/// use ledger_simulator_core::SimAccount;
///
/// let acc = SimAccount::with_derived_key("val-0");
/// let val = ValidatorSnapshot::new(Address::new("val-0"), ValidatorStatus::Bonded, 1_000);
///
/// let state = StateView::new(vec![acc], vec![val.into()]).unwrap();
/// assert_eq!(state.get_all_validators().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StateView {
    accounts: Accounts,
    validators: Validators,
}

impl StateView {
    /// Build a view, checking the operator → account mapping
    pub fn new(
        accounts: Vec<SimAccount>,
        validators: Vec<SimValidator>,
    ) -> Result<Self, StateError> {
        let accounts = Indexed::from_items(accounts).map_err(StateError::DuplicateAccount)?;
        let validators =
            Indexed::from_items(validators).map_err(StateError::DuplicateValidator)?;

        for validator in validators.iter() {
            if accounts.get_by_address(validator.operator_address()).is_none() {
                return Err(StateError::MissingOperatorAccount(
                    validator.operator_address().clone(),
                ));
            }
        }

        Ok(Self {
            accounts,
            validators,
        })
    }

    /// Validators matching `filter`, in insertion order
    pub fn get_validators(&self, filter: ValidatorFilter) -> Validators {
        let matching = self
            .validators
            .iter()
            .filter(|v| filter.matches(v))
            .cloned()
            .collect();
        Indexed::from_unique(matching)
    }

    pub fn get_all_validators(&self) -> &Validators {
        &self.validators
    }

    pub fn get_all_accounts(&self) -> &Accounts {
        &self.accounts
    }

    pub fn validator(&self, address: &Address) -> Option<&SimValidator> {
        self.validators.get_by_address(address)
    }

    /// Account that signs for a validator
    pub fn operator_account(&self, validator: &SimValidator) -> Option<&SimAccount> {
        self.accounts.get_by_address(validator.operator_address())
    }

    /// Locked validators out of those matching `filter`
    pub fn locked_ratio(&self, filter: ValidatorFilter) -> LockedRatio {
        let mut ratio = LockedRatio::new(0, 0);
        for validator in self.validators.iter().filter(|v| filter.matches(v)) {
            ratio.total += 1;
            if validator.rewards_locked() {
                ratio.locked += 1;
            }
        }
        ratio
    }

    /// Replace the cached snapshot for a known validator
    ///
    /// Returns `false` (and changes nothing) for an unknown operator.
    pub(crate) fn update_validator(&mut self, snapshot: ValidatorSnapshot) -> bool {
        match self.validators.index.get(&snapshot.operator_address) {
            Some(&i) => {
                self.validators.items[i] = snapshot.into();
                true
            }
            None => false,
        }
    }
}
