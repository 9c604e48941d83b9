//! StateView tests
//!
//! The state view is the cached population the guard and select phases read.

use ledger_simulator_core::models::{StateError, Validators};
use ledger_simulator_core::{
    Address, SimAccount, SimRng, SimValidator, StateView, ValidatorFilter, ValidatorSnapshot,
    ValidatorStatus,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn validator(name: &str, status: ValidatorStatus, locked: bool) -> SimValidator {
    ValidatorSnapshot::new(Address::new(name), status, 1_000)
        .with_rewards_locked(locked)
        .into()
}

/// 4 bonded (2 locked), 1 unbonding (locked), 1 unbonded
fn mixed_state() -> StateView {
    let population = [
        ("val-0", ValidatorStatus::Bonded, true),
        ("val-1", ValidatorStatus::Bonded, false),
        ("val-2", ValidatorStatus::Bonded, true),
        ("val-3", ValidatorStatus::Bonded, false),
        ("val-4", ValidatorStatus::Unbonding, true),
        ("val-5", ValidatorStatus::Unbonded, false),
    ];
    let accounts = population
        .iter()
        .map(|(name, _, _)| SimAccount::with_derived_key(name))
        .collect();
    let validators = population
        .iter()
        .map(|(name, status, locked)| validator(name, *status, *locked))
        .collect();
    StateView::new(accounts, validators).unwrap()
}

fn names(validators: &Validators) -> Vec<String> {
    validators.iter().map(|v| v.address().to_string()).collect()
}

// ============================================================================
// Construction
// ============================================================================

#[test]
fn test_duplicate_validator_rejected() {
    let accounts = vec![SimAccount::with_derived_key("val-0")];
    let validators = vec![
        validator("val-0", ValidatorStatus::Bonded, false),
        validator("val-0", ValidatorStatus::Bonded, true),
    ];
    assert_eq!(
        StateView::new(accounts, validators).unwrap_err(),
        StateError::DuplicateValidator(Address::new("val-0"))
    );
}

#[test]
fn test_duplicate_account_rejected() {
    let accounts = vec![
        SimAccount::with_derived_key("val-0"),
        SimAccount::with_derived_key("val-0"),
    ];
    assert!(matches!(
        StateView::new(accounts, vec![]),
        Err(StateError::DuplicateAccount(_))
    ));
}

#[test]
fn test_every_validator_needs_an_operator_account() {
    let accounts = vec![SimAccount::with_derived_key("val-0")];
    let validators = vec![
        validator("val-0", ValidatorStatus::Bonded, false),
        validator("val-1", ValidatorStatus::Bonded, false),
    ];
    assert_eq!(
        StateView::new(accounts, validators).unwrap_err(),
        StateError::MissingOperatorAccount(Address::new("val-1"))
    );
}

#[test]
fn test_accounts_without_validators_are_allowed() {
    let accounts = vec![
        SimAccount::with_derived_key("val-0"),
        SimAccount::with_derived_key("delegator"),
    ];
    let validators = vec![validator("val-0", ValidatorStatus::Bonded, false)];
    let state = StateView::new(accounts, validators).unwrap();
    assert_eq!(state.get_all_accounts().len(), 2);
    assert_eq!(state.get_all_validators().len(), 1);
}

// ============================================================================
// Queries
// ============================================================================

#[test]
fn test_filters_preserve_insertion_order() {
    let state = mixed_state();

    assert_eq!(
        names(&state.get_validators(ValidatorFilter::bonded())),
        vec!["val-0", "val-1", "val-2", "val-3"]
    );
    assert_eq!(
        names(&state.get_validators(ValidatorFilter::locked())),
        vec!["val-0", "val-2", "val-4"]
    );
    assert_eq!(
        names(&state.get_validators(ValidatorFilter::bonded().with_locked_only())),
        vec!["val-0", "val-2"]
    );
    assert_eq!(state.get_validators(ValidatorFilter::all()).len(), 6);
}

#[test]
fn test_locked_ratio_over_bonded_population() {
    let state = mixed_state();

    let bonded = state.locked_ratio(ValidatorFilter::bonded());
    assert_eq!((bonded.locked, bonded.total), (2, 4));

    let all = state.locked_ratio(ValidatorFilter::all());
    assert_eq!((all.locked, all.total), (3, 6));
}

#[test]
fn test_lookup_by_address_and_operator_account() {
    let state = mixed_state();

    let val = state.validator(&Address::new("val-2")).unwrap();
    assert!(val.rewards_locked());
    assert_eq!(
        state.operator_account(val).unwrap().address(),
        &Address::new("val-2")
    );
    assert!(state.validator(&Address::new("missing")).is_none());
}

#[test]
fn test_filtered_view_keeps_address_index() {
    let state = mixed_state();
    let locked = state.get_validators(ValidatorFilter::locked());

    assert!(locked.get_by_address(&Address::new("val-4")).is_some());
    assert!(locked.get_by_address(&Address::new("val-1")).is_none());
}

#[test]
fn test_shuffled_order_is_seeded() {
    let state = mixed_state();
    let all = state.get_all_validators();

    let a: Vec<_> = all
        .get_shuffled(&mut SimRng::new(3))
        .into_iter()
        .map(|v| v.address().clone())
        .collect();
    let b: Vec<_> = all
        .get_shuffled(&mut SimRng::new(3))
        .into_iter()
        .map(|v| v.address().clone())
        .collect();

    assert_eq!(a, b);
    assert_eq!(a.len(), 6);
    // shuffling never disturbs the stored order
    assert_eq!(all.iter().next().unwrap().address(), &Address::new("val-0"));
}
