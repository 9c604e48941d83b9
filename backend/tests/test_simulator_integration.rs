//! End-to-end simulator tests
//!
//! Full runs through `Simulator::run`: stop conditions, invariants,
//! reports and snapshot resume.

use ledger_simulator_core::models::StateError;
use ledger_simulator_core::{
    ActionKind, Address, Counter, InMemoryLedger, InvariantConfig, LedgerClient,
    LockValidatorRewards, RatioBps, SimAccount, SimulationError, SimulationSnapshot, Simulator,
    SimulatorConfig, StopCondition,
};
use std::time::Duration;

fn bps(value: u32) -> RatioBps {
    RatioBps::new(value).unwrap()
}

fn population(n: usize) -> (InMemoryLedger, Vec<SimAccount>) {
    InMemoryLedger::with_bonded_population(n, 1_000)
}

fn config_json() -> &'static str {
    r#"{
        "rng_seed": 2024,
        "tick_budget": 30,
        "operations": [
            { "type": "lock_validator_rewards", "period": 1, "max_locked_ratio_bps": 6000 },
            { "type": "unlock_validator_rewards", "period": 4, "min_locked_ratio_bps": 2000 }
        ],
        "invariants": [
            { "type": "max_locked_ratio", "bps": 6000 }
        ]
    }"#
}

// ============================================================================
// Stop Conditions
// ============================================================================

#[test]
fn test_run_to_budget() {
    let config = SimulatorConfig::from_json_str(config_json()).unwrap();
    let (ledger, accounts) = population(10);
    let mut sim = Simulator::new(config, ledger, accounts).unwrap();

    let report = sim.run_to_budget().unwrap();

    assert_eq!(report.ticks_run, 30);
    assert_eq!(report.final_tick, 30);
    assert_eq!(report.rng_seed, 2024);
    assert_eq!(report.operations.len(), 2);
    assert!(report.is_clean());
}

#[test]
fn test_until_tick_and_resumed_runs() {
    let (ledger, accounts) = population(5);
    let mut sim = Simulator::new(SimulatorConfig::new(1), ledger, accounts).unwrap();

    sim.run(StopCondition::UntilTick(7)).unwrap();
    assert_eq!(sim.current_tick(), 7);

    // already there: nothing to do
    let report = sim.run(StopCondition::UntilTick(3)).unwrap();
    assert_eq!(report.final_tick, 7);

    sim.run(StopCondition::Ticks(3)).unwrap();
    assert_eq!(sim.current_tick(), 10);
}

#[test]
fn test_wall_clock_budget_terminates() {
    let (ledger, accounts) = population(5);
    let mut sim = Simulator::new(SimulatorConfig::new(1), ledger, accounts).unwrap();
    sim.register(LockValidatorRewards::operation(1, bps(5_000)))
        .unwrap();

    let report = sim.run(StopCondition::WallClock(Duration::from_millis(20))).unwrap();
    assert!(report.ticks_run > 0);
    assert_eq!(report.counters.get(Counter::LockedRewards), 2);
}

// ============================================================================
// Invariants
// ============================================================================

#[test]
fn test_violation_is_collected_not_raised() {
    // lock allows 80%, the invariant only 50%
    let config = SimulatorConfig::new(3).with_invariant(InvariantConfig::MaxLockedRatio {
        bps: bps(5_000),
    });
    let (ledger, accounts) = population(10);
    let mut sim = Simulator::new(config, ledger, accounts).unwrap();
    sim.register(LockValidatorRewards::operation(1, bps(8_000)))
        .unwrap();

    let report = sim.run(StopCondition::Ticks(10)).unwrap();

    assert_eq!(report.counters.get(Counter::LockedRewards), 8);
    assert!(report.failure.is_none());
    // every tick from 5 on ends above 50%
    assert_eq!(report.violations.first().map(|v| v.tick), Some(5));
    assert_eq!(report.violations.len(), 5);
    assert!(report
        .violations
        .iter()
        .all(|v| v.invariant == "MaxLockedRatio"));
    assert_eq!(sim.event_log().events_of_type("InvariantViolated").len(), 5);
    assert!(!report.is_clean());
}

#[test]
fn test_guarded_run_has_no_violations() {
    let config = SimulatorConfig::from_json_str(config_json()).unwrap();
    let (ledger, accounts) = population(20);
    let mut sim = Simulator::new(config, ledger, accounts).unwrap();

    let report = sim.run(StopCondition::Ticks(200)).unwrap();
    assert!(report.violations.is_empty());
    assert!(report.counters.get(Counter::UnlockedRewards) > 0);
}

// ============================================================================
// Reports
// ============================================================================

#[test]
fn test_report_serializes() {
    let config = SimulatorConfig::from_json_str(config_json()).unwrap();
    let (ledger, accounts) = population(10);
    let mut sim = Simulator::new(config, ledger, accounts).unwrap();
    let report = sim.run_to_budget().unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["ticks_run"], 30);
    assert!(json["counters"]["LockedRewards"].as_u64().unwrap() >= 6);
    assert_eq!(json["operations"][0]["name"], LockValidatorRewards::ID);
    assert!(json["failure"].is_null());
}

// ============================================================================
// Snapshots
// ============================================================================

#[test]
fn test_snapshot_resume_matches_uninterrupted_run() {
    let config = SimulatorConfig::from_json_str(config_json()).unwrap();

    // uninterrupted: 40 ticks
    let (ledger, accounts) = population(12);
    let mut straight = Simulator::new(config.clone(), ledger, accounts).unwrap();
    straight.run(StopCondition::Ticks(40)).unwrap();

    // interrupted after 15 ticks, resumed on the same ledger
    let (ledger, accounts) = population(12);
    let mut first = Simulator::new(config.clone(), ledger, accounts.clone()).unwrap();
    first.run(StopCondition::Ticks(15)).unwrap();
    let json = first.snapshot().to_json().unwrap();
    let snapshot = SimulationSnapshot::from_json(&json).unwrap();
    let ledger = first.ledger().clone();

    let mut resumed = Simulator::restore(config, ledger, accounts, &snapshot).unwrap();
    assert_eq!(resumed.current_tick(), 15);
    resumed.run(StopCondition::UntilTick(40)).unwrap();

    assert_eq!(resumed.counters(), straight.counters());
    assert_eq!(resumed.rng_state(), straight.rng_state());
    assert_eq!(resumed.ledger().validators(), straight.ledger().validators());
    assert_eq!(resumed.scheduler().schedule(), straight.scheduler().schedule());
}

#[test]
fn test_snapshot_rejected_under_other_config() {
    let (ledger, accounts) = population(4);
    let sim = Simulator::new(SimulatorConfig::new(1), ledger.clone(), accounts.clone()).unwrap();
    let snapshot = sim.snapshot();

    let err = Simulator::restore(SimulatorConfig::new(2), ledger, accounts, &snapshot).unwrap_err();
    assert!(matches!(err, SimulationError::ConfigMismatch { .. }));
}

#[test]
fn test_restore_rejects_validator_missing_from_ledger() {
    let (ledger, accounts) = population(3);
    let sim = Simulator::new(SimulatorConfig::new(1), ledger, accounts).unwrap();
    let snapshot = sim.snapshot();

    let (smaller, accounts) = population(2);
    let err =
        Simulator::restore(SimulatorConfig::new(1), smaller, accounts, &snapshot).unwrap_err();
    assert_eq!(
        err,
        SimulationError::InvalidPopulation(StateError::UnknownValidator(Address::new("val-2")))
    );
}

#[test]
fn test_snapshot_records_cached_validators() {
    let (mut ledger, accounts) = population(3);
    ledger
        .submit_action(&accounts[1], accounts[1].address(), ActionKind::LockRewards)
        .unwrap();
    let sim = Simulator::new(SimulatorConfig::new(1), ledger, accounts).unwrap();

    let snapshot = sim.snapshot();
    assert_eq!(snapshot.validators.len(), 3);
    assert!(snapshot.validators[1].rewards_locked);
    assert_eq!(snapshot.event_count, 0);
    assert_eq!(snapshot.config_hash.len(), 64);
}
