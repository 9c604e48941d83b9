//! Simulator Engine
//!
//! Composes the state view, the ledger client, the scheduler and the run
//! statistics, and drives them tick by tick:
//!
//! ```text
//! For each tick t:
//! 1. Scheduler runs every due operation in registration order
//!    (guard → select → mutate → record, one operation at a time)
//! 2. Configured invariants are checked against the state view
//! 3. Time advances
//! ```
//!
//! A ledger failure inside any operation halts the run. The simulator keeps
//! the failure so the final report can name the operation, phase and error.
//!
//! # Example
//!
//! ```rust
//! use ledger_simulator_core::ledger::InMemoryLedger;
//! use ledger_simulator_core::models::{Counter, RatioBps};
//! use ledger_simulator_core::operations::LockValidatorRewards;
//! use ledger_simulator_core::orchestrator::{Simulator, SimulatorConfig, StopCondition};
//!
//! let (ledger, accounts) = InMemoryLedger::with_bonded_population(10, 1_000);
//! let mut sim = Simulator::new(SimulatorConfig::new(42), ledger, accounts).unwrap();
//! sim.register(LockValidatorRewards::operation(1, RatioBps::new(5_000).unwrap()))
//!     .unwrap();
//!
//! let report = sim.run(StopCondition::Ticks(20)).unwrap();
//! assert_eq!(report.counters.get(Counter::LockedRewards), 5);
//! ```

use crate::core::time::{Tick, TimeManager};
use crate::ledger::{LedgerClient, ValidatorSnapshot};
use crate::models::account::SimAccount;
use crate::models::counters::Counters;
use crate::models::event::{Event, EventLog};
use crate::models::state::{StateError, StateView};
use crate::models::validator::{SimValidator, ValidatorFilter};
use crate::operations::{
    build_operation, Operation, OperationConfig, OperationError, Phase, SimContext,
};
use crate::orchestrator::checkpoint::{compute_config_hash, validate_snapshot, SimulationSnapshot};
use crate::orchestrator::invariants::{check_all, InvariantConfig, InvariantViolation};
use crate::rng::SimRng;
use crate::scheduler::{Execution, NextExecPolicy, ScheduleEntry, Scheduler, SchedulerError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

// ============================================================================
// Configuration
// ============================================================================

/// Complete simulator configuration
///
/// Operations declared here are registered at construction, before any
/// registered in code with `Simulator::register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Seed for the single simulation RNG
    pub rng_seed: u64,

    /// Default stop condition for `run_to_budget`
    #[serde(default)]
    pub tick_budget: Option<u64>,

    #[serde(default)]
    pub operations: Vec<OperationConfig>,

    /// Checked after every tick
    #[serde(default)]
    pub invariants: Vec<InvariantConfig>,
}

impl SimulatorConfig {
    /// Empty config with the given seed
    pub fn new(rng_seed: u64) -> Self {
        Self {
            rng_seed,
            tick_budget: None,
            operations: Vec::new(),
            invariants: Vec::new(),
        }
    }

    pub fn with_tick_budget(mut self, ticks: u64) -> Self {
        self.tick_budget = Some(ticks);
        self
    }

    pub fn with_operation(mut self, operation: OperationConfig) -> Self {
        self.operations.push(operation);
        self
    }

    pub fn with_invariant(mut self, invariant: InvariantConfig) -> Self {
        self.invariants.push(invariant);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self, SimulationError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| SimulationError::InvalidConfig(format!("Config parse failed: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String, SimulationError> {
        serde_json::to_string_pretty(self).map_err(|e| {
            SimulationError::Serialization(format!("Config serialization failed: {}", e))
        })
    }

    pub fn validate(&self) -> Result<(), SimulationError> {
        if self.tick_budget == Some(0) {
            return Err(SimulationError::InvalidConfig(
                "tick_budget must be positive".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for op in &self.operations {
            if !names.insert(op.name()) {
                return Err(SimulationError::InvalidConfig(format!(
                    "Duplicate operation name: {}",
                    op.name()
                )));
            }
            if op.period() == 0 {
                return Err(SimulationError::InvalidConfig(format!(
                    "Operation {} must have a positive period",
                    op.name()
                )));
            }
            if let NextExecPolicy::Jittered { max_offset } = op.next_exec() {
                if *max_offset >= op.period() {
                    return Err(SimulationError::InvalidConfig(format!(
                        "Operation {} jitter {} must be smaller than its period {}",
                        op.name(),
                        max_offset,
                        op.period()
                    )));
                }
            }
        }

        Ok(())
    }

    /// SHA256 of the canonical config
    pub fn config_hash(&self) -> Result<String, SimulationError> {
        compute_config_hash(self)
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Harness-fatal errors
///
/// Invariant violations are deliberately not here: they are collected in the
/// `RunReport`, see `orchestrator::invariants`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SimulationError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Invalid population: {0}")]
    InvalidPopulation(#[from] StateError),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    OperationFailed(#[from] OperationError),

    #[error("Simulation halted at tick {tick} after {operation} failed")]
    Halted { operation: String, tick: Tick },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Snapshot config mismatch: expected {expected}, got {actual}")]
    ConfigMismatch { expected: String, actual: String },
}

// ============================================================================
// Results
// ============================================================================

/// When `run` stops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// Run this many more ticks
    Ticks(u64),

    /// Run until the current tick reaches this value
    UntilTick(Tick),

    /// Run until this much wall-clock time has passed (checked between ticks)
    WallClock(Duration),
}

/// Result of a single tick
#[derive(Debug, Clone)]
pub struct TickResult {
    pub tick: Tick,

    /// Operations that ran, in execution order
    pub executions: Vec<Execution>,

    /// Invariant violations found after the tick
    pub violations: Vec<InvariantViolation>,
}

impl TickResult {
    pub fn num_handled(&self) -> usize {
        self.executions
            .iter()
            .filter(|e| e.outcome.handled())
            .count()
    }
}

/// Fatal failure summary for reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureSummary {
    pub operation: String,
    pub phase: Phase,
    pub tick: Tick,
    pub error: String,
}

impl From<&OperationError> for FailureSummary {
    fn from(err: &OperationError) -> Self {
        Self {
            operation: err.operation.clone(),
            phase: err.phase,
            tick: err.tick,
            error: err.source.to_string(),
        }
    }
}

/// Final statistics of a run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Identifies this run in logs; not derived from the seed
    pub run_id: Uuid,
    pub rng_seed: u64,
    pub ticks_run: u64,
    pub final_tick: Tick,
    pub counters: Counters,
    pub operations: Vec<ScheduleEntry>,
    pub violations: Vec<InvariantViolation>,
    pub failure: Option<FailureSummary>,
}

impl RunReport {
    /// Completed without a fatal error or invariant violation
    pub fn is_clean(&self) -> bool {
        self.failure.is_none() && self.violations.is_empty()
    }
}

// ============================================================================
// Simulator
// ============================================================================

/// The simulation context threaded through every operation
///
/// An explicit value rather than a global: independent simulators can run
/// side by side in one process.
///
/// # Determinism
///
/// All randomness is drawn from `rng`. Same seed + same registration order +
/// same ledger behaviour = identical selections and counters.
pub struct Simulator<L: LedgerClient> {
    config: SimulatorConfig,
    config_hash: String,
    run_id: Uuid,

    state: StateView,
    ledger: L,
    rng: SimRng,
    counters: Counters,
    events: EventLog,

    scheduler: Scheduler,
    time: TimeManager,

    violations: Vec<InvariantViolation>,
    failure: Option<OperationError>,
}

impl<L: LedgerClient> Simulator<L> {
    /// Build a simulator over `ledger`
    ///
    /// Loads every validator the ledger reports and checks each operator has
    /// an account in `accounts`. Configured operations are registered in
    /// config order.
    pub fn new(
        config: SimulatorConfig,
        ledger: L,
        accounts: Vec<SimAccount>,
    ) -> Result<Self, SimulationError> {
        config.validate()?;
        let config_hash = config.config_hash()?;

        let validators: Vec<SimValidator> = ledger
            .query_validators(&ValidatorFilter::all())
            .into_iter()
            .map(SimValidator::from)
            .collect();
        let state = StateView::new(accounts, validators)?;

        let mut scheduler = Scheduler::new();
        for op in &config.operations {
            scheduler.register(build_operation(op))?;
        }

        let run_id = Uuid::new_v4();
        info!(
            %run_id,
            seed = config.rng_seed,
            validators = state.get_all_validators().len(),
            accounts = state.get_all_accounts().len(),
            operations = scheduler.len(),
            "simulator initialised"
        );

        Ok(Self {
            rng: SimRng::new(config.rng_seed),
            config,
            config_hash,
            run_id,
            state,
            ledger,
            counters: Counters::new(),
            events: EventLog::new(),
            scheduler,
            time: TimeManager::new(),
            violations: Vec::new(),
            failure: None,
        })
    }

    /// Resume from a snapshot taken under the same config
    ///
    /// Operations registered in code must be registered again, in the same
    /// order, before calling `restore_schedule` with the snapshot.
    pub fn restore(
        config: SimulatorConfig,
        ledger: L,
        accounts: Vec<SimAccount>,
        snapshot: &SimulationSnapshot,
    ) -> Result<Self, SimulationError> {
        let mut sim = Self::new(config, ledger, accounts)?;
        validate_snapshot(snapshot, &sim.config_hash)?;

        sim.time = TimeManager::starting_at(snapshot.tick);
        sim.rng = SimRng::from_state(snapshot.rng_state);
        sim.counters = snapshot.counters.clone();
        sim.restore_schedule(snapshot)?;
        for validator in &snapshot.validators {
            if !sim.state.update_validator(validator.clone()) {
                let address = validator.operator_address.clone();
                return Err(StateError::UnknownValidator(address).into());
            }
        }
        Ok(sim)
    }

    /// Apply schedule positions for every operation named in `snapshot`
    pub fn restore_schedule(
        &mut self,
        snapshot: &SimulationSnapshot,
    ) -> Result<(), SimulationError> {
        let known: Vec<ScheduleEntry> = snapshot
            .schedule
            .iter()
            .filter(|e| self.scheduler.names().contains(&e.name.as_str()))
            .cloned()
            .collect();
        self.scheduler.restore(&known)?;
        Ok(())
    }

    /// Add an operation after the configured ones
    pub fn register(&mut self, operation: Operation) -> Result<(), SimulationError> {
        self.scheduler.register(operation)?;
        Ok(())
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn current_tick(&self) -> Tick {
        self.time.current_tick()
    }

    pub fn state(&self) -> &StateView {
        &self.state
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    /// Mutable ledger access
    ///
    /// Changes made here bypass the record phase; call `resync_validators`
    /// afterwards so operations do not read stale snapshots.
    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn counters(&self) -> &Counters {
        &self.counters
    }

    pub fn event_log(&self) -> &EventLog {
        &self.events
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    pub fn violations(&self) -> &[InvariantViolation] {
        &self.violations
    }

    pub fn failure(&self) -> Option<&OperationError> {
        self.failure.as_ref()
    }

    pub fn rng_state(&self) -> u64 {
        self.rng.state()
    }

    /// Reload every cached validator from the ledger
    pub fn resync_validators(&mut self) {
        for snapshot in self.ledger.query_validators(&ValidatorFilter::all()) {
            self.state.update_validator(snapshot);
        }
    }

    // ========================================================================
    // Tick Loop
    // ========================================================================

    /// Execute one simulation tick
    pub fn tick(&mut self) -> Result<TickResult, SimulationError> {
        if let Some(err) = &self.failure {
            return Err(SimulationError::Halted {
                operation: err.operation.clone(),
                tick: err.tick,
            });
        }

        let tick = self.time.current_tick();
        let mut ctx = SimContext {
            tick,
            state: &mut self.state,
            ledger: &mut self.ledger,
            rng: &mut self.rng,
            counters: &mut self.counters,
            events: &mut self.events,
        };

        let executions = match self.scheduler.run_due(&mut ctx) {
            Ok(executions) => executions,
            Err(err) => {
                self.failure = Some(err.clone());
                return Err(err.into());
            }
        };

        let violations = check_all(&self.config.invariants, &self.state, tick);
        for violation in &violations {
            warn!(
                tick,
                invariant = %violation.invariant,
                detail = %violation.detail,
                "invariant violated"
            );
            self.events.log(Event::InvariantViolated {
                tick,
                invariant: violation.invariant.clone(),
                detail: violation.detail.clone(),
            });
        }
        self.violations.extend(violations.iter().cloned());

        self.time.advance_tick();

        Ok(TickResult {
            tick,
            executions,
            violations,
        })
    }

    /// Tick until `stop` is met or an operation fails
    pub fn run(&mut self, stop: StopCondition) -> Result<RunReport, SimulationError> {
        let started_at = Instant::now();
        let first_tick = self.current_tick();

        loop {
            let done = match stop {
                StopCondition::Ticks(n) => self.current_tick() - first_tick >= n,
                StopCondition::UntilTick(t) => self.current_tick() >= t,
                StopCondition::WallClock(budget) => started_at.elapsed() >= budget,
            };
            if done {
                break;
            }
            self.tick()?;
        }

        let report = self.report();
        info!(
            run_id = %report.run_id,
            ticks = report.ticks_run,
            violations = report.violations.len(),
            "run complete"
        );
        Ok(report)
    }

    /// Run for the config's `tick_budget`
    pub fn run_to_budget(&mut self) -> Result<RunReport, SimulationError> {
        let budget = self.config.tick_budget.ok_or_else(|| {
            SimulationError::InvalidConfig("tick_budget is not set".to_string())
        })?;
        self.run(StopCondition::Ticks(budget))
    }

    /// Statistics so far; usable after a failed run
    pub fn report(&self) -> RunReport {
        RunReport {
            run_id: self.run_id,
            rng_seed: self.config.rng_seed,
            ticks_run: self.time.elapsed_ticks(),
            final_tick: self.time.current_tick(),
            counters: self.counters.clone(),
            operations: self.scheduler.schedule(),
            violations: self.violations.clone(),
            failure: self.failure.as_ref().map(FailureSummary::from),
        }
    }

    /// Capture harness state at the current tick boundary
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            tick: self.time.current_tick(),
            rng_state: self.rng.state(),
            counters: self.counters.clone(),
            schedule: self.scheduler.schedule(),
            validators: self
                .state
                .get_all_validators()
                .iter()
                .map(ValidatorSnapshot::from)
                .collect(),
            event_count: self.events.len(),
            config_hash: self.config_hash.clone(),
        }
    }
}

// Manual Debug implementation (the ledger need not implement Debug)
impl<L: LedgerClient> std::fmt::Debug for Simulator<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulator")
            .field("run_id", &self.run_id)
            .field("current_tick", &self.time.current_tick())
            .field("operations", &self.scheduler.names())
            .field("counters", &self.counters)
            .field("event_count", &self.events.len())
            .field("failed", &self.failure.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::InMemoryLedger;
    use crate::models::ratio::RatioBps;

    fn lock_config(period: u64, bps: u32) -> OperationConfig {
        OperationConfig::LockValidatorRewards {
            name: None,
            period,
            max_locked_ratio_bps: RatioBps::new(bps).unwrap(),
            next_exec: NextExecPolicy::Periodic,
            start_tick: 0,
        }
    }

    #[test]
    fn test_validate_rejects_zero_period() {
        let config = SimulatorConfig::new(1).with_operation(lock_config(0, 5_000));
        assert!(matches!(
            config.validate(),
            Err(SimulationError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_rejects_duplicate_names() {
        let config = SimulatorConfig::new(1)
            .with_operation(lock_config(1, 5_000))
            .with_operation(lock_config(2, 4_000));
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Duplicate operation name"));
    }

    #[test]
    fn test_validate_rejects_wide_jitter() {
        let config = SimulatorConfig::new(1).with_operation(OperationConfig::LockValidatorRewards {
            name: None,
            period: 3,
            max_locked_ratio_bps: RatioBps::new(5_000).unwrap(),
            next_exec: NextExecPolicy::Jittered { max_offset: 3 },
            start_tick: 0,
        });
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        assert!(SimulatorConfig::new(1).with_tick_budget(0).validate().is_err());
    }

    #[test]
    fn test_configured_operations_registered_in_order() {
        let (ledger, accounts) = InMemoryLedger::with_bonded_population(4, 10);
        let config = SimulatorConfig::new(1)
            .with_operation(lock_config(1, 5_000))
            .with_operation(OperationConfig::UnlockValidatorRewards {
                name: None,
                period: 2,
                min_locked_ratio_bps: RatioBps::ZERO,
                next_exec: NextExecPolicy::Periodic,
                start_tick: 0,
            });

        let sim = Simulator::new(config, ledger, accounts).unwrap();
        assert_eq!(
            sim.scheduler().names(),
            vec!["LockValidatorRewardsOp", "UnlockValidatorRewardsOp"]
        );
    }

    #[test]
    fn test_missing_operator_account_rejected() {
        let (ledger, mut accounts) = InMemoryLedger::with_bonded_population(3, 10);
        accounts.pop();
        let err = Simulator::new(SimulatorConfig::new(1), ledger, accounts).unwrap_err();
        assert!(matches!(
            err,
            SimulationError::InvalidPopulation(StateError::MissingOperatorAccount(_))
        ));
    }

    #[test]
    fn test_run_to_budget_requires_budget() {
        let (ledger, accounts) = InMemoryLedger::with_bonded_population(1, 10);
        let mut sim = Simulator::new(SimulatorConfig::new(1), ledger, accounts).unwrap();
        assert!(sim.run_to_budget().is_err());
    }
}
