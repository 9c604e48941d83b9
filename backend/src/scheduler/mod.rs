//! Operation scheduler
//!
//! Owns the registered operations and decides, tick by tick, which of them
//! run.
//!
//! # Rules
//!
//! 1. Operations are evaluated in registration order, every tick
//! 2. An operation runs when `now >= next_exec`
//! 3. After it runs, handled or skipped, its next tick is recomputed from its
//!    `NextExecPolicy` (always later than `now`, so at most once per tick)
//! 4. A failing operation aborts the tick: later operations do not run

mod next_exec;

pub use next_exec::NextExecPolicy;

use crate::core::time::Tick;
use crate::models::event::Event;
use crate::operations::{HandleOutcome, Operation, OperationError, SimContext, SkipReason};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("Operation already registered: {0}")]
    DuplicateOperation(String),

    #[error("Operation not registered: {0}")]
    UnknownOperation(String),
}

/// Per-operation execution tallies
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStats {
    pub executions: u64,
    pub handled: u64,
    pub guard_stops: u64,
    pub no_target: u64,
    /// Executions that ended in a ledger error
    #[serde(default)]
    pub failures: u64,
}

impl OperationStats {
    fn record(&mut self, outcome: &HandleOutcome) {
        self.executions += 1;
        match outcome {
            HandleOutcome::Handled { .. } => self.handled += 1,
            HandleOutcome::Skipped {
                reason: SkipReason::GuardStop,
                ..
            } => self.guard_stops += 1,
            HandleOutcome::Skipped {
                reason: SkipReason::NoTarget,
                ..
            } => self.no_target += 1,
        }
    }

    fn record_failure(&mut self) {
        self.executions += 1;
        self.failures += 1;
    }
}

/// Schedule position of one operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleEntry {
    pub name: String,
    pub last_exec: Option<Tick>,
    pub next_exec: Option<Tick>,
    pub stats: OperationStats,
}

/// One operation run within a tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub tick: Tick,
    pub operation: String,
    pub outcome: HandleOutcome,
}

#[derive(Debug)]
struct Scheduled {
    operation: Operation,
    last_exec: Option<Tick>,
    next_exec: Option<Tick>,
    stats: OperationStats,
}

impl Scheduled {
    fn is_due(&self, now: Tick) -> bool {
        self.next_exec.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Default)]
pub struct Scheduler {
    entries: Vec<Scheduled>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an operation; it first becomes due at its start tick
    pub fn register(&mut self, operation: Operation) -> Result<(), SchedulerError> {
        if self.entries.iter().any(|e| e.operation.id() == operation.id()) {
            return Err(SchedulerError::DuplicateOperation(
                operation.id().to_string(),
            ));
        }
        let first = operation.start_tick();
        self.entries.push(Scheduled {
            operation,
            last_exec: None,
            next_exec: Some(first),
            stats: OperationStats::default(),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names in execution order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.operation.id()).collect()
    }

    pub fn stats(&self, name: &str) -> Option<&OperationStats> {
        self.entries
            .iter()
            .find(|e| e.operation.id() == name)
            .map(|e| &e.stats)
    }

    pub fn schedule(&self) -> Vec<ScheduleEntry> {
        self.entries
            .iter()
            .map(|e| ScheduleEntry {
                name: e.operation.id().to_string(),
                last_exec: e.last_exec,
                next_exec: e.next_exec,
                stats: e.stats.clone(),
            })
            .collect()
    }

    /// Restore schedule positions captured by `schedule()`
    ///
    /// Every entry must name a registered operation; registered operations
    /// missing from `entries` keep their current position.
    pub fn restore(&mut self, entries: &[ScheduleEntry]) -> Result<(), SchedulerError> {
        for saved in entries {
            let entry = self
                .entries
                .iter_mut()
                .find(|e| e.operation.id() == saved.name)
                .ok_or_else(|| SchedulerError::UnknownOperation(saved.name.clone()))?;
            entry.last_exec = saved.last_exec;
            entry.next_exec = saved.next_exec;
            entry.stats = saved.stats.clone();
        }
        Ok(())
    }

    /// No operation will ever run again (all one-shots spent)
    pub fn is_exhausted(&self) -> bool {
        self.entries.iter().all(|e| e.next_exec.is_none())
    }

    /// Run every operation due at `ctx.tick`, in registration order
    pub fn run_due(&mut self, ctx: &mut SimContext<'_>) -> Result<Vec<Execution>, OperationError> {
        let now = ctx.tick;
        let mut executions = Vec::new();

        for entry in self.entries.iter_mut().filter(|e| e.is_due(now)) {
            let name = entry.operation.id().to_string();
            entry.last_exec = Some(now);

            let outcome = match entry.operation.execute(ctx) {
                Ok(outcome) => outcome,
                Err(err) => {
                    entry.stats.record_failure();
                    error!(
                        tick = now,
                        operation = %name,
                        phase = %err.phase,
                        error = %err.source,
                        "operation failed"
                    );
                    ctx.events.log(Event::OperationFailed {
                        tick: now,
                        operation: name,
                        phase: err.phase,
                        error: err.source.to_string(),
                    });
                    return Err(err);
                }
            };

            entry.stats.record(&outcome);
            match &outcome {
                HandleOutcome::Handled { message, .. } => {
                    info!(tick = now, operation = %name, "{}", message);
                    ctx.events.log(Event::OperationHandled {
                        tick: now,
                        operation: name.clone(),
                        message: message.clone(),
                    });
                }
                HandleOutcome::Skipped { reason, message } => {
                    debug!(tick = now, operation = %name, ?reason, "{}", message);
                    ctx.events.log(Event::OperationSkipped {
                        tick: now,
                        operation: name.clone(),
                        reason: *reason,
                    });
                }
            }

            let period = entry.operation.period();
            entry.next_exec = entry
                .operation
                .next_exec_policy()
                .next_exec(now, period, &mut *ctx.rng);

            executions.push(Execution {
                tick: now,
                operation: name,
                outcome,
            });
        }

        Ok(executions)
    }
}
