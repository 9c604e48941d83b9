//! Operations
//!
//! An operation is a named, independently scheduled unit of randomized,
//! guarded state mutation. Each execution runs four phases strictly in order:
//!
//! ```text
//! 1. Guard   (check_input)  aggregate check, may stop the execution
//! 2. Select  (find_target)  first eligible entity in a shuffled order
//! 3. Mutate  (handle)       ledger calls, sequential, no rollback
//! 4. Record  (post)         refresh snapshots, bump counters
//! ```
//!
//! Phase permissions are carried by the argument types: the guard only sees
//! `&StateView`, selection additionally draws from the simulator's RNG, only
//! the mutate phase holds `&mut dyn LedgerClient`, and only the record phase
//! can touch the state cache and the counters.
//!
//! # Outcomes
//!
//! - `HandleOutcome::Handled`: phases 2–4 completed
//! - `HandleOutcome::Skipped`: guard stop or no eligible target (benign)
//! - `Err(OperationError)`: the ledger rejected a call (harness-fatal)

pub mod context;
pub mod factory;
pub mod lock_rewards;
pub mod unlock_rewards;

use crate::core::time::Tick;
use crate::ledger::{LedgerClient, LedgerError};
use crate::models::account::SimAccount;
use crate::models::state::StateView;
use crate::models::validator::SimValidator;
use crate::rng::SimRng;
use crate::scheduler::NextExecPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use context::{RecordContext, SimContext};
pub use factory::{build_operation, OperationConfig};
pub use lock_rewards::LockValidatorRewards;
pub use unlock_rewards::UnlockValidatorRewards;

/// Execution phase, used to report where a failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Guard,
    Select,
    Mutate,
    Record,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Guard => "guard",
            Phase::Select => "select",
            Phase::Mutate => "mutate",
            Phase::Record => "record",
        };
        f.write_str(name)
    }
}

/// Why an execution declined to act
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    GuardStop,
    NoTarget,
}

/// Guard phase verdict
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Proceed,
    Stop { reason: String },
}

/// Result of one execution that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandleOutcome {
    Handled { message: String, target: String },
    Skipped { reason: SkipReason, message: String },
}

impl HandleOutcome {
    pub fn handled(&self) -> bool {
        matches!(self, HandleOutcome::Handled { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            HandleOutcome::Handled { message, .. } => message,
            HandleOutcome::Skipped { message, .. } => message,
        }
    }
}

/// A ledger call failed while an operation ran
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("operation {operation} failed in {phase} phase at tick {tick}: {source}")]
pub struct OperationError {
    pub operation: String,
    pub phase: Phase,
    pub tick: Tick,
    #[source]
    pub source: LedgerError,
}

/// Something an operation selects and acts on
pub trait OperationTarget {
    /// Stable identifier used in the event log
    fn label(&self) -> String;
}

/// A validator together with the account that signs for it
///
/// Both are owned copies: a target never borrows from the state view, so it
/// cannot outlive the execution that selected it as a stale reference.
#[derive(Debug, Clone)]
pub struct ValidatorTarget {
    pub account: SimAccount,
    pub validator: SimValidator,
}

impl OperationTarget for ValidatorTarget {
    fn label(&self) -> String {
        self.validator.address().to_string()
    }
}

/// The four-phase contract
///
/// Implement this for a new economic action; the blanket `OperationHandler`
/// impl sequences the phases and turns ledger errors into `OperationError`s.
pub trait GuardedOperation {
    type Target: OperationTarget;

    /// Phase 1: aggregate check against the current state
    fn check_input(&self, state: &StateView) -> GuardDecision;

    /// Phase 2: pick a target, or `None` when nothing is eligible
    fn find_target(&self, state: &StateView, rng: &mut SimRng) -> Option<Self::Target>;

    /// Phase 3: ledger side effects
    fn handle(&self, ledger: &mut dyn LedgerClient, target: &Self::Target)
        -> Result<(), LedgerError>;

    /// Phase 4: refresh and count; returns the success message
    fn post(&self, ctx: &mut RecordContext<'_, '_>, target: &Self::Target)
        -> Result<String, LedgerError>;
}

/// Object-safe execution entry point stored in an `Operation`
pub trait OperationHandler {
    fn execute(
        &self,
        name: &str,
        ctx: &mut SimContext<'_>,
    ) -> Result<HandleOutcome, OperationError>;
}

impl<T: GuardedOperation> OperationHandler for T {
    fn execute(
        &self,
        name: &str,
        ctx: &mut SimContext<'_>,
    ) -> Result<HandleOutcome, OperationError> {
        let tick = ctx.tick;
        let fail = |phase, source| OperationError {
            operation: name.to_string(),
            phase,
            tick,
            source,
        };

        if let GuardDecision::Stop { reason } = self.check_input(&*ctx.state) {
            return Ok(HandleOutcome::Skipped {
                reason: SkipReason::GuardStop,
                message: reason,
            });
        }

        let target = match self.find_target(&*ctx.state, &mut *ctx.rng) {
            Some(target) => target,
            None => {
                return Ok(HandleOutcome::Skipped {
                    reason: SkipReason::NoTarget,
                    message: "target not found".to_string(),
                })
            }
        };
        let label = target.label();
        ctx.record_selection(name, &label);

        let mutated = ctx.with_recording_ledger(name, |ledger| self.handle(ledger, &target));
        mutated.map_err(|e| fail(Phase::Mutate, e))?;

        let message = self
            .post(&mut ctx.record_context(), &target)
            .map_err(|e| fail(Phase::Record, e))?;

        Ok(HandleOutcome::Handled {
            message,
            target: label,
        })
    }
}

/// A registered, schedulable operation
pub struct Operation {
    id: String,
    /// Minimum gap between executions, in ticks
    period: u64,
    next_exec: NextExecPolicy,
    start_tick: Tick,
    handler: Box<dyn OperationHandler>,
}

impl Operation {
    pub fn new<H>(id: impl Into<String>, period: u64, next_exec: NextExecPolicy, handler: H) -> Self
    where
        H: OperationHandler + 'static,
    {
        Self {
            id: id.into(),
            period,
            next_exec,
            start_tick: 0,
            handler: Box::new(handler),
        }
    }

    /// First tick the operation becomes eligible (default 0)
    pub fn with_start_tick(mut self, tick: Tick) -> Self {
        self.start_tick = tick;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    pub fn next_exec_policy(&self) -> &NextExecPolicy {
        &self.next_exec
    }

    pub fn start_tick(&self) -> Tick {
        self.start_tick
    }

    pub fn execute(&self, ctx: &mut SimContext<'_>) -> Result<HandleOutcome, OperationError> {
        self.handler.execute(&self.id, ctx)
    }
}

impl fmt::Debug for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operation")
            .field("id", &self.id)
            .field("period", &self.period)
            .field("next_exec", &self.next_exec)
            .field("start_tick", &self.start_tick)
            .finish()
    }
}

/// Shuffled, first-match selection over validators shared by the concrete ops
pub(crate) fn first_shuffled_validator<F>(
    state: &StateView,
    candidates: &crate::models::state::Validators,
    rng: &mut SimRng,
    eligible: F,
) -> Option<ValidatorTarget>
where
    F: Fn(&SimValidator) -> bool,
{
    candidates
        .get_shuffled(rng)
        .into_iter()
        .filter(|v| eligible(v))
        .find_map(|v| {
            state.operator_account(v).map(|account| ValidatorTarget {
                account: account.clone(),
                validator: v.clone(),
            })
        })
}
