//! Ledger Simulator Core - Rust Engine
//!
//! Randomized, reproducible operation simulator for exercising a validator
//! ledger. Registered operations fire on a schedule; each one checks an
//! aggregate guard, picks a random eligible validator, submits actions to the
//! ledger and records the result.
//!
//! # Architecture
//!
//! - **core**: Time management
//! - **models**: Domain types (accounts, validators, state view, counters, events)
//! - **ledger**: `LedgerClient` boundary and an in-memory ledger
//! - **operations**: Four-phase guarded operations
//! - **scheduler**: Per-tick operation scheduling
//! - **orchestrator**: Main simulation loop, invariants, snapshots
//! - **rng**: Deterministic random number generation
//!
//! # Critical Invariants
//!
//! 1. All randomness is drawn from one seeded RNG owned by the simulator
//! 2. Operations run one at a time, in registration order
//! 3. A guard that stops an operation guarantees no ledger call is made
//! 4. Ledger failures halt the run; invariant violations are only collected

// Module declarations
pub mod core;
pub mod ledger;
pub mod models;
pub mod operations;
pub mod orchestrator;
pub mod rng;
pub mod scheduler;

// Re-exports for convenience
pub use core::time::{Tick, TimeManager};
pub use ledger::{ActionKind, InMemoryLedger, LedgerClient, LedgerError, ValidatorSnapshot};
pub use models::{
    account::{Address, SimAccount},
    counters::{Counter, Counters},
    event::{Event, EventLog},
    ratio::{LockedRatio, RatioBps},
    state::StateView,
    validator::{SimValidator, ValidatorFilter, ValidatorStatus},
};
pub use operations::{
    GuardedOperation, HandleOutcome, LockValidatorRewards, Operation, OperationConfig,
    OperationError, UnlockValidatorRewards,
};
pub use orchestrator::{
    InvariantConfig, InvariantViolation, RunReport, SimulationError, SimulationSnapshot, Simulator,
    SimulatorConfig, StopCondition, TickResult,
};
pub use rng::SimRng;
pub use scheduler::{NextExecPolicy, Scheduler};
