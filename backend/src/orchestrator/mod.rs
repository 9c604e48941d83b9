//! Orchestrator - main simulation loop
//!
//! Ties the state view, ledger client, scheduler and statistics together.
//! See `engine.rs` for the tick loop.

pub mod checkpoint;
pub mod engine;
pub mod invariants;

// Re-export main types for convenience
pub use engine::{
    FailureSummary, RunReport, SimulationError, Simulator, SimulatorConfig, StopCondition,
    TickResult,
};

pub use checkpoint::{compute_config_hash, SimulationSnapshot};
pub use invariants::{InvariantConfig, InvariantViolation};
