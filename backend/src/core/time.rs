//! Simulated time
//!
//! The harness advances in discrete ticks. A tick is a step of simulated
//! time, never wall-clock time: operation periods, schedule offsets and
//! tick budgets are all expressed in ticks.

use serde::{Deserialize, Serialize};

/// A point in simulated time (ticks since the simulation started)
pub type Tick = u64;

/// Tracks the current simulated tick
///
/// # Example
/// ```
/// use ledger_simulator_core::TimeManager;
///
/// let mut time = TimeManager::new();
/// assert_eq!(time.current_tick(), 0);
///
/// time.advance_tick();
/// assert_eq!(time.current_tick(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeManager {
    /// Tick the scheduler evaluates next
    current_tick: Tick,
    /// Ticks that have fully completed
    elapsed_ticks: u64,
}

impl TimeManager {
    /// Create a clock positioned at tick 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a clock positioned at `tick` (used when resuming from a snapshot)
    pub fn starting_at(tick: Tick) -> Self {
        Self {
            current_tick: tick,
            elapsed_ticks: 0,
        }
    }

    /// Complete the current tick and move to the next one
    pub fn advance_tick(&mut self) {
        self.current_tick += 1;
        self.elapsed_ticks += 1;
    }

    /// The tick currently being (or about to be) evaluated
    pub fn current_tick(&self) -> Tick {
        self.current_tick
    }

    /// Number of ticks completed by this clock
    pub fn elapsed_ticks(&self) -> u64 {
        self.elapsed_ticks
    }
}
