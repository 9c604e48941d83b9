//! Event logging for run replay and auditing.
//!
//! Every operation execution leaves a trail in the `EventLog`:
//! - **TargetSelected**: the entity the select phase picked
//! - **ActionSubmitted**: one per ledger call made by the mutate phase
//! - **ValidatorRefreshed**: the snapshot the record phase stored
//! - **OperationHandled / OperationSkipped / OperationFailed**: exactly one
//!   per execution, closing it out
//! - **InvariantViolated**: post-tick assertion failures
//!
//! Two runs with the same seed and registration order produce identical logs,
//! so comparing `EventLog::selected_targets` is the cheapest way to confirm a
//! replay matched.

use crate::core::time::Tick;
use crate::ledger::ActionKind;
use crate::models::account::Address;
use crate::operations::{Phase, SkipReason};
use serde::Serialize;

/// Simulation event
///
/// Events are logged in the order they occur within a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Select phase picked a target
    TargetSelected {
        tick: Tick,
        operation: String,
        target: String,
    },

    /// Mutate phase issued a ledger call that succeeded
    ActionSubmitted {
        tick: Tick,
        operation: String,
        signer: Address,
        validator: Address,
        action: ActionKind,
    },

    /// Record phase stored a fresh validator snapshot
    ValidatorRefreshed {
        tick: Tick,
        validator: Address,
        rewards_locked: bool,
        auto_renewal: bool,
    },

    /// All four phases completed
    OperationHandled {
        tick: Tick,
        operation: String,
        message: String,
    },

    /// Guard stop or no eligible target
    OperationSkipped {
        tick: Tick,
        operation: String,
        reason: SkipReason,
    },

    /// Ledger rejected a call; the run halts after this event
    OperationFailed {
        tick: Tick,
        operation: String,
        phase: Phase,
        error: String,
    },

    /// A configured invariant did not hold after a tick
    InvariantViolated {
        tick: Tick,
        invariant: String,
        detail: String,
    },
}

impl Event {
    pub fn tick(&self) -> Tick {
        match self {
            Event::TargetSelected { tick, .. } => *tick,
            Event::ActionSubmitted { tick, .. } => *tick,
            Event::ValidatorRefreshed { tick, .. } => *tick,
            Event::OperationHandled { tick, .. } => *tick,
            Event::OperationSkipped { tick, .. } => *tick,
            Event::OperationFailed { tick, .. } => *tick,
            Event::InvariantViolated { tick, .. } => *tick,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Event::TargetSelected { .. } => "TargetSelected",
            Event::ActionSubmitted { .. } => "ActionSubmitted",
            Event::ValidatorRefreshed { .. } => "ValidatorRefreshed",
            Event::OperationHandled { .. } => "OperationHandled",
            Event::OperationSkipped { .. } => "OperationSkipped",
            Event::OperationFailed { .. } => "OperationFailed",
            Event::InvariantViolated { .. } => "InvariantViolated",
        }
    }

    /// Operation name if the event came from an operation
    pub fn operation(&self) -> Option<&str> {
        match self {
            Event::TargetSelected { operation, .. } => Some(operation),
            Event::ActionSubmitted { operation, .. } => Some(operation),
            Event::OperationHandled { operation, .. } => Some(operation),
            Event::OperationSkipped { operation, .. } => Some(operation),
            Event::OperationFailed { operation, .. } => Some(operation),
            _ => None,
        }
    }
}

/// Append-only event log
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn log(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn events_at_tick(&self, tick: Tick) -> Vec<&Event> {
        self.events.iter().filter(|e| e.tick() == tick).collect()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn events_for_operation(&self, operation: &str) -> Vec<&Event> {
        self.events
            .iter()
            .filter(|e| e.operation() == Some(operation))
            .collect()
    }

    /// `(tick, operation, target)` for every selection, in order
    pub fn selected_targets(&self) -> Vec<(Tick, &str, &str)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::TargetSelected {
                    tick,
                    operation,
                    target,
                } => Some((*tick, operation.as_str(), target.as_str())),
                _ => None,
            })
            .collect()
    }

    /// Ledger calls issued for one validator, in order
    pub fn actions_for_validator(&self, validator: &Address) -> Vec<ActionKind> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::ActionSubmitted {
                    validator: v,
                    action,
                    ..
                } if v == validator => Some(*action),
                _ => None,
            })
            .collect()
    }
}
