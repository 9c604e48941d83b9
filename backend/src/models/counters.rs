//! Run statistics
//!
//! Monotonic counters summarising what operations did over a run. Only the
//! record phase of an operation holds `&mut Counters`; everything else,
//! including end-of-run assertions, reads them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Named metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Counter {
    LockedRewards,
    UnlockedRewards,
    DisabledAutoRenewals,
    EnabledAutoRenewals,
}

impl Counter {
    pub fn name(&self) -> &'static str {
        match self {
            Counter::LockedRewards => "LockedRewards",
            Counter::UnlockedRewards => "UnlockedRewards",
            Counter::DisabledAutoRenewals => "DisabledAutoRenewals",
            Counter::EnabledAutoRenewals => "EnabledAutoRenewals",
        }
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Counter aggregate owned by the simulator
///
/// # Example
/// ```
/// use ledger_simulator_core::models::{Counter, Counters};
///
/// let mut counters = Counters::new();
/// counters.increment(Counter::LockedRewards);
/// assert_eq!(counters.get(Counter::LockedRewards), 1);
/// assert_eq!(counters.get(Counter::UnlockedRewards), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Counters {
    values: BTreeMap<Counter, u64>,
}

impl Counters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment(&mut self, counter: Counter) {
        self.add(counter, 1);
    }

    pub fn add(&mut self, counter: Counter, amount: u64) {
        let value = self.values.entry(counter).or_insert(0);
        *value = value.saturating_add(amount);
    }

    /// Current value; counters never touched read as 0
    pub fn get(&self, counter: Counter) -> u64 {
        self.values.get(&counter).copied().unwrap_or(0)
    }

    /// Non-zero counters in a stable order
    pub fn iter(&self) -> impl Iterator<Item = (Counter, u64)> + '_ {
        self.values.iter().map(|(k, v)| (*k, *v))
    }

    pub fn total(&self) -> u64 {
        self.values.values().sum()
    }
}
