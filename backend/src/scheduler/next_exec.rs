//! Next-execution policies
//!
//! A policy maps "the operation just ran at `now`" to the next tick it may
//! run again. Jitter draws from the simulator's RNG so a seeded run replays
//! the same schedule.

use crate::core::time::Tick;
use crate::rng::SimRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextExecPolicy {
    /// Exactly `period` ticks later
    #[default]
    Periodic,

    /// `period` ticks later, shifted by a uniform offset in
    /// `[-max_offset, +max_offset]`
    Jittered { max_offset: u64 },

    /// Runs once and never again
    OneShot,
}

impl NextExecPolicy {
    /// Next eligible tick after executing at `now`, or `None` for never
    ///
    /// The result is always later than `now`: an operation never runs twice
    /// in one tick, even with a zero period or a large negative offset.
    ///
    /// # Example
    /// ```
    /// use ledger_simulator_core::{scheduler::NextExecPolicy, SimRng};
    ///
    /// let mut rng = SimRng::new(1);
    /// assert_eq!(NextExecPolicy::Periodic.next_exec(10, 5, &mut rng), Some(15));
    /// assert_eq!(NextExecPolicy::OneShot.next_exec(10, 5, &mut rng), None);
    /// ```
    pub fn next_exec(&self, now: Tick, period: u64, rng: &mut SimRng) -> Option<Tick> {
        let earliest = now.saturating_add(1);
        let base = now.saturating_add(period);

        match self {
            NextExecPolicy::Periodic => Some(base.max(earliest)),
            NextExecPolicy::Jittered { max_offset } => {
                if *max_offset == 0 {
                    return Some(base.max(earliest));
                }
                let bound = i64::try_from(*max_offset).unwrap_or(i64::MAX - 1);
                let offset = rng.range(-bound, bound + 1);
                let shifted = if offset < 0 {
                    base.saturating_sub(offset.unsigned_abs())
                } else {
                    base.saturating_add(offset as u64)
                };
                Some(shifted.max(earliest))
            }
            NextExecPolicy::OneShot => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_period_still_advances() {
        let mut rng = SimRng::new(1);
        assert_eq!(NextExecPolicy::Periodic.next_exec(7, 0, &mut rng), Some(8));
    }

    #[test]
    fn test_jitter_stays_in_window() {
        let mut rng = SimRng::new(42);
        let policy = NextExecPolicy::Jittered { max_offset: 3 };
        for now in 0..200u64 {
            let next = policy.next_exec(now, 10, &mut rng).unwrap();
            assert!(next >= now + 7 && next <= now + 13, "next {} for now {}", next, now);
        }
    }

    #[test]
    fn test_jitter_clamped_after_now() {
        let mut rng = SimRng::new(42);
        let policy = NextExecPolicy::Jittered { max_offset: 50 };
        for now in 0..200u64 {
            assert!(policy.next_exec(now, 1, &mut rng).unwrap() > now);
        }
    }

    #[test]
    fn test_jitter_reproducible() {
        let policy = NextExecPolicy::Jittered { max_offset: 4 };
        let mut a = SimRng::new(9);
        let mut b = SimRng::new(9);
        let xs: Vec<_> = (0..50).map(|t| policy.next_exec(t, 6, &mut a)).collect();
        let ys: Vec<_> = (0..50).map(|t| policy.next_exec(t, 6, &mut b)).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_zero_jitter_draws_nothing() {
        let mut rng = SimRng::new(5);
        let before = rng.state();
        NextExecPolicy::Jittered { max_offset: 0 }.next_exec(0, 3, &mut rng);
        assert_eq!(rng.state(), before);
    }
}
