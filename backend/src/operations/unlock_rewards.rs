//! Unlock validator rewards
//!
//! Counterpart of `LockValidatorRewards`: picks a random bonded validator with
//! locked rewards, unlocks them and re-enables auto-renewal. Running both
//! keeps a long simulation cycling instead of saturating at the lock bound.
//!
//! The guard mirrors the lock guard from below: stop when the locked ratio is
//! at or under `min_locked_ratio`, or when one more unlock would take it under.

use super::{
    first_shuffled_validator, GuardDecision, GuardedOperation, Operation, RecordContext,
    ValidatorTarget,
};
use crate::ledger::{ActionKind, LedgerClient, LedgerError};
use crate::models::counters::Counter;
use crate::models::ratio::RatioBps;
use crate::models::state::StateView;
use crate::models::validator::ValidatorFilter;
use crate::rng::SimRng;
use crate::scheduler::NextExecPolicy;

#[derive(Debug, Clone)]
pub struct UnlockValidatorRewards {
    min_locked_ratio: RatioBps,
}

impl UnlockValidatorRewards {
    pub const ID: &'static str = "UnlockValidatorRewardsOp";

    pub fn new(min_locked_ratio: RatioBps) -> Self {
        Self { min_locked_ratio }
    }

    pub fn operation(period: u64, min_locked_ratio: RatioBps) -> Operation {
        Operation::new(
            Self::ID,
            period,
            NextExecPolicy::Periodic,
            Self::new(min_locked_ratio),
        )
    }

    pub fn min_locked_ratio(&self) -> RatioBps {
        self.min_locked_ratio
    }
}

impl GuardedOperation for UnlockValidatorRewards {
    type Target = ValidatorTarget;

    fn check_input(&self, state: &StateView) -> GuardDecision {
        let ratio = state.locked_ratio(ValidatorFilter::bonded());
        if ratio.locked == 0 {
            return GuardDecision::Stop {
                reason: "no locked validators".to_string(),
            };
        }

        let projected = ratio.with_locked(ratio.locked - 1);
        if !ratio.exceeds(self.min_locked_ratio) || projected.below(self.min_locked_ratio) {
            return GuardDecision::Stop {
                reason: format!("locked ratio {} at min {}", ratio, self.min_locked_ratio),
            };
        }
        GuardDecision::Proceed
    }

    fn find_target(&self, state: &StateView, rng: &mut SimRng) -> Option<ValidatorTarget> {
        let candidates = state.get_validators(ValidatorFilter::bonded().with_locked_only());
        first_shuffled_validator(state, &candidates, rng, |v| v.rewards_locked())
    }

    fn handle(
        &self,
        ledger: &mut dyn LedgerClient,
        target: &ValidatorTarget,
    ) -> Result<(), LedgerError> {
        let validator = target.validator.address();
        ledger.submit_action(&target.account, validator, ActionKind::UnlockRewards)?;
        // a validator locked out of band may still have auto-renewal on
        if !target.validator.auto_renewal_enabled() {
            ledger.submit_action(&target.account, validator, ActionKind::EnableAutoRenewal)?;
        }
        Ok(())
    }

    fn post(
        &self,
        ctx: &mut RecordContext<'_, '_>,
        target: &ValidatorTarget,
    ) -> Result<String, LedgerError> {
        let refreshed = ctx.refresh_validator(target.validator.address())?;
        let renewal_enabled = refreshed.auto_renewal_enabled();

        ctx.increment(Counter::UnlockedRewards);
        if !target.validator.auto_renewal_enabled() && renewal_enabled {
            ctx.increment(Counter::EnabledAutoRenewals);
        }

        Ok(format!(
            "{} for {}",
            target.validator.address(),
            target.account.address()
        ))
    }
}
