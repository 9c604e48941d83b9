//! Lock validator rewards
//!
//! Picks a random bonded validator whose rewards are not locked, locks its
//! rewards and disables auto-renewal if it is still on.
//!
//! # Guard
//!
//! Stops when the bonded locked ratio is already at or over
//! `max_locked_ratio`, or when one more lock would push it over. The second
//! check keeps the ratio within bounds for populations where the bound is not
//! a multiple of `1/total`; with 10 validators and a 50% bound both checks
//! agree and the fifth lock is the last.

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
pub struct LockValidatorRewards {
    max_locked_ratio: RatioBps,
}

impl LockValidatorRewards {
    pub const ID: &'static str = "LockValidatorRewardsOp";

    pub fn new(max_locked_ratio: RatioBps) -> Self {
        Self { max_locked_ratio }
    }

    /// Periodic operation registered under `ID`
    pub fn operation(period: u64, max_locked_ratio: RatioBps) -> Operation {
        Operation::new(
            Self::ID,
            period,
            NextExecPolicy::Periodic,
            Self::new(max_locked_ratio),
        )
    }

    pub fn max_locked_ratio(&self) -> RatioBps {
        self.max_locked_ratio
    }

    fn population() -> ValidatorFilter {
        ValidatorFilter::bonded()
    }
}

impl GuardedOperation for LockValidatorRewards {
    type Target = ValidatorTarget;

    fn check_input(&self, state: &StateView) -> GuardDecision {
        let ratio = state.locked_ratio(Self::population());
        if ratio.total == 0 {
            return GuardDecision::Stop {
                reason: "no bonded validators".to_string(),
            };
        }

        let projected = ratio.with_locked(ratio.locked + 1);
        if !ratio.below(self.max_locked_ratio) || projected.exceeds(self.max_locked_ratio) {
            return GuardDecision::Stop {
                reason: format!(
                    "locked ratio {} at max {}",
                    ratio, self.max_locked_ratio
                ),
            };
        }
        GuardDecision::Proceed
    }

    fn find_target(&self, state: &StateView, rng: &mut SimRng) -> Option<ValidatorTarget> {
        let candidates = state.get_validators(Self::population());
        first_shuffled_validator(state, &candidates, rng, |v| !v.rewards_locked())
    }

    fn handle(
        &self,
        ledger: &mut dyn LedgerClient,
        target: &ValidatorTarget,
    ) -> Result<(), LedgerError> {
        let validator = target.validator.address();
        ledger.submit_action(&target.account, validator, ActionKind::LockRewards)?;
        if target.validator.auto_renewal_enabled() {
            ledger.submit_action(&target.account, validator, ActionKind::DisableAutoRenewal)?;
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

        ctx.increment(Counter::LockedRewards);
        if target.validator.auto_renewal_enabled() && !renewal_enabled {
            ctx.increment(Counter::DisabledAutoRenewals);
        }

        Ok(format!(
            "{} for {}",
            target.validator.address(),
            target.account.address()
        ))
    }
}
