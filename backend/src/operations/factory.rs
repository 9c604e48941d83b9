//! Operation configuration and factory
//!
//! Operations can be declared in a JSON config instead of constructed in
//! code. Each variant maps onto one concrete operation:
//!
//! ```json
//! { "type": "lock_validator_rewards", "period": 1, "max_locked_ratio_bps": 5000 }
//! ```

use super::{LockValidatorRewards, Operation, UnlockValidatorRewards};
use crate::core::time::Tick;
use crate::models::ratio::RatioBps;
use crate::scheduler::NextExecPolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OperationConfig {
    LockValidatorRewards {
        /// Registration name (defaults to `LockValidatorRewardsOp`)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        period: u64,
        max_locked_ratio_bps: RatioBps,
        #[serde(default)]
        next_exec: NextExecPolicy,
        #[serde(default)]
        start_tick: Tick,
    },

    UnlockValidatorRewards {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
        period: u64,
        min_locked_ratio_bps: RatioBps,
        #[serde(default)]
        next_exec: NextExecPolicy,
        #[serde(default)]
        start_tick: Tick,
    },
}

impl OperationConfig {
    /// Name the operation registers under
    pub fn name(&self) -> &str {
        match self {
            OperationConfig::LockValidatorRewards { name, .. } => {
                name.as_deref().unwrap_or(LockValidatorRewards::ID)
            }
            OperationConfig::UnlockValidatorRewards { name, .. } => {
                name.as_deref().unwrap_or(UnlockValidatorRewards::ID)
            }
        }
    }

    pub fn period(&self) -> u64 {
        match self {
            OperationConfig::LockValidatorRewards { period, .. }
            | OperationConfig::UnlockValidatorRewards { period, .. } => *period,
        }
    }

    pub fn next_exec(&self) -> &NextExecPolicy {
        match self {
            OperationConfig::LockValidatorRewards { next_exec, .. }
            | OperationConfig::UnlockValidatorRewards { next_exec, .. } => next_exec,
        }
    }
}

/// Instantiate a configured operation
pub fn build_operation(config: &OperationConfig) -> Operation {
    let name = config.name().to_string();
    match config {
        OperationConfig::LockValidatorRewards {
            period,
            max_locked_ratio_bps,
            next_exec,
            start_tick,
            ..
        } => Operation::new(
            name,
            *period,
            next_exec.clone(),
            LockValidatorRewards::new(*max_locked_ratio_bps),
        )
        .with_start_tick(*start_tick),
        OperationConfig::UnlockValidatorRewards {
            period,
            min_locked_ratio_bps,
            next_exec,
            start_tick,
            ..
        } => Operation::new(
            name,
            *period,
            next_exec.clone(),
            UnlockValidatorRewards::new(*min_locked_ratio_bps),
        )
        .with_start_tick(*start_tick),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_lock_config() {
        let config: OperationConfig = serde_json::from_str(
            r#"{ "type": "lock_validator_rewards", "period": 3, "max_locked_ratio_bps": 5000 }"#,
        )
        .unwrap();

        assert_eq!(config.name(), "LockValidatorRewardsOp");
        assert_eq!(config.period(), 3);
        assert_eq!(config.next_exec(), &NextExecPolicy::Periodic);

        let op = build_operation(&config);
        assert_eq!(op.id(), "LockValidatorRewardsOp");
        assert_eq!(op.start_tick(), 0);
    }

    #[test]
    fn test_parse_named_jittered_unlock_config() {
        let config: OperationConfig = serde_json::from_str(
            r#"{
                "type": "unlock_validator_rewards",
                "name": "slow-unlock",
                "period": 10,
                "min_locked_ratio_bps": 1000,
                "next_exec": { "kind": "jittered", "max_offset": 2 },
                "start_tick": 5
            }"#,
        )
        .unwrap();

        let op = build_operation(&config);
        assert_eq!(op.id(), "slow-unlock");
        assert_eq!(op.period(), 10);
        assert_eq!(op.start_tick(), 5);
        assert_eq!(op.next_exec_policy(), &NextExecPolicy::Jittered { max_offset: 2 });
    }

    #[test]
    fn test_out_of_range_ratio_rejected_at_parse() {
        let parsed = serde_json::from_str::<OperationConfig>(
            r#"{ "type": "lock_validator_rewards", "period": 1, "max_locked_ratio_bps": 12000 }"#,
        );
        assert!(parsed.is_err());
    }
}
