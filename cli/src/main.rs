//! `ledger-sim` - run a randomized operation simulation against the
//! in-memory ledger and print the run report as JSON.
//!
//! ```text
//! ledger-sim example-config > sim.json
//! RUST_LOG=debug ledger-sim run --config sim.json --validators 20
//! ```
//!
//! Exit codes: 0 clean run, 1 harness failure, 2 invariant violations.

use std::{fs, path::PathBuf, process::ExitCode};

use clap::{Parser, Subcommand};
use ledger_simulator_core::{
    ActionKind, InMemoryLedger, InvariantConfig, LedgerClient, NextExecPolicy, OperationConfig,
    RatioBps, RunReport, SimulationError, Simulator, SimulatorConfig, StopCondition,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "ledger-sim", version, about = "Randomized validator ledger simulator")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run a simulation
    Run {
        /// JSON simulator config
        #[arg(long)]
        config: PathBuf,

        /// Override the config's rng_seed
        #[arg(long)]
        seed: Option<u64>,

        /// Override the config's tick_budget
        #[arg(long)]
        ticks: Option<u64>,

        /// Bonded validators in the in-memory ledger
        #[arg(long, default_value_t = 10)]
        validators: usize,

        /// Validators whose rewards start locked
        #[arg(long, default_value_t = 0)]
        accounts_locked: usize,

        /// Stake per validator
        #[arg(long, default_value_t = 1_000)]
        stake: u64,
    },

    /// Print a sample config
    ExampleConfig,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            config,
            seed,
            ticks,
            validators,
            accounts_locked,
            stake,
        } => match run(config, seed, ticks, validators, accounts_locked, stake) {
            Ok(report) if report.violations.is_empty() => ExitCode::SUCCESS,
            Ok(_) => ExitCode::from(2),
            Err(err) => {
                error!(%err, "simulation failed");
                ExitCode::from(1)
            }
        },
        Command::ExampleConfig => match example_config().to_json_pretty() {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(err) => {
                error!(%err, "could not render example config");
                ExitCode::from(1)
            }
        },
    }
}

fn run(
    path: PathBuf,
    seed: Option<u64>,
    ticks: Option<u64>,
    validators: usize,
    accounts_locked: usize,
    stake: u64,
) -> Result<RunReport, SimulationError> {
    let json = fs::read_to_string(&path).map_err(|e| {
        SimulationError::InvalidConfig(format!("cannot read {}: {}", path.display(), e))
    })?;
    let mut config = SimulatorConfig::from_json_str(&json)?;
    if let Some(seed) = seed {
        config.rng_seed = seed;
    }
    if let Some(ticks) = ticks {
        config.tick_budget = Some(ticks);
    }
    config.validate()?;
    let budget = config.tick_budget.unwrap_or(100);

    let (mut ledger, accounts) = InMemoryLedger::with_bonded_population(validators, stake);
    for account in accounts.iter().take(accounts_locked) {
        for action in [ActionKind::LockRewards, ActionKind::DisableAutoRenewal] {
            ledger
                .submit_action(account, account.address(), action)
                .map_err(|e| SimulationError::InvalidConfig(format!("cannot pre-lock: {}", e)))?;
        }
    }

    info!(path = %path.display(), validators, accounts_locked, budget, "starting run");
    let mut sim = Simulator::new(config, ledger, accounts)?;
    let outcome = sim.run(StopCondition::Ticks(budget));

    // the report is printed even when the run halted
    let report = sim.report();
    print_report(&report)?;
    outcome.map(|_| report)
}

fn print_report(report: &RunReport) -> Result<(), SimulationError> {
    let json = serde_json::to_string_pretty(report)
        .map_err(|e| SimulationError::Serialization(e.to_string()))?;
    println!("{}", json);
    Ok(())
}

fn example_config() -> SimulatorConfig {
    let half = RatioBps::new(5_000).unwrap_or(RatioBps::ONE);
    let fifth = RatioBps::new(2_000).unwrap_or(RatioBps::ZERO);

    SimulatorConfig::new(42)
        .with_tick_budget(100)
        .with_operation(OperationConfig::LockValidatorRewards {
            name: None,
            period: 1,
            max_locked_ratio_bps: half,
            next_exec: NextExecPolicy::Periodic,
            start_tick: 0,
        })
        .with_operation(OperationConfig::UnlockValidatorRewards {
            name: None,
            period: 5,
            min_locked_ratio_bps: fifth,
            next_exec: NextExecPolicy::Jittered { max_offset: 2 },
            start_tick: 10,
        })
        .with_invariant(InvariantConfig::MaxLockedRatio { bps: half })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn example_config_validates() {
        let config = example_config();
        assert!(config.validate().is_ok());
        let json = config.to_json_pretty().unwrap();
        assert_eq!(SimulatorConfig::from_json_str(&json).unwrap(), config);
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::try_parse_from([
            "ledger-sim",
            "run",
            "--config",
            "sim.json",
            "--seed",
            "7",
            "--accounts-locked",
            "3",
        ])
        .unwrap();
        match cli.command {
            Command::Run {
                seed,
                accounts_locked,
                validators,
                ..
            } => {
                assert_eq!(seed, Some(7));
                assert_eq!(accounts_locked, 3);
                assert_eq!(validators, 10);
            }
            Command::ExampleConfig => panic!("expected run"),
        }
    }
}
