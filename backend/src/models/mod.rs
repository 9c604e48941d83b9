//! Domain models for the simulated population

pub mod account;
pub mod counters;
pub mod event;
pub mod ratio;
pub mod state;
pub mod validator;

// Re-exports
pub use account::{Address, SigningKey, SimAccount};
pub use counters::{Counter, Counters};
pub use event::{Event, EventLog};
pub use ratio::{LockedRatio, RatioBps, RatioError, BPS_SCALE};
pub use state::{Accounts, StateError, StateView, Validators};
pub use validator::{SimValidator, ValidatorFilter, ValidatorStatus};
