//! Execution contexts handed to operations
//!
//! `SimContext` is the simulator's mutable state borrowed for one execution.
//! Its fields are crate-private: operations only ever see the narrower views
//! the phase signatures grant them.

use crate::core::time::Tick;
use crate::ledger::{AccountSnapshot, ActionKind, LedgerClient, LedgerError, ValidatorSnapshot};
use crate::models::account::{Address, SimAccount};
use crate::models::counters::{Counter, Counters};
use crate::models::event::{Event, EventLog};
use crate::models::state::StateView;
use crate::models::validator::{SimValidator, ValidatorFilter};
use crate::rng::SimRng;

/// Everything one execution may read or (in the right phase) write
pub struct SimContext<'a> {
    pub(crate) tick: Tick,
    pub(crate) state: &'a mut StateView,
    pub(crate) ledger: &'a mut (dyn LedgerClient + 'a),
    pub(crate) rng: &'a mut SimRng,
    pub(crate) counters: &'a mut Counters,
    pub(crate) events: &'a mut EventLog,
}

impl<'a> SimContext<'a> {
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn state(&self) -> &StateView {
        &*self.state
    }

    pub fn counters(&self) -> &Counters {
        &*self.counters
    }

    pub(crate) fn record_selection(&mut self, operation: &str, target: &str) {
        self.events.log(Event::TargetSelected {
            tick: self.tick,
            operation: operation.to_string(),
            target: target.to_string(),
        });
    }

    /// Run the mutate phase against a ledger that logs every accepted call
    ///
    /// Accepted calls are logged even when a later call fails, so a partial
    /// mutation is visible in the event log.
    pub(crate) fn with_recording_ledger<F>(
        &mut self,
        operation: &str,
        f: F,
    ) -> Result<(), LedgerError>
    where
        F: FnOnce(&mut dyn LedgerClient) -> Result<(), LedgerError>,
    {
        let mut recorder = RecordingLedger {
            inner: &mut *self.ledger,
            accepted: Vec::new(),
        };
        let result = f(&mut recorder);

        for (signer, validator, action) in recorder.accepted {
            self.events.log(Event::ActionSubmitted {
                tick: self.tick,
                operation: operation.to_string(),
                signer,
                validator,
                action,
            });
        }
        result
    }

    pub(crate) fn record_context(&mut self) -> RecordContext<'_, 'a> {
        RecordContext {
            tick: self.tick,
            state: &mut *self.state,
            ledger: &*self.ledger,
            counters: &mut *self.counters,
            events: &mut *self.events,
        }
    }
}

/// What the record phase may touch
pub struct RecordContext<'b, 'a> {
    tick: Tick,
    state: &'b mut StateView,
    ledger: &'b (dyn LedgerClient + 'a),
    counters: &'b mut Counters,
    events: &'b mut EventLog,
}

impl<'b, 'a> RecordContext<'b, 'a> {
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn state(&self) -> &StateView {
        &*self.state
    }

    /// Re-read a validator from the ledger and store it in the state view
    pub fn refresh_validator(&mut self, address: &Address) -> Result<&SimValidator, LedgerError> {
        let snapshot = self
            .ledger
            .query_validator(address)
            .ok_or_else(|| LedgerError::UnknownValidator(address.clone()))?;

        self.events.log(Event::ValidatorRefreshed {
            tick: self.tick,
            validator: address.clone(),
            rewards_locked: snapshot.rewards_locked,
            auto_renewal: snapshot.auto_renewal,
        });

        if !self.state.update_validator(snapshot) {
            return Err(LedgerError::UnknownValidator(address.clone()));
        }
        self.state
            .validator(address)
            .ok_or_else(|| LedgerError::UnknownValidator(address.clone()))
    }

    pub fn increment(&mut self, counter: Counter) {
        self.counters.increment(counter);
    }
}

/// Pass-through ledger that remembers which calls were accepted
struct RecordingLedger<'r, 'l> {
    inner: &'r mut (dyn LedgerClient + 'l),
    accepted: Vec<(Address, Address, ActionKind)>,
}

impl LedgerClient for RecordingLedger<'_, '_> {
    fn submit_action(
        &mut self,
        signer: &SimAccount,
        validator: &Address,
        action: ActionKind,
    ) -> Result<ValidatorSnapshot, LedgerError> {
        let snapshot = self.inner.submit_action(signer, validator, action)?;
        self.accepted
            .push((signer.address().clone(), validator.clone(), action));
        Ok(snapshot)
    }

    fn query_validators(&self, filter: &ValidatorFilter) -> Vec<ValidatorSnapshot> {
        self.inner.query_validators(filter)
    }

    fn query_account(&self, address: &Address) -> Option<AccountSnapshot> {
        self.inner.query_account(address)
    }

    fn query_validator(&self, address: &Address) -> Option<ValidatorSnapshot> {
        self.inner.query_validator(address)
    }
}
