//! The live application state and its save schedule.
//!
//! A [`Session`] owns the current [`AppState`]. Every edit computes a new
//! state from the old one with the pure functions in [`crate::update`] and
//! [`crate::settings`], swaps it in, and schedules a debounced save.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::Result;
use crate::model::{AppState, DailyCheckResult, DayRecord};
use crate::persistence::{DebouncedSaver, Persistence, SaveOutcome};
use crate::storage::KvStore;
use crate::update::{
    apply_check_result, apply_health_field, clear_check_result, get_or_create, progress,
    upsert_record, HealthField,
};

/// Current state plus the saver that persists it.
///
/// Must be used from inside a tokio runtime.
#[derive(Debug)]
pub struct Session<S> {
    state: AppState,
    saver: DebouncedSaver<S>,
    outcomes: mpsc::UnboundedReceiver<SaveOutcome>,
}

impl<S: KvStore + 'static> Session<S> {
    /// Load the saved state and start a session over it.
    pub fn open(persistence: Persistence<S>, debounce: Duration) -> Self {
        let state = persistence.load();
        let (saver, outcomes) = DebouncedSaver::new(Arc::new(persistence), debounce);
        info!(
            items = state.config.len(),
            records = state.records.len(),
            "Session opened"
        );
        Self {
            state,
            saver,
            outcomes,
        }
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Replace the state with `f(&state)` and schedule a save.
    pub fn apply<F>(&mut self, f: F)
    where
        F: FnOnce(&AppState) -> AppState,
    {
        self.state = f(&self.state);
        self.saver.schedule(&self.state);
    }

    /// Like [`apply`](Self::apply) for transitions that can be rejected.
    ///
    /// On error the state is left as it was and nothing is scheduled.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns.
    pub fn try_apply<F>(&mut self, f: F) -> Result<()>
    where
        F: FnOnce(&AppState) -> Result<AppState>,
    {
        let next = f(&self.state)?;
        self.state = next;
        self.saver.schedule(&self.state);
        Ok(())
    }

    /// The record for `date`, or the default one if nothing was entered yet.
    #[must_use]
    pub fn day(&self, date: NaiveDate) -> DayRecord {
        get_or_create(date, &self.state.records)
    }

    /// Completion percentage for `date`.
    #[must_use]
    pub fn progress(&self, date: NaiveDate) -> u8 {
        progress(&self.state.config, &self.day(date))
    }

    /// Store a check result for a configured item on `date`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::UnknownItem`] if the item is not configured.
    pub fn record_check(&mut self, date: NaiveDate, result: DailyCheckResult) -> Result<()> {
        self.try_apply(|state| {
            state.require_item(&result.item_id)?;
            let record = apply_check_result(&get_or_create(date, &state.records), result);
            Ok(AppState::new(state.config.clone(), upsert_record(&state.records, record)))
        })
    }

    /// Apply health field edits to `date` as one change.
    ///
    /// An empty set of edits changes nothing.
    pub fn record_health<I>(&mut self, date: NaiveDate, fields: I)
    where
        I: IntoIterator<Item = HealthField>,
    {
        let mut fields = fields.into_iter().peekable();
        if fields.peek().is_none() {
            debug!(%date, "No health fields to apply");
            return;
        }

        self.apply(|state| {
            let record = fields.fold(get_or_create(date, &state.records), |record, field| {
                apply_health_field(&record, field)
            });
            AppState::new(state.config.clone(), upsert_record(&state.records, record))
        });
    }

    /// Remove the result for `item_id` on `date`.
    ///
    /// Returns whether there was a result to remove. Results of items that
    /// were since deleted from the checklist can be cleared too.
    pub fn clear_check(&mut self, date: NaiveDate, item_id: &str) -> bool {
        let Some(record) = self.state.records.get(&date) else {
            return false;
        };
        if record.check(item_id).is_none() {
            return false;
        }

        let record = clear_check_result(record, item_id);
        self.apply(|state| {
            AppState::new(state.config.clone(), upsert_record(&state.records, record))
        });
        true
    }

    /// Replace the whole state, e.g. with an imported backup.
    pub fn replace_state(&mut self, state: AppState) {
        info!(
            items = state.config.len(),
            records = state.records.len(),
            "Replacing application state"
        );
        self.apply(|_| state);
    }

    /// Whether a change is waiting to be written.
    #[must_use]
    pub fn has_unsaved_changes(&self) -> bool {
        self.saver.is_pending()
    }

    /// Write any pending change now.
    ///
    /// # Errors
    ///
    /// Returns the error from the write, e.g. [`crate::Error::StorageFull`].
    pub fn flush(&mut self) -> Result<Option<usize>> {
        self.saver.flush()
    }

    /// Collect the save outcomes reported since the last call.
    pub fn drain_outcomes(&mut self) -> Vec<SaveOutcome> {
        let mut outcomes = Vec::new();
        while let Ok(outcome) = self.outcomes.try_recv() {
            outcomes.push(outcome);
        }
        outcomes
    }

    /// Wait for the next save outcome.
    pub async fn next_outcome(&mut self) -> Option<SaveOutcome> {
        self.outcomes.recv().await
    }
}
