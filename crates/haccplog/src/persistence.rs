//! Loading and saving the application state.
//!
//! [`Persistence`] maps the whole [`AppState`] to one key in a [`KvStore`].
//! [`DebouncedSaver`] sits in front of it and collapses bursts of edits into
//! a single deferred write.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::model::{seed, AppState, Records};
use crate::storage::KvStore;

/// Default key the state is stored under.
pub const DEFAULT_STATE_KEY: &str = "haccp_app_state";

/// Default debounce window for saves.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Reads and writes the full application state under one key.
#[derive(Debug)]
pub struct Persistence<S> {
    store: S,
    key: String,
}

impl<S: KvStore> Persistence<S> {
    /// Create a gateway over `store` using `key`.
    pub fn new(store: S, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Load the persisted state, falling back to defaults.
    ///
    /// Never fails: an unreadable store, invalid JSON, or a malformed field
    /// is logged and replaced by its default (seed configuration, no records).
    pub fn load(&self) -> AppState {
        let raw = match self.store.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                info!("No saved state found, starting from the default checklist");
                return AppState::default();
            }
            Err(e) => {
                error!("Failed to read saved state, using defaults: {e}");
                return AppState::default();
            }
        };

        let mut value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!("Saved state is not valid JSON, using defaults: {e}");
                return AppState::default();
            }
        };

        let config = take_field(&mut value, "config").unwrap_or_else(seed::default_items);
        let records = take_field::<Records>(&mut value, "records").unwrap_or_default();
        debug!(
            items = config.len(),
            records = records.len(),
            "Loaded saved state"
        );
        AppState::new(config, records)
    }

    /// Serialize and write `state` immediately.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::StorageFull`] if the store is out of space, or
    /// another error if serialization or the write fails.
    pub fn save(&self, state: &AppState) -> Result<usize> {
        let json = serde_json::to_string(state)?;
        self.store.put(&self.key, &json)?;
        debug!(bytes = json.len(), "Saved state");
        Ok(json.len())
    }
}

/// Pull one top-level field out of a loaded document, logging a bad shape.
fn take_field<T: serde::de::DeserializeOwned>(value: &mut Value, field: &str) -> Option<T> {
    let raw = value.get_mut(field).map(Value::take)?;
    match serde_json::from_value(raw) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Saved `{field}` is malformed, using the default: {e}");
            None
        }
    }
}

/// Result of one deferred write.
#[derive(Debug)]
pub enum SaveOutcome {
    /// The state was written.
    Saved {
        /// Size of the serialized state.
        bytes: usize,
    },
    /// The write failed; the in-memory state is unaffected.
    Failed(crate::Error),
}

/// Schedules saves after a quiet period, replacing any save still waiting.
///
/// Must be used from inside a tokio runtime.
#[derive(Debug)]
pub struct DebouncedSaver<S> {
    gateway: Arc<Persistence<S>>,
    delay: Duration,
    pending: Option<Pending>,
    outcomes: mpsc::UnboundedSender<SaveOutcome>,
}

#[derive(Debug)]
struct Pending {
    handle: JoinHandle<()>,
    state: Arc<AppState>,
}

impl<S: KvStore + 'static> DebouncedSaver<S> {
    /// Create a saver and the channel its outcomes are reported on.
    pub fn new(
        gateway: Arc<Persistence<S>>,
        delay: Duration,
    ) -> (Self, mpsc::UnboundedReceiver<SaveOutcome>) {
        let (outcomes, rx) = mpsc::unbounded_channel();
        (
            Self {
                gateway,
                delay,
                pending: None,
                outcomes,
            },
            rx,
        )
    }

    /// Save a snapshot of `state` once `delay` passes without another call.
    pub fn schedule(&mut self, state: &AppState) {
        if self.cancel() {
            debug!("Superseding pending save");
        }

        // One copy, shared with the timer task.
        let snapshot = Arc::new(state.clone());
        let task_state = Arc::clone(&snapshot);
        let gateway = Arc::clone(&self.gateway);
        let outcomes = self.outcomes.clone();
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let outcome = write(&gateway, &task_state);
            // Nobody listening is fine; the outcome was already logged.
            let _ = outcomes.send(outcome);
        });

        self.pending = Some(Pending {
            handle,
            state: snapshot,
        });
    }

    /// Drop the pending save, if any. Returns whether one was waiting.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) if !pending.handle.is_finished() => {
                pending.handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Whether a save is scheduled but not yet written.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|pending| !pending.handle.is_finished())
    }

    /// Write the pending snapshot now instead of waiting for the timer.
    ///
    /// Returns `Ok(None)` when nothing was pending.
    ///
    /// # Errors
    ///
    /// Returns the error from the write. A failed flush leaves nothing
    /// pending; the next [`schedule`](Self::schedule) retries.
    pub fn flush(&mut self) -> Result<Option<usize>> {
        let Some(pending) = self.pending.take() else {
            return Ok(None);
        };
        if pending.handle.is_finished() {
            return Ok(None);
        }
        pending.handle.abort();

        let bytes = self.gateway.save(&pending.state)?;
        let _ = self.outcomes.send(SaveOutcome::Saved { bytes });
        Ok(Some(bytes))
    }
}

impl<S> Drop for DebouncedSaver<S> {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.take() {
            if !pending.handle.is_finished() {
                warn!("Dropping saver with an unsaved change");
                pending.handle.abort();
            }
        }
    }
}

fn write<S: KvStore>(gateway: &Persistence<S>, state: &AppState) -> SaveOutcome {
    match gateway.save(state) {
        Ok(bytes) => SaveOutcome::Saved { bytes },
        Err(e) => {
            if e.is_storage_full() {
                warn!("Save rejected, storage is full: {e}");
            } else {
                error!("Save failed: {e}");
            }
            SaveOutcome::Failed(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CheckItem, DailyCheckResult, DayRecord, ItemType, Verdict};
    use crate::storage::MemoryStore;
    use crate::update::{apply_check_result, get_or_create, upsert_record};
    use chrono::NaiveDate;

    fn gateway(store: &MemoryStore) -> Persistence<MemoryStore> {
        Persistence::new(store.clone(), DEFAULT_STATE_KEY)
    }

    fn sample_state() -> AppState {
        let state = AppState::default();
        let date = NaiveDate::from_ymd_opt(2024, 7, 1).unwrap();
        let record = apply_check_result(
            &get_or_create(date, &state.records),
            DailyCheckResult::new("c1").with_result(Verdict::Yes),
        );
        AppState::new(state.config.clone(), upsert_record(&state.records, record))
    }

    #[test]
    fn test_load_empty_store_gives_defaults() {
        let store = MemoryStore::new();
        assert_eq!(gateway(&store).load(), AppState::default());
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        let gw = gateway(&store);
        let state = sample_state();

        let bytes = gw.save(&state).unwrap();
        assert!(bytes > 0);
        assert_eq!(gw.load(), state);
    }

    #[test]
    fn test_load_invalid_json_gives_defaults() {
        let store = MemoryStore::new();
        store.put(DEFAULT_STATE_KEY, "{this is not json").unwrap();
        assert_eq!(gateway(&store).load(), AppState::default());
    }

    #[test]
    fn test_load_missing_records_keeps_config() {
        let store = MemoryStore::new();
        let config = vec![CheckItem::new("x1", "cat", "only", ItemType::Boolean, 1)];
        let doc = serde_json::json!({ "config": config });
        store.put(DEFAULT_STATE_KEY, &doc.to_string()).unwrap();

        let state = gateway(&store).load();
        assert_eq!(state.config, config);
        assert!(state.records.is_empty());
    }

    #[test]
    fn test_load_malformed_config_falls_back_to_seed() {
        let store = MemoryStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        let record = DayRecord::new(date, chrono::Utc::now());
        let doc = serde_json::json!({
            "config": "not a list",
            "records": { "2024-01-02": record },
        });
        store.put(DEFAULT_STATE_KEY, &doc.to_string()).unwrap();

        let state = gateway(&store).load();
        assert_eq!(state.config, seed::default_items());
        assert_eq!(state.records.len(), 1);
    }

    #[test]
    fn test_load_non_object_gives_defaults() {
        let store = MemoryStore::new();
        store.put(DEFAULT_STATE_KEY, "[1, 2, 3]").unwrap();
        assert_eq!(gateway(&store).load(), AppState::default());
    }

    #[test]
    fn test_save_reports_storage_full() {
        let store = MemoryStore::with_capacity(16);
        let err = gateway(&store).save(&sample_state()).unwrap_err();
        assert!(err.is_storage_full());
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_collapses_rapid_schedules() {
        let store = MemoryStore::new();
        let (mut saver, mut rx) = DebouncedSaver::new(Arc::new(gateway(&store)), DEFAULT_DEBOUNCE);

        let mut state = AppState::default();
        for n in 0..5 {
            state.config[0].text = format!("edit {n}");
            saver.schedule(&state);
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(saver.is_pending());
        assert_eq!(store.writes(), 0);

        tokio::time::sleep(Duration::from_millis(600)).await;

        assert!(matches!(rx.recv().await, Some(SaveOutcome::Saved { .. })));
        assert_eq!(store.writes(), 1);
        assert!(!saver.is_pending());
        assert_eq!(gateway(&store).load().config[0].text, "edit 4");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_write() {
        let store = MemoryStore::new();
        let (mut saver, _rx) = DebouncedSaver::new(Arc::new(gateway(&store)), DEFAULT_DEBOUNCE);

        saver.schedule(&AppState::default());
        assert!(saver.cancel());
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert_eq!(store.writes(), 0);
        assert!(!saver.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_immediately() {
        let store = MemoryStore::new();
        let (mut saver, mut rx) = DebouncedSaver::new(Arc::new(gateway(&store)), DEFAULT_DEBOUNCE);

        saver.schedule(&sample_state());
        let bytes = saver.flush().unwrap();
        assert!(bytes.is_some());
        assert_eq!(store.writes(), 1);
        assert!(matches!(rx.recv().await, Some(SaveOutcome::Saved { .. })));

        // The aborted timer must not write a second time.
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(store.writes(), 1);
        assert_eq!(saver.flush().unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_the_scheduled_snapshot() {
        let store = MemoryStore::new();
        let (mut saver, _rx) = DebouncedSaver::new(Arc::new(gateway(&store)), DEFAULT_DEBOUNCE);

        let mut state = sample_state();
        saver.schedule(&state);
        let scheduled = state.clone();
        state.config[0].text = "edited after scheduling".to_string();

        saver.flush().unwrap();
        assert_eq!(gateway(&store).load(), scheduled);
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_save_is_reported_and_retried() {
        let store = MemoryStore::with_capacity(64);
        let (mut saver, mut rx) = DebouncedSaver::new(Arc::new(gateway(&store)), DEFAULT_DEBOUNCE);

        saver.schedule(&sample_state());
        tokio::time::sleep(Duration::from_secs(1)).await;
        match rx.recv().await {
            Some(SaveOutcome::Failed(e)) => assert!(e.is_storage_full()),
            other => panic!("expected a failed save, got {other:?}"),
        }

        // The saver keeps working after a failure.
        saver.schedule(&sample_state());
        assert!(saver.is_pending());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(matches!(rx.recv().await, Some(SaveOutcome::Failed(_))));
    }
}
