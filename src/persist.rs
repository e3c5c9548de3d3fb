//! FormPersist - the persistence engine binding a form to a storage key.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use std::time::Duration;

use crate::debounce::Debouncer;
use crate::error::PersistError;
use crate::key::storage_key;
use crate::record::{epoch_millis, Record};
use crate::snapshot::{self, Snapshot};
use crate::source::{SetValueOpts, ValueSource};
use crate::storage::Storage;

type RestoredCallback = Box<dyn Fn(&Snapshot) + Send + Sync>;
type TimeoutCallback = Box<dyn Fn() + Send + Sync>;

/// Lifecycle phase of a binding.
///
/// An explicit state machine instead of loose booleans: a binding cannot be
/// restoring and saving at the same time by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Uninitialized,
    Restoring,
    Idle,
    Saving,
}

struct SessionState {
    phase: Phase,
    last_saved: Option<Snapshot>,
}

/// Resets the phase to Idle when a save exits, on every path.
struct SavingGuard<'a> {
    state: &'a Mutex<SessionState>,
}

impl Drop for SavingGuard<'_> {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            if state.phase == Phase::Saving {
                state.phase = Phase::Idle;
            }
        }
    }
}

struct Inner<S, V> {
    key: String,
    storage: S,
    source: V,
    exclude: HashSet<String>,
    timeout: Option<Duration>,
    restore_opts: SetValueOpts,
    on_data_restored: Option<RestoredCallback>,
    on_timeout: Option<TimeoutCallback>,
    debouncer: Debouncer,
    state: Mutex<SessionState>,
}

/// What a completed restore found.
#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    /// No record existed (or the binding was already initialized).
    Empty,
    /// A record was restored into the form.
    Applied(Snapshot),
    /// A record existed but was older than the configured timeout; it was
    /// deleted and nothing was written back into the form.
    Expired,
}

/// Binds a form to one storage key: restores persisted values once on init,
/// then mirrors change notifications into the store through change
/// detection and debouncing.
///
/// Clone-friendly via Arc: clones share one session state. Scheduled saves
/// hold only a weak handle, so dropping the last strong handle guarantees a
/// pending debounced save never fires.
pub struct FormPersist<S: Storage, V: ValueSource> {
    inner: Arc<Inner<S, V>>,
}

impl<S: Storage, V: ValueSource> Clone for FormPersist<S, V> {
    fn clone(&self) -> Self {
        FormPersist {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Non-owning handle to a binding. See [`FormPersist::downgrade`].
pub struct WeakFormPersist<S: Storage, V: ValueSource> {
    inner: Weak<Inner<S, V>>,
}

impl<S: Storage, V: ValueSource> Clone for WeakFormPersist<S, V> {
    fn clone(&self) -> Self {
        WeakFormPersist {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S: Storage, V: ValueSource> WeakFormPersist<S, V> {
    /// Upgrade to a strong handle if the binding is still alive.
    pub fn upgrade(&self) -> Option<FormPersist<S, V>> {
        self.inner.upgrade().map(|inner| FormPersist { inner })
    }
}

/// Builder for a [`FormPersist`] binding.
pub struct FormPersistBuilder<S, V> {
    name: String,
    storage: S,
    source: V,
    exclude: HashSet<String>,
    timeout: Option<Duration>,
    debounce: Duration,
    restore_opts: SetValueOpts,
    on_data_restored: Option<RestoredCallback>,
    on_timeout: Option<TimeoutCallback>,
}

impl<S: Storage, V: ValueSource> FormPersistBuilder<S, V> {
    /// Fields that are never written back into the form on restore and
    /// never persisted on save.
    pub fn with_exclude<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.exclude = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Maximum record age. Older records are discarded unread on restore,
    /// and saves stamp the record with the current time.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Quiet period for coalescing change notifications. Zero (the default)
    /// saves synchronously on every qualifying notification.
    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debounce = delay;
        self
    }

    /// How restored values are written back (validate/dirty/touch).
    pub fn with_restore_opts(mut self, opts: SetValueOpts) -> Self {
        self.restore_opts = opts;
        self
    }

    /// Callback invoked with the full restored snapshot, excluded fields
    /// included. Exclusion affects write-back only.
    pub fn on_data_restored<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Snapshot) + Send + Sync + 'static,
    {
        self.on_data_restored = Some(Box::new(callback));
        self
    }

    /// Callback invoked when a record is discarded as expired.
    pub fn on_timeout<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_timeout = Some(Box::new(callback));
        self
    }

    pub fn build(self) -> FormPersist<S, V> {
        FormPersist {
            inner: Arc::new(Inner {
                key: storage_key(&self.name),
                storage: self.storage,
                source: self.source,
                exclude: self.exclude,
                timeout: self.timeout,
                restore_opts: self.restore_opts,
                on_data_restored: self.on_data_restored,
                on_timeout: self.on_timeout,
                debouncer: Debouncer::new(self.debounce),
                state: Mutex::new(SessionState {
                    phase: Phase::Uninitialized,
                    last_saved: None,
                }),
            }),
        }
    }
}

impl<S, V> FormPersist<S, V>
where
    S: Storage + 'static,
    V: ValueSource + 'static,
{
    /// Start configuring a binding for the form named `name`.
    pub fn builder(
        name: impl Into<String>,
        storage: S,
        source: V,
    ) -> FormPersistBuilder<S, V> {
        FormPersistBuilder {
            name: name.into(),
            storage,
            source,
            exclude: HashSet::new(),
            timeout: None,
            debounce: Duration::ZERO,
            restore_opts: SetValueOpts::default(),
            on_data_restored: None,
            on_timeout: None,
        }
    }

    /// Restore persisted values into the form. Runs once per binding; later
    /// calls are no-ops returning [`RestoreOutcome::Empty`].
    ///
    /// A corrupt record is not applied and not deleted, but the binding is
    /// still marked initialized so saves are not blocked forever; the error
    /// surfaces to the caller. An adapter failure on the initial read leaves
    /// the binding uninitialized so `restore` may be retried.
    pub fn restore(&self) -> Result<RestoreOutcome, PersistError> {
        {
            let mut state = self.lock_state()?;
            if state.phase != Phase::Uninitialized {
                return Ok(RestoreOutcome::Empty);
            }
            state.phase = Phase::Restoring;
        }

        let raw = match self.inner.storage.get(&self.inner.key) {
            Ok(raw) => raw,
            Err(err) => {
                self.set_phase(Phase::Uninitialized)?;
                return Err(err);
            }
        };

        let raw = match raw {
            Some(raw) => raw,
            None => {
                self.set_phase(Phase::Idle)?;
                return Ok(RestoreOutcome::Empty);
            }
        };

        let record = match Record::parse(&raw) {
            Ok(record) => record,
            Err(err) => {
                self.set_phase(Phase::Idle)?;
                return Err(err);
            }
        };

        if let Some(timeout) = self.inner.timeout {
            if record.is_expired(timeout, epoch_millis()) {
                if let Some(on_timeout) = &self.inner.on_timeout {
                    on_timeout();
                }
                let removed = self.inner.storage.remove(&self.inner.key);
                self.set_phase(Phase::Idle)?;
                removed?;
                return Ok(RestoreOutcome::Expired);
            }
        }

        // Baseline for change detection. Captured before write-back so a
        // snapshot echoing the restored values is a no-op.
        {
            let mut state = self.lock_state()?;
            state.last_saved = Some(record.values.clone());
        }

        // The state lock is not held here: a value source that synchronously
        // feeds a change notification back into `values_changed` is filtered
        // by the Restoring phase instead of deadlocking.
        for (field, value) in &record.values {
            if self.inner.exclude.contains(field.as_str()) {
                continue;
            }
            self.inner
                .source
                .set_value(field, value.clone(), self.inner.restore_opts);
        }

        if let Some(on_data_restored) = &self.inner.on_data_restored {
            on_data_restored(&record.values);
        }

        self.set_phase(Phase::Idle)?;
        Ok(RestoreOutcome::Applied(record.values))
    }

    /// Notify the binding that the form's values changed.
    ///
    /// Dropped while restoring, before initialization, or while a save is
    /// in flight. With a zero debounce the save runs synchronously and an
    /// adapter failure propagates; with a positive debounce the save is
    /// scheduled (cancel-and-replace) and a failed write is retried
    /// naturally by the next notification.
    pub fn values_changed(&self, snapshot: Snapshot) -> Result<(), PersistError> {
        if self.lock_state()?.phase != Phase::Idle {
            return Ok(());
        }

        if self.inner.debouncer.is_immediate() {
            self.save_now(snapshot)?;
            return Ok(());
        }

        let weak = self.downgrade();
        self.inner.debouncer.call(move || {
            if let Some(persist) = weak.upgrade() {
                let _ = persist.save_now(snapshot);
            }
        });
        Ok(())
    }

    /// Delete the persisted record. Unconditional; does not reset the
    /// in-memory baseline, so a subsequent change identical to the last
    /// saved snapshot will not re-save.
    pub fn clear(&self) -> Result<(), PersistError> {
        self.inner.storage.remove(&self.inner.key)
    }

    /// Whether the one-time restore is currently running.
    pub fn is_restoring(&self) -> bool {
        self.phase_is(Phase::Restoring)
    }

    /// Whether a save is currently in flight.
    pub fn is_saving(&self) -> bool {
        self.phase_is(Phase::Saving)
    }

    /// Whether the restore phase has completed.
    pub fn is_initialized(&self) -> bool {
        self.inner
            .state
            .lock()
            .map(|state| matches!(state.phase, Phase::Idle | Phase::Saving))
            .unwrap_or(false)
    }

    /// The storage key this binding reads and writes.
    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Downgrade to a handle that does not keep the binding alive. Used for
    /// observer wiring so a registered listener cannot outlive-extend the
    /// binding or resurrect its pending saves.
    pub fn downgrade(&self) -> WeakFormPersist<S, V> {
        WeakFormPersist {
            inner: Arc::downgrade(&self.inner),
        }
    }

    fn save_now(&self, candidate: Snapshot) -> Result<bool, PersistError> {
        {
            let mut state = self.lock_state()?;
            // Not Idle covers an in-flight save (dropped, not queued) as
            // well as a timer firing during restore or after reset.
            if state.phase != Phase::Idle {
                return Ok(false);
            }
            state.phase = Phase::Saving;
        }
        let _guard = SavingGuard {
            state: &self.inner.state,
        };

        let to_persist = snapshot::without_fields(&candidate, &self.inner.exclude);
        if to_persist.is_empty() {
            return Ok(false);
        }

        {
            let state = self.lock_state()?;
            if !snapshot::is_changed(&to_persist, state.last_saved.as_ref()) {
                return Ok(false);
            }
        }

        let saved_at = self.inner.timeout.map(|_| epoch_millis());
        let raw = Record::encode(&to_persist, saved_at);

        // On failure the guard still clears the Saving phase, and the
        // baseline stays unchanged so the next change re-attempts the write.
        self.inner.storage.set(&self.inner.key, &raw)?;

        let mut state = self.lock_state()?;
        state.last_saved = Some(to_persist);
        Ok(true)
    }

    fn phase_is(&self, phase: Phase) -> bool {
        self.inner
            .state
            .lock()
            .map(|state| state.phase == phase)
            .unwrap_or(false)
    }

    fn set_phase(&self, phase: Phase) -> Result<(), PersistError> {
        self.lock_state()?.phase = phase;
        Ok(())
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, SessionState>, PersistError> {
        self.inner
            .state
            .lock()
            .map_err(|_| PersistError::LockPoisoned("session state"))
    }
}
