//! Versioned snapshots, hydration and debounced write-through.
//!
//! A [`PersistedStore`] mirrors its aggregate into a [`KeyValueStorage`] under
//! one key, wrapped in a [`SnapshotEnvelope`]:
//!
//! ```json
//! { "version": 1, "state": { "items": [] } }
//! ```
//!
//! # Lifecycle
//!
//! 1. **Not hydrated**: the store starts with its in-memory default and
//!    accepts actions immediately. Nothing is written yet.
//! 2. [`PersistedStore::hydrate`] loads the envelope, migrates it forward if
//!    its version is older than [`Persistable::VERSION`], and restores it.
//!    Any failure leaves the default in place. Either way the phase moves to
//!    **hydrated**, once.
//! 3. **Hydrated**: every revision published by the store schedules a write.
//!    Writes are debounced: the snapshot is taken only after no new revision
//!    arrived for [`PersistConfig::debounce`]. A failed write is logged and
//!    dropped; the next revision schedules another one.
//!
//! Writes for one key are serialized. The debounced write and
//! [`PersistedStore::flush`] take the snapshot and hand it to storage under
//! the same lock, so an older snapshot can never land after a newer one.
//!
//! Persistence failures never reach callers of mutations. In-memory state is
//! the source of truth for the running process.

use crate::Store;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use storefront_core::environment::Clock;
use storefront_core::reducer::Reducer;
use storefront_core::storage::{KeyValueStorage, StorageError};
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;

/// Quiet period after the last mutation before a snapshot is written.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(3);

/// Errors raised while migrating an older snapshot into the current shape.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// The snapshot was written by a newer schema than this build understands.
    #[error("Unsupported snapshot version {found} (current schema is {current})")]
    UnsupportedVersion {
        /// Version found in the envelope
        found: u32,
        /// Version this build writes
        current: u32,
    },

    /// The snapshot does not have the shape its version promises.
    #[error("Invalid snapshot shape: {0}")]
    InvalidShape(String),
}

/// Errors from loading or writing a persisted snapshot.
#[derive(Error, Debug)]
pub enum PersistError {
    /// The storage adapter failed.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The snapshot could not be encoded or decoded.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The snapshot could not be migrated to the current version.
    #[error(transparent)]
    Migration(#[from] MigrationError),

    /// The final write did not finish within the shutdown grace period.
    #[error("Snapshot write did not finish within {0:?}")]
    FlushTimeout(Duration),
}

/// Aggregate state that can be mirrored into storage.
///
/// Only the [`Persistable::Snapshot`] is written; transient fields such as
/// the outcome of the last mutation stay in memory.
pub trait Persistable {
    /// Serialized form of the aggregate
    type Snapshot: Serialize + DeserializeOwned;

    /// Current schema version, written into every envelope
    const VERSION: u32;

    /// Capture the persisted part of the state
    fn snapshot(&self) -> Self::Snapshot;

    /// Replace the persisted part of the state with a loaded snapshot
    fn restore(&mut self, snapshot: Self::Snapshot);

    /// Transform a snapshot written at `from_version` into the current shape.
    ///
    /// Only called with `from_version < VERSION`. The default keeps the
    /// value unchanged.
    ///
    /// # Errors
    ///
    /// Returns a [`MigrationError`] if the old value cannot be upgraded.
    fn migrate(
        state: serde_json::Value,
        from_version: u32,
        now: DateTime<Utc>,
    ) -> Result<serde_json::Value, MigrationError> {
        let _ = (from_version, now);
        Ok(state)
    }
}

/// On-disk wrapper around a snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotEnvelope<T> {
    /// Schema version the state was written with
    pub version: u32,
    /// The aggregate snapshot
    pub state: T,
}

/// A snapshot decoded from storage, possibly migrated.
#[derive(Debug)]
pub struct LoadedSnapshot<T> {
    /// The snapshot in the current shape
    pub snapshot: T,
    /// Version it was stored with, when that differs from the current one
    pub migrated_from: Option<u32>,
}

/// Encode the persisted part of `state` into an envelope string.
///
/// # Errors
///
/// Returns [`PersistError::Serialization`] if the snapshot cannot be encoded.
pub fn encode_snapshot<S: Persistable>(state: &S) -> Result<String, PersistError> {
    let envelope = SnapshotEnvelope {
        version: S::VERSION,
        state: state.snapshot(),
    };
    Ok(serde_json::to_string(&envelope)?)
}

/// Decode an envelope string, migrating older versions forward.
///
/// # Errors
///
/// - [`PersistError::Serialization`] for malformed JSON or a state that does
///   not match the current snapshot shape
/// - [`PersistError::Migration`] for versions newer than
///   [`Persistable::VERSION`] or a failed migration
pub fn decode_snapshot<S: Persistable>(
    raw: &str,
    now: DateTime<Utc>,
) -> Result<LoadedSnapshot<S::Snapshot>, PersistError> {
    let envelope: SnapshotEnvelope<serde_json::Value> = serde_json::from_str(raw)?;

    if envelope.version > S::VERSION {
        return Err(MigrationError::UnsupportedVersion {
            found: envelope.version,
            current: S::VERSION,
        }
        .into());
    }

    let (state, migrated_from) = if envelope.version < S::VERSION {
        (
            S::migrate(envelope.state, envelope.version, now)?,
            Some(envelope.version),
        )
    } else {
        (envelope.state, None)
    };

    Ok(LoadedSnapshot {
        snapshot: serde_json::from_value(state)?,
        migrated_from,
    })
}

/// Persistence settings for one store.
///
/// # Example
///
/// ```
/// use std::time::Duration;
/// use storefront_runtime::PersistConfig;
///
/// let config = PersistConfig::new("cart-storage").with_debounce(Duration::from_millis(500));
/// assert_eq!(config.key, "cart-storage");
/// ```
#[derive(Debug, Clone)]
pub struct PersistConfig {
    /// Storage key the envelope is written under
    pub key: String,
    /// Quiet period before a write
    pub debounce: Duration,
}

impl PersistConfig {
    /// Create a config for `key` with the default debounce
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Set the debounce interval
    #[must_use]
    pub const fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Hydration phase of a [`PersistedStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationPhase {
    /// Persisted data has not been loaded yet; state is provisional
    NotHydrated,
    /// The load finished (successfully or by falling back to defaults)
    Hydrated,
}

/// Shared pieces the persister task and the store handle both need.
struct Mirror<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    store: Store<S, A, E, R>,
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    /// Highest revision known to be on disk
    written: AtomicU64,
    /// Held from snapshot to completed `set`
    write_lock: Mutex<()>,
}

impl<S, A, E, R> Mirror<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + 'static,
    S: Persistable + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    async fn write(&self) -> Result<(), PersistError> {
        let _serialized = self.write_lock.lock().await;
        // A write that finished while we waited may already cover this revision.
        if !self.is_dirty() {
            return Ok(());
        }

        let (revision, encoded) = self.store.state_at_revision(encode_snapshot::<S>).await;
        let encoded = encoded?;

        match self.storage.set(&self.key, encoded).await {
            Ok(()) => {
                self.written.fetch_max(revision, Ordering::AcqRel);
                metrics::counter!("store.persist.writes").increment(1);
                tracing::debug!(key = %self.key, revision, "Snapshot written");
                Ok(())
            },
            Err(error) => {
                metrics::counter!("store.persist.failures").increment(1);
                Err(error.into())
            },
        }
    }

    fn is_dirty(&self) -> bool {
        self.store.revision() > self.written.load(Ordering::Acquire)
    }
}

/// A [`Store`] whose aggregate is mirrored into durable storage.
///
/// Must be created inside a Tokio runtime: construction spawns the persister
/// task. Dropping the handle stops the task without a final write; call
/// [`PersistedStore::shutdown`] to flush first.
///
/// # Example
///
/// ```ignore
/// let cart = PersistedStore::new(
///     Store::new(CartState::default(), CartReducer::new(), env),
///     Arc::new(FileStorage::new(data_dir)),
///     Arc::new(SystemClock),
///     PersistConfig::new("cart-storage"),
/// );
///
/// cart.hydrate().await;
/// cart.store().send(CartAction::ClearCart).await?;
/// ```
pub struct PersistedStore<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    mirror: Arc<Mirror<S, A, E, R>>,
    clock: Arc<dyn Clock>,
    hydration_started: AtomicBool,
    hydrated: watch::Sender<bool>,
    persister: JoinHandle<()>,
}

impl<S, A, E, R> std::fmt::Debug for PersistedStore<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedStore")
            .field("key", &self.mirror.key)
            .field("store", &self.mirror.store)
            .field("hydrated", &*self.hydrated.borrow())
            .finish_non_exhaustive()
    }
}

impl<S, A, E, R> PersistedStore<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + 'static,
    S: Persistable + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    /// Wrap `store` and start its persister task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(
        store: Store<S, A, E, R>,
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        config: PersistConfig,
    ) -> Self {
        let (hydrated, hydrated_rx) = watch::channel(false);
        let revisions = store.subscribe_revisions();
        let written = AtomicU64::new(store.revision());

        let mirror = Arc::new(Mirror {
            store,
            storage,
            key: config.key,
            written,
            write_lock: Mutex::new(()),
        });

        let persister = tokio::spawn(run_persister(
            Arc::clone(&mirror),
            revisions,
            hydrated_rx,
            config.debounce,
        ));

        Self {
            mirror,
            clock,
            hydration_started: AtomicBool::new(false),
            hydrated,
            persister,
        }
    }

    /// The wrapped store
    #[must_use]
    pub fn store(&self) -> &Store<S, A, E, R> {
        &self.mirror.store
    }

    /// Storage key this store writes to
    #[must_use]
    pub fn key(&self) -> &str {
        &self.mirror.key
    }

    /// Current hydration phase
    #[must_use]
    pub fn phase(&self) -> HydrationPhase {
        if *self.hydrated.borrow() {
            HydrationPhase::Hydrated
        } else {
            HydrationPhase::NotHydrated
        }
    }

    /// Returns `true` once hydration has completed
    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        self.phase() == HydrationPhase::Hydrated
    }

    /// Wait until hydration has completed.
    pub async fn wait_until_hydrated(&self) {
        let mut rx = self.hydrated.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|hydrated| *hydrated).await;
    }

    /// Load the persisted snapshot into memory.
    ///
    /// Runs once per store; later calls wait for the first one to finish.
    /// Missing, unreadable, malformed or unsupported snapshots leave the
    /// current in-memory state untouched. The phase is `Hydrated` afterwards
    /// in every case.
    #[tracing::instrument(skip(self), fields(key = %self.mirror.key))]
    pub async fn hydrate(&self) {
        if self.hydration_started.swap(true, Ordering::AcqRel) {
            tracing::debug!("Hydration already started");
            self.wait_until_hydrated().await;
            return;
        }

        match self.load().await {
            Ok(Some(loaded)) => {
                let migrated_from = loaded.migrated_from;
                self.mirror
                    .store
                    .replace_with(|state| state.restore(loaded.snapshot))
                    .await;

                if let Some(from) = migrated_from {
                    tracing::info!(from, to = S::VERSION, "Migrated persisted snapshot");
                    // Write the upgraded shape back once hydrated.
                    self.mirror.store.mark_changed();
                }
                metrics::counter!("store.hydrate.restored").increment(1);
                tracing::debug!("Restored persisted snapshot");
            },
            Ok(None) => {
                metrics::counter!("store.hydrate.empty").increment(1);
                tracing::debug!("No persisted snapshot, starting from defaults");
            },
            Err(error) => {
                metrics::counter!("store.hydrate.failed").increment(1);
                tracing::warn!(%error, "Hydration failed, keeping in-memory defaults");
            },
        }

        self.hydrated.send_replace(true);
    }

    async fn load(&self) -> Result<Option<LoadedSnapshot<S::Snapshot>>, PersistError> {
        let Some(raw) = self.mirror.storage.get(&self.mirror.key).await? else {
            return Ok(None);
        };
        decode_snapshot::<S>(&raw, self.clock.now()).map(Some)
    }

    /// Write the current snapshot immediately, skipping the debounce.
    ///
    /// Does nothing before hydration, so defaults never overwrite a stored
    /// snapshot, and nothing when the latest revision is already on disk.
    /// If a debounced write is in flight, waits for it and then writes
    /// whatever it did not cover.
    ///
    /// # Errors
    ///
    /// Returns a [`PersistError`] if encoding or the storage write fails.
    #[tracing::instrument(skip(self), fields(key = %self.mirror.key))]
    pub async fn flush(&self) -> Result<(), PersistError> {
        if !self.is_hydrated() {
            tracing::debug!("Skipping flush before hydration");
            return Ok(());
        }
        if !self.mirror.is_dirty() {
            return Ok(());
        }
        self.mirror.write().await
    }

    /// Stop accepting actions and flush, waiting at most `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the flush error if the final write fails, or
    /// [`PersistError::FlushTimeout`] if it does not finish in time.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), PersistError> {
        self.mirror.store.shutdown();
        let result = match tokio::time::timeout(timeout, self.flush()).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!(key = %self.mirror.key, ?timeout, "Final snapshot write timed out");
                Err(PersistError::FlushTimeout(timeout))
            },
        };
        self.persister.abort();
        result
    }
}

impl<S, A, E, R> Drop for PersistedStore<S, A, E, R>
where
    R: Reducer<State = S, Action = A, Environment = E>,
{
    fn drop(&mut self) {
        self.persister.abort();
    }
}

/// Background write-through loop.
///
/// Waits for a revision, waits for hydration, then keeps waiting while new
/// revisions keep arriving inside the debounce window. Writes once the
/// window passes quietly.
async fn run_persister<S, A, E, R>(
    mirror: Arc<Mirror<S, A, E, R>>,
    mut revisions: watch::Receiver<u64>,
    mut hydrated: watch::Receiver<bool>,
    debounce: Duration,
) where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + 'static,
    S: Persistable + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    loop {
        if revisions.changed().await.is_err() {
            return;
        }
        if hydrated.wait_for(|hydrated| *hydrated).await.is_err() {
            return;
        }

        loop {
            match tokio::time::timeout(debounce, revisions.changed()).await {
                Ok(Ok(())) => {},
                Ok(Err(_)) | Err(_) => break,
            }
        }

        if let Err(error) = mirror.write().await {
            tracing::warn!(key = %mirror.key, %error, "Snapshot write failed, will retry on next change");
        }
    }
}
