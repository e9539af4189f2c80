//! # Storefront Runtime
//!
//! Runtime for the storefront stores.
//!
//! This crate provides the Store runtime that coordinates reducer execution
//! and the durable mirror of each store's aggregate.
//!
//! ## Core Components
//!
//! - **Store**: Owns the state, runs the reducer and publishes a revision
//!   after every reduced action
//! - **`PersistedStore`**: A Store plus a versioned snapshot in a
//!   [`KeyValueStorage`](storefront_core::storage::KeyValueStorage), a
//!   one-way hydration phase and a debounced write-through persister
//! - **`FileStorage`**: Durable key-value storage on the local filesystem
//!
//! ## Example
//!
//! ```ignore
//! use storefront_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Send an action
//! store.send(Action::DoSomething).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use storefront_core::reducer::Reducer;
use tokio::sync::{RwLock, watch};

/// Durable key-value storage on the local filesystem
pub mod file_storage;

/// Versioned snapshots, hydration and debounced write-through
pub mod persist;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,
    }
}

pub use error::StoreError;
pub use file_storage::FileStorage;
pub use persist::{
    HydrationPhase, MigrationError, PersistConfig, PersistError, Persistable, PersistedStore,
    SnapshotEnvelope,
};
pub use store::Store;

/// Store module - The runtime for reducers
pub mod store {
    use super::{Arc, AtomicBool, Ordering, Reducer, RwLock, StoreError, watch};
    use std::marker::PhantomData;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; one reduction at a time)
    /// 2. Reducer (mutation logic)
    /// 3. Environment (injected dependencies)
    /// 4. A revision counter, bumped after every reduced action
    ///
    /// Cloning a Store is cheap and every clone shares the same state.
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    ///
    /// # Example
    ///
    /// ```ignore
    /// let store = Store::new(
    ///     CartState::default(),
    ///     CartReducer::new(),
    ///     CartEnvironment::new(Arc::new(SystemClock)),
    /// );
    ///
    /// store.send(CartAction::ClearCart).await?;
    /// ```
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: Arc<R>,
        environment: Arc<E>,
        shutdown: Arc<AtomicBool>,
        /// Revision feed observed by the persister.
        ///
        /// Starts at 0 and increases by one per reduced action.
        revision: Arc<watch::Sender<u64>>,
        _action: PhantomData<fn() -> A>,
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: Arc::clone(&self.reducer),
                environment: Arc::clone(&self.environment),
                shutdown: Arc::clone(&self.shutdown),
                revision: Arc::clone(&self.revision),
                _action: PhantomData,
            }
        }
    }

    impl<S, A, E, R> std::fmt::Debug for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.debug_struct("Store")
                .field("revision", &*self.revision.borrow())
                .field("shutdown", &self.shutdown.load(Ordering::Relaxed))
                .finish_non_exhaustive()
        }
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        ///
        /// # Arguments
        ///
        /// - `initial_state`: The starting state for the store
        /// - `reducer`: The reducer implementation (mutation logic)
        /// - `environment`: Injected dependencies
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            let (revision, _) = watch::channel(0);

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer: Arc::new(reducer),
                environment: Arc::new(environment),
                shutdown: Arc::new(AtomicBool::new(false)),
                revision: Arc::new(revision),
                _action: PhantomData,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Publishes the next revision
        ///
        /// The mutation is fully applied when this returns.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            self.send_and_inspect(action, |_| ()).await
        }

        /// Send an action and read the resulting state under the same lock
        ///
        /// No other action can be reduced between the mutation and `inspect`,
        /// so the value returned describes exactly this action's result.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        pub async fn send_and_inspect<F, T>(&self, action: A, inspect: F) -> Result<T, StoreError>
        where
            F: FnOnce(&S) -> T,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.actions.total").increment(1);

            let mut state = self.state.write().await;

            let span = tracing::debug_span!("reducer_execution");
            let _enter = span.enter();

            self.reducer.reduce(&mut state, action, &self.environment);
            self.revision.send_modify(|revision| *revision += 1);
            tracing::trace!(revision = *self.revision.borrow(), "Reducer completed");

            Ok(inspect(&state))
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let lines = store.state(|s| s.items.len()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&state)
        }

        /// Read state together with the revision it corresponds to
        ///
        /// The revision is read while the state lock is held, so the pair is
        /// consistent.
        pub async fn state_at_revision<F, T>(&self, f: F) -> (u64, T)
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            let revision = *self.revision.borrow();
            (revision, f(&state))
        }

        /// Current revision (number of actions reduced so far, plus forced bumps)
        #[must_use]
        pub fn revision(&self) -> u64 {
            *self.revision.borrow()
        }

        /// Subscribe to revision changes
        ///
        /// The receiver starts with the current revision marked as seen.
        #[must_use]
        pub fn subscribe_revisions(&self) -> watch::Receiver<u64> {
            self.revision.subscribe()
        }

        /// Mutate state outside the reducer.
        ///
        /// Used by hydration only. Does not publish a revision on its own.
        pub(crate) async fn replace_with<F>(&self, f: F)
        where
            F: FnOnce(&mut S),
        {
            let mut state = self.state.write().await;
            f(&mut state);
        }

        /// Publish a revision without reducing an action
        pub(crate) fn mark_changed(&self) {
            self.revision.send_modify(|revision| *revision += 1);
        }

        /// Stop accepting actions
        ///
        /// Every later [`Store::send`] fails with
        /// [`StoreError::ShutdownInProgress`]. Actions already reduced are
        /// unaffected.
        pub fn shutdown(&self) {
            if !self.shutdown.swap(true, Ordering::AcqRel) {
                tracing::info!(revision = self.revision(), "Store shut down");
            }
        }

        /// Returns `true` once [`Store::shutdown`] has been called
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.shutdown.load(Ordering::Acquire)
        }
    }
}
