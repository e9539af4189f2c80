//! # Storefront Core
//!
//! Core traits and types shared by the storefront stores.
//!
//! The cart and favorites stores are built from the same small set of pieces:
//!
//! - **State**: the aggregate a store owns (cart lines, favorite entries)
//! - **Action**: every input a store accepts (add, remove, toggle, ...)
//! - **Reducer**: pure function `(State, Action, Environment) → State`
//! - **Environment**: injected dependencies such as the [`environment::Clock`]
//! - **Storage**: the durable key-value adapter snapshots are written to
//!
//! Mutation logic lives entirely in reducers, so it can be exercised without
//! any storage or runtime. Persistence is layered on by `storefront-runtime`.
//!
//! ## Example
//!
//! ```
//! use storefront_core::reducer::Reducer;
//!
//! #[derive(Clone, Debug, Default)]
//! struct BadgeState {
//!     count: u32,
//! }
//!
//! #[derive(Clone, Debug)]
//! enum BadgeAction {
//!     Bump,
//! }
//!
//! struct BadgeReducer;
//!
//! impl Reducer for BadgeReducer {
//!     type State = BadgeState;
//!     type Action = BadgeAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, state: &mut BadgeState, action: BadgeAction, _env: &()) {
//!         match action {
//!             BadgeAction::Bump => state.count += 1,
//!         }
//!     }
//! }
//!
//! let mut state = BadgeState::default();
//! BadgeReducer.reduce(&mut state, BadgeAction::Bump, &());
//! assert_eq!(state.count, 1);
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};

/// Durable key-value storage used to persist store snapshots
pub mod storage;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → State`
///
/// They contain all mutation logic and are deterministic and testable.
/// Persistence is not a reducer concern; the runtime observes revisions.
pub mod reducer {
    /// The Reducer trait - core abstraction for store mutations
    ///
    /// # Type Parameters
    ///
    /// - `State`: The aggregate this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for CartReducer {
    ///     type State = CartState;
    ///     type Action = CartAction;
    ///     type Environment = CartEnvironment;
    ///
    ///     fn reduce(&self, state: &mut CartState, action: CartAction, env: &CartEnvironment) {
    ///         match action {
    ///             CartAction::ClearCart => state.items.clear(),
    ///             _ => {}
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes
        ///
        /// Validates the action, then updates state in place. An action that
        /// fails validation leaves the state untouched.
        ///
        /// Each call applies fully before it returns; the runtime never
        /// interleaves two reductions on the same state.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        );
    }
}

/// Environment module - Dependency injection traits
///
/// External dependencies a reducer needs are abstracted behind traits and
/// injected via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Line items and favorite entries are stamped with `clock.now()` when
    /// they are created, and migrations use it to backfill missing stamps.
    ///
    /// # Examples
    ///
    /// ```
    /// use storefront_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let earlier = clock.now();
    /// assert!(clock.now() >= earlier);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
