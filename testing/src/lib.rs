//! # Storefront Testing
//!
//! Testing utilities and helpers for the storefront stores.
//!
//! This crate provides:
//! - Mock implementations of Environment traits (`FixedClock`, `ManualClock`)
//! - `InMemoryStorage`, a key-value backend with failure injection
//! - `ReducerTest`, a Given-When-Then harness for reducers
//! - Product fixtures and proptest strategies
//!
//! ## Example
//!
//! ```ignore
//! use storefront_testing::{fixtures, test_clock, InMemoryStorage};
//!
//! #[tokio::test(start_paused = true)]
//! async fn test_cart_is_written_through() {
//!     let storage = InMemoryStorage::new();
//!     let cart = CartStore::new(Arc::new(storage.clone()), Arc::new(test_clock()));
//!     cart.hydrate().await;
//!
//!     cart.add_item(fixtures::discounted(1, dec!(100), dec!(20)), 3).await;
//!
//!     assert!(storage.wait_for_writes(1, Duration::from_secs(5)).await);
//! }
//! ```

use chrono::{DateTime, Utc};
use storefront_core::environment::Clock;

pub mod storage;

pub use reducer_test::ReducerTest;
pub use storage::InMemoryStorage;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use std::sync::{Arc, PoisonError, RwLock};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use storefront_testing::mocks::FixedClock;
    /// use storefront_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(test_epoch())
    }

    /// The instant [`test_clock`] is frozen at
    ///
    /// # Panics
    ///
    /// Never in practice; the timestamp is a constant.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_epoch() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
            .expect("hardcoded timestamp should always parse")
            .with_timezone(&Utc)
    }

    /// Clock that only moves when told to
    ///
    /// Clones share the same time, so a test can keep one handle and give
    /// another to the store.
    #[derive(Debug, Clone)]
    pub struct ManualClock {
        time: Arc<RwLock<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock starting at `time`
        #[must_use]
        pub fn new(time: DateTime<Utc>) -> Self {
            Self {
                time: Arc::new(RwLock::new(time)),
            }
        }

        /// Move the clock forward
        pub fn advance(&self, by: chrono::Duration) {
            let mut time = self.time.write().unwrap_or_else(PoisonError::into_inner);
            *time += by;
        }

        /// Jump to an absolute time
        pub fn set(&self, to: DateTime<Utc>) {
            *self.time.write().unwrap_or_else(PoisonError::into_inner) = to;
        }
    }

    impl Default for ManualClock {
        fn default() -> Self {
            Self::new(test_epoch())
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.time.read().unwrap_or_else(PoisonError::into_inner)
        }
    }
}

/// Product fixtures.
pub mod fixtures {
    use rust_decimal::Decimal;
    use storefront_catalog::Product;

    /// A plain product priced at `price`
    #[must_use]
    pub fn product(id: u64, price: Decimal) -> Product {
        Product::new(id, format!("Product {id}"), price).with_stock(10)
    }

    /// A product with a discount
    #[must_use]
    pub fn discounted(id: u64, price: Decimal, discount_percentage: Decimal) -> Product {
        product(id, price).with_discount(discount_percentage)
    }

    /// A product with the descriptive fields filled in
    #[must_use]
    pub fn named(id: u64, title: &str, brand: &str, category: &str, price: Decimal) -> Product {
        Product::new(id, title, price)
            .with_brand(brand)
            .with_category(category)
            .with_stock(10)
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use storefront_catalog::Product;

    /// Product ids drawn from a small range so collisions are common
    pub fn product_id() -> impl Strategy<Value = u64> {
        1u64..=8
    }

    /// Prices with two decimal places, `0.00..=9999.99`
    pub fn price() -> impl Strategy<Value = Decimal> {
        (0i64..1_000_000).prop_map(|cents| Decimal::new(cents, 2))
    }

    /// Discounts with two decimal places, `0.00..=100.00`
    pub fn discount() -> impl Strategy<Value = Decimal> {
        (0i64..=10_000).prop_map(|hundredths| Decimal::new(hundredths, 2))
    }

    /// Valid products
    pub fn product() -> impl Strategy<Value = Product> {
        (product_id(), price(), discount()).prop_map(|(id, price, discount)| {
            Product::new(id, format!("Product {id}"), price).with_discount(discount)
        })
    }

    /// Quantities accepted by `add_item`
    pub fn quantity() -> impl Strategy<Value = u32> {
        1u32..=20
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, test_epoch, FixedClock, ManualClock};
