//! The cart store handle used by the application.

use super::reducer::{CartEnvironment, CartReducer};
use super::types::{CART_STORAGE_KEY, CartAction, CartLineItem, CartState};
use crate::checkout::{CartSummary, CheckoutConfig};
use crate::outcome::{Outcome, dispatch};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use storefront_catalog::{Product, ProductId};
use storefront_core::environment::Clock;
use storefront_core::storage::KeyValueStorage;
use storefront_runtime::{HydrationPhase, PersistConfig, PersistError, PersistedStore, Store};

type CartRuntime = PersistedStore<CartState, CartAction, CartEnvironment, CartReducer>;

/// Persisted cart
///
/// Construct one at application start and share it by reference. Mutations
/// apply fully before they return; the write to storage follows after the
/// debounce interval.
///
/// # Example
///
/// ```ignore
/// let cart = CartStore::new(Arc::new(FileStorage::new(dir)), Arc::new(SystemClock));
/// cart.hydrate().await;
///
/// cart.add_item(product, 2).await;
/// println!("{} items, {}", cart.get_total_items().await, cart.get_total_price().await);
/// ```
#[derive(Debug)]
pub struct CartStore {
    inner: CartRuntime,
    checkout: CheckoutConfig,
}

impl CartStore {
    /// Cart persisted under `cart-storage` with the default debounce and
    /// checkout settings
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(
            storage,
            clock,
            PersistConfig::new(CART_STORAGE_KEY),
            CheckoutConfig::default(),
        )
    }

    /// Cart with explicit persistence and checkout settings
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn with_config(
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        persist: PersistConfig,
        checkout: CheckoutConfig,
    ) -> Self {
        let store = Store::new(
            CartState::new(),
            CartReducer::new(),
            CartEnvironment::new(Arc::clone(&clock)),
        );

        Self {
            inner: PersistedStore::new(store, storage, clock, persist),
            checkout,
        }
    }

    async fn dispatch(&self, operation: &'static str, action: CartAction) -> Outcome {
        dispatch(self.inner.store(), action, "cart", operation).await
    }

    // ========== Mutations ==========

    /// Add `quantity` units of `product`
    ///
    /// Increments an existing line, otherwise appends a new one stamped with
    /// the current time. A zero quantity or invalid pricing is rejected.
    pub async fn add_item(&self, product: Product, quantity: u32) -> Outcome {
        self.dispatch("add_item", CartAction::AddItem { product, quantity })
            .await
    }

    /// Remove a product's line; ignored if there is none
    pub async fn remove_item(&self, product_id: ProductId) -> Outcome {
        self.dispatch("remove_item", CartAction::RemoveItem { product_id })
            .await
    }

    /// Set a line's quantity exactly; `quantity <= 0` removes the line
    pub async fn update_quantity(&self, product_id: ProductId, quantity: i64) -> Outcome {
        self.dispatch(
            "update_quantity",
            CartAction::UpdateQuantity {
                product_id,
                quantity,
            },
        )
        .await
    }

    /// Remove every line
    pub async fn clear_cart(&self) -> Outcome {
        self.dispatch("clear_cart", CartAction::ClearCart).await
    }

    // ========== Queries ==========

    /// Σ quantity over all lines
    pub async fn get_total_items(&self) -> u64 {
        self.inner.store().state(CartState::total_items).await
    }

    /// Σ effective price × quantity over all lines
    pub async fn get_total_price(&self) -> Decimal {
        self.inner.store().state(CartState::total_price).await
    }

    /// Checkout totals with this store's shipping and tax settings
    pub async fn summary(&self) -> CartSummary {
        self.inner
            .store()
            .state(|state| state.summary(&self.checkout))
            .await
    }

    /// Copy of every line, in display order
    pub async fn items(&self) -> Vec<CartLineItem> {
        self.inner.store().state(|state| state.items.clone()).await
    }

    /// Copy of a product's line
    pub async fn line(&self, product_id: ProductId) -> Option<CartLineItem> {
        self.inner
            .store()
            .state(|state| state.line(product_id).cloned())
            .await
    }

    /// Units of a product in the cart
    pub async fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.inner
            .store()
            .state(|state| state.quantity_of(product_id))
            .await
    }

    /// Whether the product is in the cart
    pub async fn contains(&self, product_id: ProductId) -> bool {
        self.inner
            .store()
            .state(|state| state.contains(product_id))
            .await
    }

    /// Outcome of the most recent mutation
    pub async fn last_outcome(&self) -> Option<Outcome> {
        self.inner
            .store()
            .state(|state| state.last_outcome.clone())
            .await
    }

    /// Checkout settings in use
    #[must_use]
    pub const fn checkout_config(&self) -> &CheckoutConfig {
        &self.checkout
    }

    // ========== Lifecycle ==========

    /// Load the persisted cart; see [`PersistedStore::hydrate`]
    pub async fn hydrate(&self) {
        self.inner.hydrate().await;
    }

    /// Returns `true` once the persisted cart has been loaded
    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        self.inner.is_hydrated()
    }

    /// Current hydration phase
    #[must_use]
    pub fn phase(&self) -> HydrationPhase {
        self.inner.phase()
    }

    /// Wait until the persisted cart has been loaded
    pub async fn wait_until_hydrated(&self) {
        self.inner.wait_until_hydrated().await;
    }

    /// Write the cart to storage now
    ///
    /// # Errors
    ///
    /// Returns a [`PersistError`] if the write fails.
    pub async fn flush(&self) -> Result<(), PersistError> {
        self.inner.flush().await
    }

    /// Stop accepting mutations and write the final state
    ///
    /// # Errors
    ///
    /// Returns a [`PersistError`] if the final write fails.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), PersistError> {
        self.inner.shutdown(timeout).await
    }
}
