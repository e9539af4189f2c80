//! The favorites store handle used by the application.

use super::reducer::{FavoritesEnvironment, FavoritesReducer};
use super::types::{
    DEFAULT_RECENT_LIMIT, FAVORITES_STORAGE_KEY, FavoriteEntry, FavoritesAction, FavoritesSort,
    FavoritesState,
};
use crate::outcome::{Outcome, dispatch};
use std::sync::Arc;
use std::time::Duration;
use storefront_catalog::{Product, ProductId};
use storefront_core::environment::Clock;
use storefront_core::storage::KeyValueStorage;
use storefront_runtime::{HydrationPhase, PersistConfig, PersistError, PersistedStore, Store};

type FavoritesRuntime =
    PersistedStore<FavoritesState, FavoritesAction, FavoritesEnvironment, FavoritesReducer>;

/// Persisted favorites list
#[derive(Debug)]
pub struct FavoritesStore {
    inner: FavoritesRuntime,
}

impl FavoritesStore {
    /// Favorites persisted under `favorites-storage` with the default debounce
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStorage>, clock: Arc<dyn Clock>) -> Self {
        Self::with_config(storage, clock, PersistConfig::new(FAVORITES_STORAGE_KEY))
    }

    /// Favorites with explicit persistence settings
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn with_config(
        storage: Arc<dyn KeyValueStorage>,
        clock: Arc<dyn Clock>,
        persist: PersistConfig,
    ) -> Self {
        let store = Store::new(
            FavoritesState::new(),
            FavoritesReducer::new(),
            FavoritesEnvironment::new(Arc::clone(&clock)),
        );

        Self {
            inner: PersistedStore::new(store, storage, clock, persist),
        }
    }

    async fn dispatch(&self, operation: &'static str, action: FavoritesAction) -> Outcome {
        dispatch(self.inner.store(), action, "favorites", operation).await
    }

    async fn read<T>(&self, f: impl FnOnce(&FavoritesState) -> T) -> T {
        self.inner.store().state(f).await
    }

    // ========== Mutations ==========

    /// Prepend `product`; ignored if it is already a favorite
    pub async fn add_to_favorites(&self, product: Product) -> Outcome {
        self.dispatch("add_to_favorites", FavoritesAction::AddToFavorites { product })
            .await
    }

    /// Remove a product; ignored if it is not a favorite
    pub async fn remove_from_favorites(&self, product_id: ProductId) -> Outcome {
        self.dispatch(
            "remove_from_favorites",
            FavoritesAction::RemoveFromFavorites { product_id },
        )
        .await
    }

    /// Remove `product` if it is a favorite, otherwise add it
    pub async fn toggle_favorite(&self, product: Product) -> Outcome {
        self.dispatch("toggle_favorite", FavoritesAction::ToggleFavorite { product })
            .await
    }

    /// Remove every favorite
    pub async fn clear_favorites(&self) -> Outcome {
        self.dispatch("clear_favorites", FavoritesAction::ClearFavorites)
            .await
    }

    /// Put the favorites in the order of `product_ids`
    ///
    /// Favorites not listed are removed; listed ids that are not favorites
    /// are skipped. Replaces the newest-first order with the given one.
    pub async fn reorder_favorites(&self, product_ids: Vec<ProductId>) -> Outcome {
        self.dispatch(
            "reorder_favorites",
            FavoritesAction::ReorderFavorites { product_ids },
        )
        .await
    }

    // ========== Queries ==========

    /// Whether the product is a favorite
    pub async fn is_favorite(&self, product_id: ProductId) -> bool {
        self.read(|state| state.is_favorite(product_id)).await
    }

    /// Number of favorites
    pub async fn get_favorites_count(&self) -> usize {
        self.read(FavoritesState::count).await
    }

    /// Favorited products in stored order
    pub async fn get_favorites(&self) -> Vec<Product> {
        self.read(FavoritesState::products).await
    }

    /// Full entries in stored order
    pub async fn entries(&self) -> Vec<FavoriteEntry> {
        self.read(|state| state.favorites.clone()).await
    }

    /// The `limit` most recently added entries (default 5), newest first
    pub async fn get_recently_added(&self, limit: Option<usize>) -> Vec<FavoriteEntry> {
        let limit = limit.unwrap_or(DEFAULT_RECENT_LIMIT);
        self.read(|state| state.recently_added(limit)).await
    }

    /// Entries matching `query` on title, brand or category
    pub async fn search(&self, query: &str) -> Vec<FavoriteEntry> {
        self.read(|state| state.search(query)).await
    }

    /// A sorted copy of the entries
    pub async fn sorted(&self, sort: FavoritesSort) -> Vec<FavoriteEntry> {
        self.read(|state| state.sorted(sort)).await
    }

    /// Outcome of the most recent mutation
    pub async fn last_outcome(&self) -> Option<Outcome> {
        self.read(|state| state.last_outcome.clone()).await
    }

    // ========== Lifecycle ==========

    /// Load the persisted favorites; see [`PersistedStore::hydrate`]
    pub async fn hydrate(&self) {
        self.inner.hydrate().await;
    }

    /// Returns `true` once the persisted favorites have been loaded
    #[must_use]
    pub fn is_hydrated(&self) -> bool {
        self.inner.is_hydrated()
    }

    /// Current hydration phase
    #[must_use]
    pub fn phase(&self) -> HydrationPhase {
        self.inner.phase()
    }

    /// Wait until the persisted favorites have been loaded
    pub async fn wait_until_hydrated(&self) {
        self.inner.wait_until_hydrated().await;
    }

    /// Write the favorites to storage now
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
