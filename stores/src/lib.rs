//! # Storefront Stores
//!
//! Persisted client-side state for the storefront: the shopping cart and the
//! favorites list.
//!
//! Each store is a reducer running inside a
//! [`PersistedStore`](storefront_runtime::PersistedStore):
//!
//! - Mutations apply in memory immediately and report an [`Outcome`]
//! - The aggregate is mirrored into a
//!   [`KeyValueStorage`](storefront_core::storage::KeyValueStorage) as a
//!   versioned snapshot, written after a quiet period
//! - On startup each store hydrates once from its snapshot, migrating older
//!   versions and falling back to an empty aggregate on any failure
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use storefront_core::environment::SystemClock;
//! use storefront_runtime::FileStorage;
//! use storefront_stores::{CartStore, FavoritesStore};
//!
//! let storage = Arc::new(FileStorage::new(".storefront"));
//! let cart = CartStore::new(storage.clone(), Arc::new(SystemClock));
//! let favorites = FavoritesStore::new(storage, Arc::new(SystemClock));
//!
//! cart.hydrate().await;
//! favorites.hydrate().await;
//!
//! cart.add_item(product.clone(), 2).await;
//! favorites.toggle_favorite(product).await;
//! ```

pub mod cart;
pub mod checkout;
pub mod config;
pub mod currency;
pub mod favorites;
pub mod outcome;

pub use cart::{CART_STORAGE_KEY, CartAction, CartLineItem, CartState, CartStore};
pub use checkout::{CartSummary, CheckoutConfig};
pub use config::StorefrontConfig;
pub use currency::{Currency, format_currency};
pub use favorites::{
    FAVORITES_STORAGE_KEY, FavoriteEntry, FavoritesAction, FavoritesSort, FavoritesState,
    FavoritesStore,
};
pub use outcome::{NoOp, Outcome, Rejection};
