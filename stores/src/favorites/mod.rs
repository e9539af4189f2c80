//! Favorites store: a newest-first set of favorited products.

pub mod reducer;
pub mod store;
pub mod types;

pub use reducer::{FavoritesEnvironment, FavoritesReducer};
pub use store::FavoritesStore;
pub use types::{
    DEFAULT_RECENT_LIMIT, FAVORITES_STORAGE_KEY, FavoriteEntry, FavoritesAction, FavoritesSnapshot,
    FavoritesSort, FavoritesState,
};
