//! Domain types for favorites.

use crate::outcome::{Outcome, TracksOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Reverse;
use std::collections::HashSet;
use storefront_catalog::{Product, ProductId};
use storefront_runtime::{MigrationError, Persistable};

/// Storage key favorites are persisted under
pub const FAVORITES_STORAGE_KEY: &str = "favorites-storage";

/// Number of entries [`FavoritesState::recently_added`] returns by default
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// A favorited product
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteEntry {
    /// The product as it was when favorited
    pub product: Product,
    /// When it was favorited
    pub added_at: DateTime<Utc>,
}

/// Orderings for [`FavoritesState::sorted`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FavoritesSort {
    /// Newest first
    #[default]
    Recent,
    /// Title, A to Z (case-insensitive)
    Name,
    /// Price, lowest first
    Price,
}

/// State of the favorites aggregate
///
/// Newest entries come first, and each product appears at most once.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FavoritesState {
    /// Entries, newest first unless explicitly reordered
    pub favorites: Vec<FavoriteEntry>,
    /// Outcome of the most recent mutation (not persisted)
    pub last_outcome: Option<Outcome>,
}

impl FavoritesState {
    /// Creates an empty favorites list
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the product is a favorite
    #[must_use]
    pub fn is_favorite(&self, product_id: ProductId) -> bool {
        self.favorites
            .iter()
            .any(|entry| entry.product.id == product_id)
    }

    /// Number of favorites
    #[must_use]
    pub fn count(&self) -> usize {
        self.favorites.len()
    }

    /// Favorited products in stored order, without metadata
    #[must_use]
    pub fn products(&self) -> Vec<Product> {
        self.favorites
            .iter()
            .map(|entry| entry.product.clone())
            .collect()
    }

    /// The `limit` most recently added entries, newest first
    ///
    /// Sorts a copy; the stored order is untouched.
    #[must_use]
    pub fn recently_added(&self, limit: usize) -> Vec<FavoriteEntry> {
        let mut entries = self.sorted(FavoritesSort::Recent);
        entries.truncate(limit);
        entries
    }

    /// Entries whose title, brand or category contains `query`
    /// (case-insensitive), in stored order. A blank query matches everything.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<FavoriteEntry> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.favorites.clone();
        }

        self.favorites
            .iter()
            .filter(|entry| {
                let product = &entry.product;
                product.title.to_lowercase().contains(&needle)
                    || product
                        .brand
                        .as_deref()
                        .is_some_and(|brand| brand.to_lowercase().contains(&needle))
                    || product.category.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect()
    }

    /// A copy of the entries in the requested order
    #[must_use]
    pub fn sorted(&self, sort: FavoritesSort) -> Vec<FavoriteEntry> {
        let mut entries = self.favorites.clone();
        match sort {
            FavoritesSort::Recent => entries.sort_by_key(|entry| Reverse(entry.added_at)),
            FavoritesSort::Name => entries.sort_by_cached_key(|entry| entry.product.title.to_lowercase()),
            FavoritesSort::Price => entries.sort_by_key(|entry| entry.product.price),
        }
        entries
    }
}

impl TracksOutcome for FavoritesState {
    fn last_outcome(&self) -> Option<&Outcome> {
        self.last_outcome.as_ref()
    }
}

/// Persisted form of the favorites
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FavoritesSnapshot {
    /// Entries in stored order
    pub favorites: Vec<FavoriteEntry>,
}

impl Persistable for FavoritesState {
    type Snapshot = FavoritesSnapshot;

    const VERSION: u32 = 1;

    fn snapshot(&self) -> FavoritesSnapshot {
        FavoritesSnapshot {
            favorites: self.favorites.clone(),
        }
    }

    fn restore(&mut self, snapshot: FavoritesSnapshot) {
        let mut seen = HashSet::new();
        let before = snapshot.favorites.len();

        self.favorites = snapshot
            .favorites
            .into_iter()
            .filter(|entry| seen.insert(entry.product.id))
            .collect();

        if self.favorites.len() != before {
            tracing::warn!(
                dropped = before - self.favorites.len(),
                "Dropped duplicate entries from persisted favorites"
            );
        }
    }

    fn migrate(state: Value, from_version: u32, now: DateTime<Utc>) -> Result<Value, MigrationError> {
        if from_version != 0 {
            return Err(MigrationError::UnsupportedVersion {
                found: from_version,
                current: Self::VERSION,
            });
        }

        let Value::Object(mut state) = state else {
            return Err(MigrationError::InvalidShape(
                "favorites state is not an object".to_string(),
            ));
        };

        if let Some(favorites) = state.get_mut("favorites") {
            let Value::Array(entries) = favorites else {
                return Err(MigrationError::InvalidShape(
                    "favorites is not an array".to_string(),
                ));
            };
            for entry in entries {
                let Value::Object(entry) = entry else {
                    return Err(MigrationError::InvalidShape(
                        "favorite entry is not an object".to_string(),
                    ));
                };
                if !matches!(entry.get("addedAt"), Some(Value::String(stamp)) if !stamp.is_empty()) {
                    entry.insert("addedAt".to_string(), Value::String(now.to_rfc3339()));
                }
            }
        }

        Ok(Value::Object(state))
    }
}

/// Actions the favorites reducer accepts
#[derive(Clone, Debug, PartialEq)]
pub enum FavoritesAction {
    /// Prepend a product unless it is already a favorite
    AddToFavorites {
        /// Product to favorite
        product: Product,
    },

    /// Remove a product
    RemoveFromFavorites {
        /// Product to remove
        product_id: ProductId,
    },

    /// Remove the product if present, otherwise add it
    ToggleFavorite {
        /// Product to toggle
        product: Product,
    },

    /// Remove every entry
    ClearFavorites,

    /// Rebuild the list in the given order
    ///
    /// Entries missing from `product_ids` are dropped; ids without an entry
    /// are skipped. This is a user-driven reordering.
    ReorderFavorites {
        /// Desired order
        product_ids: Vec<ProductId>,
    },
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;
    use storefront_testing::{fixtures, test_epoch};

    fn entry(product: Product, minutes_ago: i64) -> FavoriteEntry {
        FavoriteEntry {
            product,
            added_at: test_epoch() - chrono::Duration::minutes(minutes_ago),
        }
    }

    fn sample() -> FavoritesState {
        FavoritesState {
            favorites: vec![
                entry(fixtures::named(3, "Mascara", "Essence", "beauty", dec!(9.99)), 30),
                entry(fixtures::named(1, "iPhone 9", "Apple", "smartphones", dec!(549)), 10),
                entry(fixtures::named(2, "apple watch", "Apple", "accessories", dec!(199)), 20),
            ],
            last_outcome: None,
        }
    }

    fn ids(entries: &[FavoriteEntry]) -> Vec<u64> {
        entries.iter().map(|entry| entry.product.id.get()).collect()
    }

    #[test]
    fn test_queries() {
        let state = sample();
        assert!(state.is_favorite(ProductId::new(2)));
        assert!(!state.is_favorite(ProductId::new(4)));
        assert_eq!(state.count(), 3);
        assert_eq!(state.products()[0].title, "Mascara");
    }

    #[test]
    fn test_recently_added_sorts_a_copy() {
        let state = sample();

        assert_eq!(ids(&state.recently_added(2)), vec![1, 2]);
        assert_eq!(ids(&state.recently_added(DEFAULT_RECENT_LIMIT)), vec![1, 2, 3]);
        assert_eq!(ids(&state.favorites), vec![3, 1, 2]);
    }

    #[test]
    fn test_search() {
        let state = sample();

        assert_eq!(ids(&state.search("apple")), vec![1, 2]);
        assert_eq!(ids(&state.search("BEAUTY")), vec![3]);
        assert_eq!(ids(&state.search("watch")), vec![2]);
        assert_eq!(ids(&state.search("  ")), vec![3, 1, 2]);
        assert!(state.search("laptop").is_empty());
    }

    #[test]
    fn test_sorted() {
        let state = sample();

        assert_eq!(ids(&state.sorted(FavoritesSort::Recent)), vec![1, 2, 3]);
        assert_eq!(ids(&state.sorted(FavoritesSort::Name)), vec![2, 1, 3]);
        assert_eq!(ids(&state.sorted(FavoritesSort::Price)), vec![3, 2, 1]);
        assert_eq!(ids(&state.favorites), vec![3, 1, 2]);
    }

    #[test]
    fn test_migrate_v0_backfills_added_at() {
        let now = test_epoch();
        let migrated = FavoritesState::migrate(
            json!({"favorites": [
                {"product": {"id": 1, "title": "Lamp"}},
                {"product": {"id": 2}, "addedAt": "2024-06-01T12:00:00Z"}
            ]}),
            0,
            now,
        )
        .unwrap();

        let snapshot: FavoritesSnapshot = serde_json::from_value(migrated).unwrap();
        assert_eq!(snapshot.favorites[0].added_at, now);
        assert_eq!(snapshot.favorites[0].product.title, "Lamp");
        assert_eq!(snapshot.favorites[1].added_at.to_rfc3339(), "2024-06-01T12:00:00+00:00");
    }

    #[test]
    fn test_restore_drops_duplicates() {
        let mut state = FavoritesState::new();
        state.restore(FavoritesSnapshot {
            favorites: vec![
                entry(fixtures::product(1, dec!(1)), 1),
                entry(fixtures::product(1, dec!(2)), 2),
                entry(fixtures::product(2, dec!(3)), 3),
            ],
        });

        assert_eq!(ids(&state.favorites), vec![1, 2]);
        assert_eq!(state.favorites[0].product.price, dec!(1));
    }
}
