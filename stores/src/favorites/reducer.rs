//! Reducer logic for favorites.

use super::types::{FavoriteEntry, FavoritesAction, FavoritesState};
use crate::outcome::{NoOp, Outcome};
use std::collections::HashMap;
use std::sync::Arc;
use storefront_catalog::{Product, ProductId};
use storefront_core::{environment::Clock, reducer::Reducer};

/// Environment dependencies for the favorites reducer
#[derive(Clone)]
pub struct FavoritesEnvironment {
    /// Clock for stamping new entries
    pub clock: Arc<dyn Clock>,
}

impl FavoritesEnvironment {
    /// Creates a new `FavoritesEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

/// Reducer for the favorites aggregate
#[derive(Clone, Debug, Default)]
pub struct FavoritesReducer;

impl FavoritesReducer {
    /// Creates a new `FavoritesReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn add(state: &mut FavoritesState, product: Product, env: &FavoritesEnvironment) -> Outcome {
        if state.is_favorite(product.id) {
            return Outcome::Ignored {
                reason: NoOp::AlreadyFavorite(product.id),
            };
        }

        state.favorites.insert(
            0,
            FavoriteEntry {
                product,
                added_at: env.clock.now(),
            },
        );
        Outcome::Applied
    }

    fn remove(state: &mut FavoritesState, product_id: ProductId) -> Outcome {
        let before = state.favorites.len();
        state
            .favorites
            .retain(|entry| entry.product.id != product_id);

        if state.favorites.len() == before {
            Outcome::Ignored {
                reason: NoOp::NotFavorite(product_id),
            }
        } else {
            Outcome::Applied
        }
    }

    /// Rebuild in `product_ids` order. A repeated id keeps only its first
    /// position, so the list stays free of duplicates.
    fn reorder(state: &mut FavoritesState, product_ids: &[ProductId]) {
        let mut by_id: HashMap<ProductId, FavoriteEntry> = state
            .favorites
            .drain(..)
            .map(|entry| (entry.product.id, entry))
            .collect();

        state.favorites = product_ids
            .iter()
            .filter_map(|id| by_id.remove(id))
            .collect();
    }
}

impl Reducer for FavoritesReducer {
    type State = FavoritesState;
    type Action = FavoritesAction;
    type Environment = FavoritesEnvironment;

    fn reduce(&self, state: &mut Self::State, action: Self::Action, env: &Self::Environment) {
        let outcome = match action {
            FavoritesAction::AddToFavorites { product } => Self::add(state, product, env),
            FavoritesAction::RemoveFromFavorites { product_id } => Self::remove(state, product_id),
            FavoritesAction::ToggleFavorite { product } => {
                // One reduction covers both branches; no other action can
                // interleave between the check and the mutation.
                if state.is_favorite(product.id) {
                    Self::remove(state, product.id)
                } else {
                    Self::add(state, product, env)
                }
            },
            FavoritesAction::ClearFavorites => {
                state.favorites.clear();
                Outcome::Applied
            },
            FavoritesAction::ReorderFavorites { product_ids } => {
                Self::reorder(state, &product_ids);
                Outcome::Applied
            },
        };

        state.last_outcome = Some(outcome);
    }
}
