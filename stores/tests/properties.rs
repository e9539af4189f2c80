//! Property-based tests for the cart and favorites reducers

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use proptest::prelude::*;
use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use storefront_catalog::{Product, ProductId};
use storefront_core::reducer::Reducer;
use storefront_stores::cart::{CartEnvironment, CartReducer};
use storefront_stores::favorites::{FavoritesEnvironment, FavoritesReducer};
use storefront_stores::{CartAction, CartState, FavoritesAction, FavoritesState};
use storefront_testing::{properties, test_clock};

fn cart_env() -> CartEnvironment {
    CartEnvironment::new(Arc::new(test_clock()))
}

fn favorites_env() -> FavoritesEnvironment {
    FavoritesEnvironment::new(Arc::new(test_clock()))
}

fn cart_action() -> impl Strategy<Value = CartAction> {
    prop_oneof![
        4 => (properties::product(), properties::quantity())
            .prop_map(|(product, quantity)| CartAction::AddItem { product, quantity }),
        1 => properties::product_id().prop_map(|id| CartAction::RemoveItem {
            product_id: ProductId::new(id)
        }),
        2 => (properties::product_id(), -3i64..=30).prop_map(|(id, quantity)| {
            CartAction::UpdateQuantity {
                product_id: ProductId::new(id),
                quantity,
            }
        }),
        1 => Just(CartAction::ClearCart),
    ]
}

proptest! {
    #[test]
    fn repeated_adds_sum_quantities(adds in prop::collection::vec(
        (properties::product(), properties::quantity()),
        1..40,
    )) {
        let reducer = CartReducer::new();
        let env = cart_env();
        let mut state = CartState::new();
        let mut expected: HashMap<ProductId, u32> = HashMap::new();
        let mut first_seen: Vec<ProductId> = Vec::new();

        for (product, quantity) in adds {
            if !expected.contains_key(&product.id) {
                first_seen.push(product.id);
            }
            *expected.entry(product.id).or_default() += quantity;
            reducer.reduce(&mut state, CartAction::AddItem { product, quantity }, &env);
        }

        let order: Vec<ProductId> = state.items.iter().map(|line| line.product.id).collect();
        prop_assert_eq!(order, first_seen);
        for line in &state.items {
            prop_assert_eq!(line.quantity, expected[&line.product.id]);
        }
        prop_assert_eq!(
            state.total_items(),
            expected.values().map(|&q| u64::from(q)).sum::<u64>()
        );
    }

    #[test]
    fn cart_invariants_hold(actions in prop::collection::vec(cart_action(), 0..60)) {
        let reducer = CartReducer::new();
        let env = cart_env();
        let mut state = CartState::new();

        for action in actions {
            reducer.reduce(&mut state, action, &env);

            let mut seen = HashSet::new();
            for line in &state.items {
                prop_assert!(line.quantity > 0);
                prop_assert!(seen.insert(line.product.id), "duplicate line");
            }
            prop_assert!(state.total_price() >= Decimal::ZERO);
            prop_assert_eq!(
                state.total_items(),
                state.items.iter().map(|line| u64::from(line.quantity)).sum::<u64>()
            );
        }
    }

    #[test]
    fn toggling_twice_is_identity(
        initial in prop::collection::vec(properties::product(), 0..8),
        product in properties::product(),
    ) {
        let reducer = FavoritesReducer::new();
        let env = favorites_env();
        let mut state = FavoritesState::new();
        for existing in initial {
            reducer.reduce(&mut state, FavoritesAction::AddToFavorites { product: existing }, &env);
        }
        let before = state.favorites.clone();
        let was_favorite = state.is_favorite(product.id);

        let toggle = |product: Product| FavoritesAction::ToggleFavorite { product };
        reducer.reduce(&mut state, toggle(product.clone()), &env);
        reducer.reduce(&mut state, toggle(product), &env);

        if !was_favorite {
            prop_assert_eq!(&state.favorites, &before);
        }

        // A toggled-off entry comes back at the front, so only membership
        // is preserved.
        let ids = |entries: &[storefront_stores::FavoriteEntry]| -> HashSet<ProductId> {
            entries.iter().map(|entry| entry.product.id).collect()
        };
        prop_assert_eq!(ids(&state.favorites), ids(&before));
        prop_assert_eq!(state.favorites.len(), before.len());
    }

    #[test]
    fn favorites_never_hold_duplicates(
        actions in prop::collection::vec(
            (properties::product(), any::<bool>()),
            0..40,
        ),
    ) {
        let reducer = FavoritesReducer::new();
        let env = favorites_env();
        let mut state = FavoritesState::new();

        for (product, toggle) in actions {
            let action = if toggle {
                FavoritesAction::ToggleFavorite { product }
            } else {
                FavoritesAction::AddToFavorites { product }
            };
            reducer.reduce(&mut state, action, &env);

            let unique: HashSet<ProductId> =
                state.favorites.iter().map(|entry| entry.product.id).collect();
            prop_assert_eq!(unique.len(), state.favorites.len());
        }
    }
}
