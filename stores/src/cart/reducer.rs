//! Reducer logic for the cart.
//!
//! Each action is validated first. Invalid input leaves the lines untouched
//! and records a [`Rejection`]; actions with nothing to act on record a
//! [`NoOp`]. Persistence observes the store from the outside.

use super::types::{CartAction, CartLineItem, CartState};
use crate::outcome::{NoOp, Outcome, Rejection};
use rust_decimal::Decimal;
use std::sync::Arc;
use storefront_catalog::{Product, ProductId};
use storefront_core::{environment::Clock, reducer::Reducer};

/// Environment dependencies for the cart reducer
#[derive(Clone)]
pub struct CartEnvironment {
    /// Clock for stamping new lines
    pub clock: Arc<dyn Clock>,
}

impl CartEnvironment {
    /// Creates a new `CartEnvironment`
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

/// Reducer for the cart aggregate
#[derive(Clone, Debug, Default)]
pub struct CartReducer;

impl CartReducer {
    /// Creates a new `CartReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates an `AddItem` action, returning the resulting quantity of
    /// an existing line (if there is one)
    fn validate_add_item(
        state: &CartState,
        product: &Product,
        quantity: u32,
    ) -> Result<Option<u32>, Rejection> {
        if quantity == 0 {
            return Err(Rejection::ZeroQuantity(product.id));
        }
        product.validate()?;

        match state.line(product.id) {
            Some(line) => {
                let merged = line
                    .quantity
                    .checked_add(quantity)
                    .ok_or(Rejection::QuantityOverflow {
                        product_id: product.id,
                        max: u32::MAX,
                    })?;
                // A merged line keeps the product it was first added with.
                Self::validate_totals(state, &line.product, merged)?;
                Ok(Some(merged))
            },
            None => {
                Self::validate_totals(state, product, quantity)?;
                Ok(None)
            },
        }
    }

    /// Checks that `product` at `quantity`, together with every other line,
    /// still has a representable total
    fn validate_totals(state: &CartState, product: &Product, quantity: u32) -> Result<(), Rejection> {
        product
            .effective_price()
            .checked_mul(Decimal::from(quantity))
            .and_then(|line_total| {
                state
                    .items
                    .iter()
                    .filter(|item| item.product.id != product.id)
                    .try_fold(line_total, |total, item| total.checked_add(item.checked_line_total()?))
            })
            .map(|_| ())
            .ok_or(Rejection::TotalOverflow {
                product_id: product.id,
            })
    }

    fn add_item(state: &mut CartState, product: Product, quantity: u32, env: &CartEnvironment) -> Outcome {
        match Self::validate_add_item(state, &product, quantity) {
            Err(reason) => Outcome::Rejected { reason },
            Ok(Some(merged)) => {
                if let Some(line) = state.line_mut(product.id) {
                    line.quantity = merged;
                }
                Outcome::Applied
            },
            Ok(None) => {
                state.items.push(CartLineItem {
                    product,
                    quantity,
                    added_at: env.clock.now(),
                });
                Outcome::Applied
            },
        }
    }

    fn remove_item(state: &mut CartState, product_id: ProductId) -> Outcome {
        let before = state.items.len();
        state.items.retain(|item| item.product.id != product_id);

        if state.items.len() == before {
            Outcome::Ignored {
                reason: NoOp::NotInCart(product_id),
            }
        } else {
            Outcome::Applied
        }
    }

    fn update_quantity(state: &mut CartState, product_id: ProductId, quantity: i64) -> Outcome {
        if quantity <= 0 {
            return Self::remove_item(state, product_id);
        }

        let Ok(quantity) = u32::try_from(quantity) else {
            return Outcome::Rejected {
                reason: Rejection::QuantityOverflow {
                    product_id,
                    max: u32::MAX,
                },
            };
        };

        let Some(line) = state.line(product_id) else {
            return Outcome::Ignored {
                reason: NoOp::NotInCart(product_id),
            };
        };
        if let Err(reason) = Self::validate_totals(state, &line.product, quantity) {
            return Outcome::Rejected { reason };
        }

        if let Some(line) = state.line_mut(product_id) {
            line.quantity = quantity;
        }
        Outcome::Applied
    }
}

impl Reducer for CartReducer {
    type State = CartState;
    type Action = CartAction;
    type Environment = CartEnvironment;

    fn reduce(&self, state: &mut Self::State, action: Self::Action, env: &Self::Environment) {
        let outcome = match action {
            CartAction::AddItem { product, quantity } => Self::add_item(state, product, quantity, env),
            CartAction::RemoveItem { product_id } => Self::remove_item(state, product_id),
            CartAction::UpdateQuantity {
                product_id,
                quantity,
            } => Self::update_quantity(state, product_id, quantity),
            CartAction::ClearCart => {
                state.items.clear();
                Outcome::Applied
            },
        };

        state.last_outcome = Some(outcome);
    }
}
