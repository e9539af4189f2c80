//! Domain types for the cart.

use crate::checkout::{CartSummary, CheckoutConfig};
use crate::outcome::{Outcome, TracksOutcome};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use storefront_catalog::{Product, ProductId};
use storefront_runtime::{MigrationError, Persistable};

/// Storage key the cart is persisted under
pub const CART_STORAGE_KEY: &str = "cart-storage";

/// One product's entry in the cart
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    /// The product as it was when first added
    pub product: Product,
    /// Units of the product, always at least 1
    pub quantity: u32,
    /// When the line was created
    pub added_at: DateTime<Utc>,
}

impl CartLineItem {
    /// Effective price × quantity
    ///
    /// Saturates at the `Decimal` bounds. The reducer never admits a line
    /// whose total does not fit.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product
            .effective_price()
            .saturating_mul(Decimal::from(self.quantity))
    }

    /// Effective price × quantity, `None` if it does not fit a `Decimal`
    #[must_use]
    pub fn checked_line_total(&self) -> Option<Decimal> {
        self.product
            .effective_price()
            .checked_mul(Decimal::from(self.quantity))
    }
}

/// State of the cart aggregate
///
/// Lines keep the order they were first added in. There is at most one line
/// per product id, and no line has a zero quantity.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CartState {
    /// Line items in display order
    pub items: Vec<CartLineItem>,
    /// Outcome of the most recent mutation (not persisted)
    pub last_outcome: Option<Outcome>,
}

impl CartState {
    /// Creates an empty cart
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Line for a product, if any
    #[must_use]
    pub fn line(&self, product_id: ProductId) -> Option<&CartLineItem> {
        self.items.iter().find(|item| item.product.id == product_id)
    }

    pub(crate) fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLineItem> {
        self.items.iter_mut().find(|item| item.product.id == product_id)
    }

    /// Quantity of a product, `0` if it is not in the cart
    #[must_use]
    pub fn quantity_of(&self, product_id: ProductId) -> u32 {
        self.line(product_id).map_or(0, |item| item.quantity)
    }

    /// Whether the product has a line
    #[must_use]
    pub fn contains(&self, product_id: ProductId) -> bool {
        self.line(product_id).is_some()
    }

    /// Σ quantity over all lines
    #[must_use]
    pub fn total_items(&self) -> u64 {
        self.items.iter().map(|item| u64::from(item.quantity)).sum()
    }

    /// Σ effective price × quantity over all lines
    ///
    /// Saturates like [`CartLineItem::line_total`].
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items
            .iter()
            .map(CartLineItem::line_total)
            .fold(Decimal::ZERO, Decimal::saturating_add)
    }

    /// Σ effective price × quantity, `None` if any step does not fit a `Decimal`
    #[must_use]
    pub fn checked_total_price(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |total, item| total.checked_add(item.checked_line_total()?))
    }

    /// Checkout totals for the current cart
    #[must_use]
    pub fn summary(&self, config: &CheckoutConfig) -> CartSummary {
        CartSummary::compute(self.total_items(), self.total_price(), config)
    }

    /// Returns `true` if the cart has no lines
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl TracksOutcome for CartState {
    fn last_outcome(&self) -> Option<&Outcome> {
        self.last_outcome.as_ref()
    }
}

/// Persisted form of the cart
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// Line items in display order
    pub items: Vec<CartLineItem>,
}

impl Persistable for CartState {
    type Snapshot = CartSnapshot;

    const VERSION: u32 = 1;

    fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
        }
    }

    fn restore(&mut self, snapshot: CartSnapshot) {
        let mut seen = HashSet::new();
        let mut total = Decimal::ZERO;
        let before = snapshot.items.len();

        self.items = snapshot
            .items
            .into_iter()
            .filter(|item| item.quantity > 0 && seen.insert(item.product.id))
            .filter(|item| {
                match item.checked_line_total().and_then(|line| total.checked_add(line)) {
                    Some(next) => {
                        total = next;
                        true
                    },
                    None => false,
                }
            })
            .collect();

        if self.items.len() != before {
            tracing::warn!(
                dropped = before - self.items.len(),
                "Dropped invalid lines from persisted cart"
            );
        }
    }

    /// Version 0 stored lines without `addedAt`, some of them as
    /// `{productId, quantity}` instead of embedding the product.
    fn migrate(state: Value, from_version: u32, now: DateTime<Utc>) -> Result<Value, MigrationError> {
        if from_version != 0 {
            return Err(MigrationError::UnsupportedVersion {
                found: from_version,
                current: Self::VERSION,
            });
        }

        let Value::Object(mut state) = state else {
            return Err(MigrationError::InvalidShape("cart state is not an object".to_string()));
        };

        let items = match state.remove("items") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(MigrationError::InvalidShape("cart items is not an array".to_string()));
            },
        };

        let items = items
            .into_iter()
            .map(|item| migrate_line_v0(item, now))
            .collect::<Result<Vec<_>, _>>()?;

        state.insert("items".to_string(), Value::Array(items));
        Ok(Value::Object(state))
    }
}

fn migrate_line_v0(item: Value, now: DateTime<Utc>) -> Result<Value, MigrationError> {
    let Value::Object(mut line) = item else {
        return Err(MigrationError::InvalidShape("cart line is not an object".to_string()));
    };

    if !line.contains_key("product") {
        let Some(id) = line.remove("productId") else {
            return Err(MigrationError::InvalidShape(
                "cart line has neither product nor productId".to_string(),
            ));
        };
        let mut product = Map::new();
        product.insert("id".to_string(), id);
        line.insert("product".to_string(), Value::Object(product));
    }

    if !matches!(line.get("addedAt"), Some(Value::String(stamp)) if !stamp.is_empty()) {
        line.insert("addedAt".to_string(), Value::String(now.to_rfc3339()));
    }

    Ok(Value::Object(line))
}

/// Actions the cart reducer accepts
#[derive(Clone, Debug, PartialEq)]
pub enum CartAction {
    /// Add units of a product, merging into an existing line
    AddItem {
        /// Product to add
        product: Product,
        /// Units to add, at least 1
        quantity: u32,
    },

    /// Remove a product's line
    RemoveItem {
        /// Product whose line to remove
        product_id: ProductId,
    },

    /// Set a line's quantity; `≤ 0` removes the line
    UpdateQuantity {
        /// Product whose line to update
        product_id: ProductId,
        /// New absolute quantity
        quantity: i64,
    },

    /// Remove every line
    ClearCart,
}
