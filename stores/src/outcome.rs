//! Result of a single store mutation.
//!
//! Mutations never fail across the store boundary. Instead each one records
//! an [`Outcome`] on the state, so callers and logs can tell a real change
//! from a no-op or a refused input.

use storefront_catalog::{InvalidProduct, ProductId};
use storefront_core::reducer::Reducer;
use storefront_runtime::Store;
use thiserror::Error;

/// What a mutation did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The aggregate changed (or was unconditionally reset)
    Applied,
    /// The mutation was valid but had nothing to act on
    Ignored {
        /// Why nothing changed
        reason: NoOp,
    },
    /// The input was invalid; state is unchanged
    Rejected {
        /// What was wrong with the input
        reason: Rejection,
    },
}

impl Outcome {
    /// Returns `true` if the aggregate changed
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    /// Emit the outcome at a level matching its kind
    pub(crate) fn log(&self, store: &'static str, operation: &'static str) {
        match self {
            Self::Applied => {
                tracing::debug!(store, operation, "Mutation applied");
            },
            Self::Ignored { reason } => {
                metrics::counter!("store.mutations.ignored", "store" => store).increment(1);
                tracing::debug!(store, operation, %reason, "Mutation ignored");
            },
            Self::Rejected { reason } => {
                metrics::counter!("store.mutations.rejected", "store" => store).increment(1);
                tracing::warn!(store, operation, %reason, "Mutation rejected");
            },
        }
    }
}

/// Reasons a valid mutation changed nothing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoOp {
    /// No cart line exists for the product
    #[error("product {0} is not in the cart")]
    NotInCart(ProductId),

    /// The product is already a favorite
    #[error("product {0} is already a favorite")]
    AlreadyFavorite(ProductId),

    /// The product is not a favorite
    #[error("product {0} is not a favorite")]
    NotFavorite(ProductId),
}

/// Reasons an input was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// `add_item` needs at least one unit
    #[error("quantity for product {0} must be at least 1")]
    ZeroQuantity(ProductId),

    /// The resulting quantity does not fit a line item
    #[error("quantity for product {product_id} would exceed {max}")]
    QuantityOverflow {
        /// Product whose line would overflow
        product_id: ProductId,
        /// Largest quantity a line can hold
        max: u32,
    },

    /// The line total, or the cart total with it, would not fit a `Decimal`
    #[error("total for product {product_id} would exceed the largest representable amount")]
    TotalOverflow {
        /// Product whose line would overflow the total
        product_id: ProductId,
    },

    /// The product's pricing is invalid
    #[error(transparent)]
    InvalidProduct(#[from] InvalidProduct),

    /// The store is shutting down and no longer accepts mutations
    #[error("store is shutting down")]
    ShuttingDown,
}

/// State that records the outcome of its last mutation
pub(crate) trait TracksOutcome {
    fn last_outcome(&self) -> Option<&Outcome>;
}

/// Send `action` and return the outcome it recorded, logging it.
///
/// A store that is shutting down reports [`Rejection::ShuttingDown`].
pub(crate) async fn dispatch<S, A, E, R>(
    store: &Store<S, A, E, R>,
    action: A,
    store_name: &'static str,
    operation: &'static str,
) -> Outcome
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    A: Send + 'static,
    S: TracksOutcome + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    let outcome = match store
        .send_and_inspect(action, |state| state.last_outcome().cloned())
        .await
    {
        Ok(Some(outcome)) => outcome,
        Ok(None) => Outcome::Applied,
        Err(_) => Outcome::Rejected {
            reason: Rejection::ShuttingDown,
        },
    };
    outcome.log(store_name, operation);
    outcome
}
