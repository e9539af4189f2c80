//! Cart store: an ordered set of line items with derived totals.
//!
//! - [`types`]: line items, state, actions and the persisted snapshot
//! - [`reducer`]: validation and mutation logic
//! - [`store`]: the persisted handle the application talks to

pub mod reducer;
pub mod store;
pub mod types;

pub use reducer::{CartEnvironment, CartReducer};
pub use store::CartStore;
pub use types::{CART_STORAGE_KEY, CartAction, CartLineItem, CartSnapshot, CartState};
