//! Checkout totals derived from the cart.

use rust_decimal::{Decimal, RoundingStrategy};

/// Shipping and tax settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutConfig {
    /// Flat shipping fee, charged when the subtotal is positive
    pub shipping_fee: Decimal,
    /// Tax rate applied to the subtotal (`0.08` = 8%)
    pub tax_rate: Decimal,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            shipping_fee: Decimal::new(599, 2),
            tax_rate: Decimal::new(8, 2),
        }
    }
}

impl CheckoutConfig {
    /// Set the shipping fee
    #[must_use]
    pub const fn with_shipping_fee(mut self, shipping_fee: Decimal) -> Self {
        self.shipping_fee = shipping_fee;
        self
    }

    /// Set the tax rate
    #[must_use]
    pub const fn with_tax_rate(mut self, tax_rate: Decimal) -> Self {
        self.tax_rate = tax_rate;
        self
    }
}

/// Order summary shown at checkout
///
/// Amounts are rounded to cents, halves away from zero. `total` is computed
/// from the unrounded parts and saturates at `Decimal::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSummary {
    /// Σ quantity
    pub total_items: u64,
    /// Σ effective price × quantity
    pub subtotal: Decimal,
    /// Shipping fee, zero for an empty cart
    pub shipping: Decimal,
    /// Tax on the subtotal
    pub tax: Decimal,
    /// subtotal + shipping + tax
    pub total: Decimal,
}

fn cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl CartSummary {
    /// Compute the summary for a cart with the given totals
    #[must_use]
    pub fn compute(total_items: u64, subtotal: Decimal, config: &CheckoutConfig) -> Self {
        let shipping = if subtotal > Decimal::ZERO {
            config.shipping_fee
        } else {
            Decimal::ZERO
        };
        let tax = subtotal.saturating_mul(config.tax_rate);
        let total = subtotal.saturating_add(shipping).saturating_add(tax);

        Self {
            total_items,
            subtotal: cents(subtotal),
            shipping: cents(shipping),
            tax: cents(tax),
            total: cents(total),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_summary_with_defaults() {
        let summary = CartSummary::compute(3, dec!(240), &CheckoutConfig::default());

        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.subtotal, dec!(240.00));
        assert_eq!(summary.shipping, dec!(5.99));
        assert_eq!(summary.tax, dec!(19.20));
        assert_eq!(summary.total, dec!(265.19));
    }

    #[test]
    fn test_empty_cart_has_no_shipping() {
        let summary = CartSummary::compute(0, Decimal::ZERO, &CheckoutConfig::default());
        assert_eq!(summary.shipping, Decimal::ZERO);
        assert_eq!(summary.total, Decimal::ZERO);
    }

    #[test]
    fn test_rounding_uses_unrounded_parts() {
        // 10.05 × 0.08 = 0.804 → tax 0.80, total 10.05 + 5.99 + 0.804 = 16.844 → 16.84
        let summary = CartSummary::compute(1, dec!(10.05), &CheckoutConfig::default());
        assert_eq!(summary.tax, dec!(0.80));
        assert_eq!(summary.total, dec!(16.84));

        // 0.0625 × 0.08 = 0.005 → half rounds away from zero
        let config = CheckoutConfig::default().with_shipping_fee(Decimal::ZERO);
        let summary = CartSummary::compute(1, dec!(0.0625), &config);
        assert_eq!(summary.tax, dec!(0.01));
    }

    #[test]
    fn test_largest_subtotal_saturates() {
        let summary = CartSummary::compute(1, Decimal::MAX, &CheckoutConfig::default());

        assert_eq!(summary.subtotal, Decimal::MAX);
        assert_eq!(summary.total, Decimal::MAX);
    }

    #[test]
    fn test_custom_config() {
        let config = CheckoutConfig::default()
            .with_shipping_fee(dec!(0))
            .with_tax_rate(dec!(0.075));
        let summary = CartSummary::compute(2, dec!(100), &config);

        assert_eq!(summary.tax, dec!(7.50));
        assert_eq!(summary.total, dec!(107.50));
    }
}
