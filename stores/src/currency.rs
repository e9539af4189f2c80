//! Price formatting for display.

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::str::FromStr;

/// Display currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Currency {
    /// Nigerian naira (`₦`)
    #[default]
    Ngn,
    /// US dollar (`$`)
    Usd,
}

impl Currency {
    /// Currency symbol
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Ngn => "₦",
            Self::Usd => "$",
        }
    }

    /// ISO 4217 code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Ngn => "NGN",
            Self::Usd => "USD",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "NGN" => Ok(Self::Ngn),
            "USD" => Ok(Self::Usd),
            other => Err(format!("unsupported currency: {other}")),
        }
    }
}

/// Format `amount` as `₦1,234.50` / `$1,234.50`
///
/// Two decimal places (halves away from zero), comma thousands separators,
/// and a leading `-` for negative amounts.
#[must_use]
pub fn format_currency(amount: Decimal, currency: Currency) -> String {
    let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded < Decimal::ZERO;
    rounded = rounded.abs();
    rounded.rescale(2);

    let digits = rounded.to_string();
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!(
        "{sign}{symbol}{grouped}.{fraction}",
        sign = if negative { "-" } else { "" },
        symbol = currency.symbol(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_formats_naira_by_default() {
        assert_eq!(format_currency(dec!(1234.5), Currency::default()), "₦1,234.50");
    }

    #[test]
    fn test_formats_dollars() {
        assert_eq!(format_currency(dec!(1234567.891), Currency::Usd), "$1,234,567.89");
        assert_eq!(format_currency(dec!(999), Currency::Usd), "$999.00");
        assert_eq!(format_currency(Decimal::ZERO, Currency::Usd), "$0.00");
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        assert_eq!(format_currency(dec!(0.125), Currency::Usd), "$0.13");
        assert_eq!(format_currency(dec!(-0.125), Currency::Usd), "-$0.13");
    }

    #[test]
    fn test_negative_amounts() {
        assert_eq!(format_currency(dec!(-1500), Currency::Ngn), "-₦1,500.00");
        assert_eq!(format_currency(dec!(-0.001), Currency::Ngn), "₦0.00");
    }

    #[test]
    fn test_parse_currency() {
        assert_eq!("usd".parse::<Currency>(), Ok(Currency::Usd));
        assert_eq!(" NGN ".parse::<Currency>(), Ok(Currency::Ngn));
        assert!("EUR".parse::<Currency>().is_err());
    }
}
