//! Error types for the catalog client

use crate::types::ProductId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can occur when talking to the catalog API
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The API answered with a non-2xx status
    #[error("API error: {status} {status_text}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Canonical reason phrase for the status
        status_text: String,
    },

    /// The request did not complete within the configured timeout
    #[error("Request timeout")]
    Timeout,

    /// Transport-level failure (DNS, connection refused, TLS, ...)
    #[error("Request failed: {0}")]
    Request(String),

    /// The response body could not be decoded
    #[error("Response decoding failed: {0}")]
    Decode(String),

    /// Invalid client configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<reqwest::Error> for CatalogError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::Request(error.to_string())
        }
    }
}

/// A product whose pricing breaks the catalog invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidProduct {
    /// `price < 0`
    #[error("product {id} has negative price {price}")]
    NegativePrice {
        /// Offending product
        id: ProductId,
        /// The price as received
        price: Decimal,
    },

    /// `discountPercentage` outside `0..=100`
    #[error("product {id} has discount {discount_percentage}% outside 0..=100")]
    DiscountOutOfRange {
        /// Offending product
        id: ProductId,
        /// The discount as received
        discount_percentage: Decimal,
    },
}
