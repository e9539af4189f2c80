//! Catalog data model

use crate::error::InvalidProduct;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a catalog product
///
/// Serialized as a bare integer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(u64);

impl ProductId {
    /// Create a product ID
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw integer value
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A product as served by the catalog
///
/// Every field but `id` has a default so that partially stored products
/// (for example a legacy cart line that only kept the id) still decode.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Product identifier
    pub id: ProductId,
    /// Display title
    #[serde(default)]
    pub title: String,
    /// Long description
    #[serde(default)]
    pub description: String,
    /// Category slug
    #[serde(default)]
    pub category: String,
    /// Brand name, if the catalog knows one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// List price
    #[serde(default, with = "rust_decimal::serde::float")]
    pub price: Decimal,
    /// Discount in percent, `0..=100`
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discount_percentage: Decimal,
    /// Average rating
    #[serde(default)]
    pub rating: f64,
    /// Units in stock
    #[serde(default)]
    pub stock: u32,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Stock keeping unit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    /// Availability label ("In Stock", "Low Stock", ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_status: Option<String>,
    /// Minimum quantity per order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_order_quantity: Option<u32>,
    /// Customer reviews
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reviews: Vec<Review>,
    /// Thumbnail image URL
    #[serde(default)]
    pub thumbnail: String,
    /// Gallery image URLs
    #[serde(default)]
    pub images: Vec<String>,
}

impl Product {
    /// Create a product with the required fields, everything else defaulted
    #[must_use]
    pub fn new(id: u64, title: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: ProductId::new(id),
            title: title.into(),
            description: String::new(),
            category: String::new(),
            brand: None,
            price,
            discount_percentage: Decimal::ZERO,
            rating: 0.0,
            stock: 0,
            tags: Vec::new(),
            sku: None,
            availability_status: None,
            minimum_order_quantity: None,
            reviews: Vec::new(),
            thumbnail: String::new(),
            images: Vec::new(),
        }
    }

    /// Set the discount percentage
    #[must_use]
    pub fn with_discount(mut self, discount_percentage: Decimal) -> Self {
        self.discount_percentage = discount_percentage;
        self
    }

    /// Set the stock level
    #[must_use]
    pub fn with_stock(mut self, stock: u32) -> Self {
        self.stock = stock;
        self
    }

    /// Set the brand
    #[must_use]
    pub fn with_brand(mut self, brand: impl Into<String>) -> Self {
        self.brand = Some(brand.into());
        self
    }

    /// Set the category slug
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Set the description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Price after applying the discount
    ///
    /// `price × (1 − discount/100)` when a discount is set, otherwise `price`.
    #[must_use]
    pub fn effective_price(&self) -> Decimal {
        if self.discount_percentage > Decimal::ZERO {
            // The remaining fraction is at most 1, so a valid product never
            // overflows. An out-of-range discount saturates instead.
            let remaining = (Decimal::ONE_HUNDRED - self.discount_percentage) / Decimal::ONE_HUNDRED;
            self.price.saturating_mul(remaining)
        } else {
            self.price
        }
    }

    /// Check the pricing invariants
    ///
    /// # Errors
    ///
    /// Returns [`InvalidProduct`] if the price is negative or the discount
    /// falls outside `0..=100`.
    pub fn validate(&self) -> Result<(), InvalidProduct> {
        if self.price < Decimal::ZERO {
            return Err(InvalidProduct::NegativePrice {
                id: self.id,
                price: self.price,
            });
        }
        if self.discount_percentage < Decimal::ZERO
            || self.discount_percentage > Decimal::ONE_HUNDRED
        {
            return Err(InvalidProduct::DiscountOutOfRange {
                id: self.id,
                discount_percentage: self.discount_percentage,
            });
        }
        Ok(())
    }

    /// Whether any units are in stock
    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// A customer review
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    /// Star rating
    pub rating: u8,
    /// Review text
    #[serde(default)]
    pub comment: String,
    /// When the review was written
    pub date: DateTime<Utc>,
    /// Reviewer name
    #[serde(default)]
    pub reviewer_name: String,
    /// Reviewer email
    #[serde(default)]
    pub reviewer_email: String,
}

/// A product category
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    /// URL slug, used in `/products/category/{slug}`
    pub slug: String,
    /// Display name
    pub name: String,
    /// Listing URL
    #[serde(default)]
    pub url: String,
}

/// One page of products
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductsResponse {
    /// Products on this page
    pub products: Vec<Product>,
    /// Total matching products
    #[serde(default)]
    pub total: u64,
    /// Offset of this page
    #[serde(default)]
    pub skip: u64,
    /// Page size
    #[serde(default)]
    pub limit: u64,
}
