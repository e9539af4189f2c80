//! # Storefront Catalog
//!
//! Product data model and REST client for the product catalog.
//!
//! The stores only depend on the [`Product`] shape; the client is used by
//! the application shell to fetch products and categories.
//!
//! ## Example
//!
//! ```no_run
//! use storefront_catalog::{CatalogClient, CatalogConfig, ProductsQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CatalogClient::new(CatalogConfig::from_env()?)?;
//!
//!     let page = client
//!         .get_products(&ProductsQuery::new().with_search("phone").with_limit(10))
//!         .await?;
//!
//!     for product in page.products {
//!         println!("{} - {}", product.title, product.effective_price());
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod types;

// Re-export main types for convenience
pub use client::CatalogClient;
pub use config::CatalogConfig;
pub use error::{CatalogError, InvalidProduct};
pub use query::{ProductsQuery, ResolvedQuery, SortOrder};
pub use types::{Product, ProductCategory, ProductId, ProductsResponse, Review};
