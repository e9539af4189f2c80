//! Catalog REST client

use crate::{
    config::CatalogConfig,
    error::CatalogError,
    query::{ProductsQuery, endpoint},
    types::{Product, ProductCategory, ProductId, ProductsResponse},
};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;

/// Client for the product catalog API
#[derive(Clone, Debug)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
    base: Url,
}

impl CatalogClient {
    /// Create a new client
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Config` if the base URL is not an absolute
    /// `http(s)` style URL or the HTTP client cannot be built.
    pub fn new(config: CatalogConfig) -> Result<Self, CatalogError> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| CatalogError::Config(format!("invalid base URL {:?}: {e}", config.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(CatalogError::Config(format!(
                "base URL {:?} cannot carry a path",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url,
            base,
        })
    }

    /// Base URL requests are sent to
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List products matching `query`
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, non-2xx statuses, or undecodable bodies
    #[tracing::instrument(skip(self))]
    pub async fn get_products(&self, query: &ProductsQuery) -> Result<ProductsResponse, CatalogError> {
        let resolved = query.resolve();
        let response: ProductsResponse = self
            .get_json(resolved.url(&self.base), &resolved.params)
            .await?;
        let response = resolved.apply(response);

        tracing::debug!(
            count = response.products.len(),
            total = response.total,
            "Fetched products"
        );
        Ok(response)
    }

    /// Fetch one product
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, non-2xx statuses (404 for an unknown id),
    /// or undecodable bodies
    #[tracing::instrument(skip(self))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let url = endpoint(&self.base, &["products".to_string(), id.to_string()]);
        self.get_json(url, &[]).await
    }

    /// List product categories
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, non-2xx statuses, or undecodable bodies
    #[tracing::instrument(skip(self))]
    pub async fn get_categories(&self) -> Result<Vec<ProductCategory>, CatalogError> {
        self.get_json(endpoint(&self.base, &["products", "categories"]), &[])
            .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        params: &[(&'static str, String)],
    ) -> Result<T, CatalogError> {
        let path = url.path().to_string();
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), %path, "Catalog request failed");
            return Err(CatalogError::Status {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| CatalogError::Decode(e.to_string()))
    }
}
