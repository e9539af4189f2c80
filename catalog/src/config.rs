//! Catalog client configuration

use crate::error::CatalogError;
use std::time::Duration;

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "https://dummyjson.com";

/// Request timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Configuration for [`CatalogClient`](crate::CatalogClient)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// API root, without a trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CatalogConfig {
    /// Load configuration from the environment
    ///
    /// Reads `STOREFRONT_API_URL` and `STOREFRONT_API_TIMEOUT_SECS`, falling
    /// back to the defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Config`] if the timeout is not a positive integer.
    pub fn from_env() -> Result<Self, CatalogError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through a variable lookup function
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, CatalogError> {
        let mut config = Self::default();

        if let Some(url) = lookup("STOREFRONT_API_URL") {
            config = config.with_base_url(url);
        }

        if let Some(raw) = lookup("STOREFRONT_API_TIMEOUT_SECS") {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                CatalogError::Config(format!("STOREFRONT_API_TIMEOUT_SECS is not a number: {raw:?}"))
            })?;
            if secs == 0 {
                return Err(CatalogError::Config(
                    "STOREFRONT_API_TIMEOUT_SECS must be greater than zero".to_string(),
                ));
            }
            config = config.with_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }

    /// Set the API root
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = CatalogConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, "https://dummyjson.com");
        assert_eq!(config.timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_overrides() {
        let config = CatalogConfig::from_lookup(lookup(&[
            ("STOREFRONT_API_URL", "http://localhost:8080/"),
            ("STOREFRONT_API_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();

        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_timeout() {
        let result = CatalogConfig::from_lookup(lookup(&[("STOREFRONT_API_TIMEOUT_SECS", "soon")]));
        assert!(matches!(result, Err(CatalogError::Config(_))));

        let result = CatalogConfig::from_lookup(lookup(&[("STOREFRONT_API_TIMEOUT_SECS", "0")]));
        assert!(matches!(result, Err(CatalogError::Config(_))));
    }
}
