//! Application configuration.
//!
//! Loads configuration from environment variables with sensible defaults.
//! Variables can also come from a `.env`-style file; the process environment
//! takes precedence over it. Unparseable values are logged and replaced by
//! their default.

use crate::checkout::CheckoutConfig;
use crate::currency::Currency;
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use storefront_catalog::CatalogConfig;
use storefront_runtime::PersistConfig;
use storefront_runtime::persist::DEFAULT_DEBOUNCE;

/// Directory snapshots are written to when `STOREFRONT_DATA_DIR` is unset
pub const DEFAULT_DATA_DIR: &str = ".storefront";

/// Storefront application configuration
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Directory for persisted store snapshots
    pub data_dir: PathBuf,
    /// Quiet period before a store snapshot is written
    pub persist_debounce: Duration,
    /// Catalog API settings
    pub catalog: CatalogConfig,
    /// Shipping and tax settings
    pub checkout: CheckoutConfig,
    /// Display currency
    pub currency: Currency,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            persist_debounce: DEFAULT_DEBOUNCE,
            catalog: CatalogConfig::default(),
            checkout: CheckoutConfig::default(),
            currency: Currency::default(),
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default |
    /// |----------|---------|
    /// | `STOREFRONT_DATA_DIR` | `.storefront` |
    /// | `STOREFRONT_PERSIST_DEBOUNCE_MS` | `3000` |
    /// | `STOREFRONT_CURRENCY` | `NGN` |
    /// | `STOREFRONT_SHIPPING_FEE` | `5.99` |
    /// | `STOREFRONT_TAX_RATE` | `0.08` |
    /// | `STOREFRONT_API_URL` | `https://dummyjson.com` |
    /// | `STOREFRONT_API_TIMEOUT_SECS` | `15` |
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from the environment, falling back to the
    /// `KEY=value` pairs in `path` for variables the environment leaves unset.
    ///
    /// # Errors
    ///
    /// Returns a [`dotenvy::Error`] if the file is missing or malformed.
    pub fn from_env_file(path: &Path) -> Result<Self, dotenvy::Error> {
        Self::layered_over_file(path, |name| env::var(name).ok())
    }

    fn layered_over_file(
        path: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, dotenvy::Error> {
        let file = dotenvy::from_path_iter(path)?.collect::<Result<HashMap<_, _>, _>>()?;
        tracing::debug!(path = %path.display(), variables = file.len(), "Read env file");

        Ok(Self::from_lookup(|name| {
            lookup(name).or_else(|| file.get(name).cloned())
        }))
    }

    /// Load configuration through a variable lookup function
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let catalog = CatalogConfig::from_lookup(&lookup).unwrap_or_else(|error| {
            tracing::warn!(%error, "Invalid catalog configuration, using defaults");
            CatalogConfig::default()
        });

        Self {
            data_dir: lookup("STOREFRONT_DATA_DIR")
                .filter(|dir| !dir.trim().is_empty())
                .map_or(defaults.data_dir, PathBuf::from),
            persist_debounce: parsed(&lookup, "STOREFRONT_PERSIST_DEBOUNCE_MS")
                .map_or(defaults.persist_debounce, Duration::from_millis),
            catalog,
            checkout: CheckoutConfig {
                shipping_fee: parsed(&lookup, "STOREFRONT_SHIPPING_FEE")
                    .unwrap_or(defaults.checkout.shipping_fee),
                tax_rate: parsed(&lookup, "STOREFRONT_TAX_RATE")
                    .unwrap_or(defaults.checkout.tax_rate),
            },
            currency: parsed(&lookup, "STOREFRONT_CURRENCY").unwrap_or(defaults.currency),
        }
    }

    /// Persistence settings for the store saved under `key`
    #[must_use]
    pub fn persist_config(&self, key: &str) -> PersistConfig {
        PersistConfig::new(key).with_debounce(self.persist_debounce)
    }
}

fn parsed<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(variable = name, value = %raw, "Ignoring unparseable setting");
            None
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code can use unwrap/expect
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = StorefrontConfig::from_lookup(lookup(&[]));

        assert_eq!(config.data_dir, PathBuf::from(".storefront"));
        assert_eq!(config.persist_debounce, Duration::from_secs(3));
        assert_eq!(config.currency, Currency::Ngn);
        assert_eq!(config.checkout, CheckoutConfig::default());
        assert_eq!(config.catalog, CatalogConfig::default());
    }

    #[test]
    fn test_overrides() {
        let config = StorefrontConfig::from_lookup(lookup(&[
            ("STOREFRONT_DATA_DIR", "/var/lib/storefront"),
            ("STOREFRONT_PERSIST_DEBOUNCE_MS", "250"),
            ("STOREFRONT_CURRENCY", "usd"),
            ("STOREFRONT_TAX_RATE", "0.075"),
            ("STOREFRONT_API_URL", "http://localhost:3000"),
        ]));

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/storefront"));
        assert_eq!(config.persist_debounce, Duration::from_millis(250));
        assert_eq!(config.currency, Currency::Usd);
        assert_eq!(config.checkout.tax_rate, dec!(0.075));
        assert_eq!(config.catalog.base_url, "http://localhost:3000");

        let persist = config.persist_config("cart-storage");
        assert_eq!(persist.key, "cart-storage");
        assert_eq!(persist.debounce, Duration::from_millis(250));
    }

    #[test]
    fn test_bad_values_fall_back() {
        let config = StorefrontConfig::from_lookup(lookup(&[
            ("STOREFRONT_PERSIST_DEBOUNCE_MS", "soon"),
            ("STOREFRONT_API_TIMEOUT_SECS", "0"),
            ("STOREFRONT_CURRENCY", "EUR"),
        ]));

        assert_eq!(config.persist_debounce, Duration::from_secs(3));
        assert_eq!(config.catalog, CatalogConfig::default());
        assert_eq!(config.currency, Currency::Ngn);
    }

    #[test]
    fn test_env_file_fills_unset_variables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "# local overrides\nSTOREFRONT_DATA_DIR=/srv/shop\nSTOREFRONT_TAX_RATE=0.1\nSTOREFRONT_CURRENCY=\"USD\"\n",
        )
        .unwrap();

        let config =
            StorefrontConfig::layered_over_file(&path, lookup(&[("STOREFRONT_TAX_RATE", "0.2")]))
                .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/srv/shop"));
        assert_eq!(config.checkout.tax_rate, dec!(0.2));
        assert_eq!(config.currency, Currency::Usd);
        assert_eq!(config.persist_debounce, Duration::from_secs(3));
    }

    #[test]
    fn test_missing_env_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = StorefrontConfig::layered_over_file(&dir.path().join("absent.env"), lookup(&[]));

        assert!(result.is_err_and(|error| error.not_found()));
    }
}
