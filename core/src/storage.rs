//! Key-value storage trait for persisted store snapshots.
//!
//! Stores serialize their whole aggregate into a single string and write it
//! under one key. The adapter behind this trait is the only durable state the
//! stores have; everything else lives in memory.
//!
//! # Implementations
//!
//! - `FileStorage` (in `storefront-runtime`): one JSON file per key on disk
//! - `InMemoryStorage` (in `storefront-testing`): `HashMap`-backed, with
//!   failure injection for exercising the degraded paths
//!
//! # Example
//!
//! ```no_run
//! use storefront_core::storage::{KeyValueStorage, StorageError};
//!
//! async fn example<S: KeyValueStorage>(storage: &S) -> Result<(), StorageError> {
//!     storage.set("cart-storage", r#"{"version":1,"state":{"items":[]}}"#.to_string()).await?;
//!
//!     let raw = storage.get("cart-storage").await?;
//!     assert!(raw.is_some());
//!     Ok(())
//! }
//! ```

use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Boxed future returned by [`KeyValueStorage`] methods
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StorageError>> + Send + 'a>>;

/// Errors that can occur while reading or writing persisted snapshots.
#[derive(Error, Debug)]
pub enum StorageError {
    /// The backing medium could not be read or written.
    #[error("I/O error: {0}")]
    Io(String),

    /// The storage backend is not available right now.
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Durable async key-value storage.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: the persister task writes from a
/// background task while the store is read from request handlers.
///
/// # Dyn Compatibility
///
/// This trait uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn`
/// so that stores can hold an `Arc<dyn KeyValueStorage>`.
pub trait KeyValueStorage: Send + Sync {
    /// Load the value stored under `key`.
    ///
    /// A key that was never written is `Ok(None)`, not an error.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be read.
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be written.
    fn set<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()>;

    /// Remove the value under `key`. Removing a missing key succeeds.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if the backend cannot be written.
    fn remove<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()>;
}

impl<T: KeyValueStorage + ?Sized> KeyValueStorage for std::sync::Arc<T> {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        (**self).get(key)
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()> {
        (**self).set(key, value)
    }

    fn remove<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        (**self).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct MapStorage(Mutex<HashMap<String, String>>);

    impl KeyValueStorage for MapStorage {
        fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
            let value = self
                .0
                .lock()
                .map(|map| map.get(key).cloned())
                .map_err(|e| StorageError::Io(e.to_string()));
            Box::pin(async move { value })
        }

        fn set<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()> {
            let result = self
                .0
                .lock()
                .map(|mut map| {
                    map.insert(key.to_string(), value);
                })
                .map_err(|e| StorageError::Io(e.to_string()));
            Box::pin(async move { result })
        }

        fn remove<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
            let result = self
                .0
                .lock()
                .map(|mut map| {
                    map.remove(key);
                })
                .map_err(|e| StorageError::Io(e.to_string()));
            Box::pin(async move { result })
        }
    }

    #[test]
    fn storage_error_display() {
        let error = StorageError::Unavailable("disk detached".to_string());
        assert_eq!(format!("{error}"), "Storage unavailable: disk detached");
    }

    #[test]
    fn arc_forwards_to_inner_storage() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MapStorage::default());

        tokio_test::block_on(async {
            assert!(matches!(storage.get("k").await, Ok(None)));
            assert!(storage.set("k", "v".to_string()).await.is_ok());
            assert_eq!(storage.get("k").await.ok().flatten().as_deref(), Some("v"));
            assert!(storage.remove("k").await.is_ok());
            assert!(matches!(storage.get("k").await, Ok(None)));
        });
    }
}
