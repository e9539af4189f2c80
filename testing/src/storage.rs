//! In-memory key-value storage for fast, deterministic tests
//!
//! [`InMemoryStorage`] behaves like a durable backend that never loses data,
//! and can be told to fail reads or writes, or to stall a write, to exercise
//! the degraded paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;
use storefront_core::storage::{KeyValueStorage, StorageError, StorageFuture};
use tokio::sync::watch;

/// `HashMap`-backed storage with failure injection.
///
/// Clones share the same data, so a test keeps one handle for inspection and
/// hands another to the store under test.
///
/// # Example
///
/// ```
/// use storefront_testing::InMemoryStorage;
/// use storefront_core::storage::KeyValueStorage;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let storage = InMemoryStorage::new();
/// storage.set("cart-storage", "{}".to_string()).await?;
///
/// assert_eq!(storage.raw("cart-storage").as_deref(), Some("{}"));
/// assert_eq!(storage.write_count(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryStorage {
    data: Arc<RwLock<HashMap<String, String>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    write_attempts: Arc<AtomicUsize>,
    next_write_delay: Arc<Mutex<Option<Duration>>>,
    writes: Arc<watch::Sender<usize>>,
}

impl InMemoryStorage {
    /// Create a new empty storage
    #[must_use]
    pub fn new() -> Self {
        let (writes, _) = watch::channel(0);
        Self {
            data: Arc::new(RwLock::new(HashMap::new())),
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
            write_attempts: Arc::new(AtomicUsize::new(0)),
            next_write_delay: Arc::new(Mutex::new(None)),
            writes: Arc::new(writes),
        }
    }

    /// Create storage that already holds `value` under `key`
    #[must_use]
    pub fn with_entry(key: &str, value: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.put_raw(key, value);
        storage
    }

    /// Make every `get` fail with [`StorageError::Unavailable`]
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every `set` and `remove` fail with [`StorageError::Io`]
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Hold the next `set` for `delay` before it stores anything
    ///
    /// The value is captured when `set` is called, so a stalled write lands
    /// whatever the caller passed at that time.
    pub fn delay_next_write(&self, delay: Duration) {
        *self
            .next_write_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(delay);
    }

    /// Read a value without going through the trait (no failure injection,
    /// no counting)
    #[must_use]
    pub fn raw(&self, key: &str) -> Option<String> {
        self.data
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    /// Write a value without going through the trait
    pub fn put_raw(&self, key: &str, value: impl Into<String>) {
        self.data
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.into());
    }

    /// Number of successful `set` calls
    #[must_use]
    pub fn write_count(&self) -> usize {
        *self.writes.borrow()
    }

    /// Number of `set` calls, including failed ones
    #[must_use]
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    /// Wait until at least `count` successful writes have happened
    ///
    /// Returns `false` if `timeout` elapses first. Under a paused tokio clock
    /// the timeout auto-advances, so this also drives debounced writers.
    pub async fn wait_for_writes(&self, count: usize, timeout: Duration) -> bool {
        let mut rx = self.writes.subscribe();
        tokio::time::timeout(timeout, rx.wait_for(|written| *written >= count))
            .await
            .is_ok_and(|result| result.is_ok())
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStorage for InMemoryStorage {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        let result = if self.fail_reads.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("reads disabled".to_string()))
        } else {
            Ok(self.raw(key))
        };
        Box::pin(async move { result })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        let delay = self
            .next_write_delay
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(StorageError::Io("writes disabled".to_string()));
            }
            self.put_raw(key, value);
            self.writes.send_modify(|written| *written += 1);
            Ok(())
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        let result = if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::Io("writes disabled".to_string()))
        } else {
            self.data
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(key);
            Ok(())
        };
        Box::pin(async move { result })
    }
}
