//! Key-value storage backed by one JSON file per key.
//!
//! `set` writes a temporary file next to `<dir>/<key>.json` and renames it
//! over the target, so a reader never observes a half-written snapshot.
//! Every `set` gets its own temporary name, so concurrent writers (other
//! tasks or other processes sharing the directory) never clobber each
//! other's partial file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use storefront_core::storage::{KeyValueStorage, StorageError, StorageFuture};

static TMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Durable storage rooted at a directory.
///
/// The directory is created on the first write.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir`
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory snapshots are written to
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty()
            || key.contains(['/', '\\'])
            || key.starts_with('.')
        {
            return Err(StorageError::Io(format!("invalid storage key: {key:?}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }

    /// `<dir>/<key>.json.<pid>.<seq>.tmp`, unique per call
    fn tmp_path_for(&self, key: &str) -> PathBuf {
        let seq = TMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);
        self.dir
            .join(format!("{key}.json.{}.{seq}.tmp", std::process::id()))
    }
}

fn io_error(path: &Path, error: &std::io::Error) -> StorageError {
    StorageError::Io(format!("{}: {error}", path.display()))
}

impl KeyValueStorage for FileStorage {
    fn get<'a>(&'a self, key: &'a str) -> StorageFuture<'a, Option<String>> {
        Box::pin(async move {
            let path = self.path_for(key)?;
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => Ok(Some(contents)),
                Err(error) if error.kind() == ErrorKind::NotFound => Ok(None),
                Err(error) => Err(io_error(&path, &error)),
            }
        })
    }

    fn set<'a>(&'a self, key: &'a str, value: String) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let path = self.path_for(key)?;
            tokio::fs::create_dir_all(&self.dir)
                .await
                .map_err(|e| io_error(&self.dir, &e))?;

            let tmp = self.tmp_path_for(key);
            let written = match tokio::fs::write(&tmp, value).await {
                Ok(()) => tokio::fs::rename(&tmp, &path)
                    .await
                    .map_err(|e| io_error(&path, &e)),
                Err(error) => Err(io_error(&tmp, &error)),
            };

            if written.is_err() {
                // Best effort cleanup
                let _ = tokio::fs::remove_file(&tmp).await;
            }
            written
        })
    }

    fn remove<'a>(&'a self, key: &'a str) -> StorageFuture<'a, ()> {
        Box::pin(async move {
            let path = self.path_for(key)?;
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(()),
                Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
                Err(error) => Err(io_error(&path, &error)),
            }
        })
    }
}
