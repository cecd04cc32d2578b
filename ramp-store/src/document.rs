//! Single-writer JSON documents
//!
//! Every logical collection or configuration object lives in one JSON file
//! and is only ever read or rewritten in full. A [`JsonDocument`] owns that
//! file path plus the mutex that serializes every read-modify-write on it.
//!
//! Writes go to a sibling `*.tmp` file, are fsynced, then atomically renamed
//! over the target, so a reader never observes a partially written file.
//! Reads hold the lock only while loading.
//!
//! The operation timeout bounds waiting for the lock and loading the file.
//! Once a write has started it runs to completion: a caller never gets
//! `Timeout` for a change that was actually committed. The lock guard travels
//! with the blocking write, so dropping the caller's future mid-write does not
//! let the next writer in before the rename lands.

use crate::error::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::Write;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, warn};

/// A JSON file holding one value of type `T`
pub struct JsonDocument<T> {
    name: &'static str,
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    timeout: Duration,
    _marker: PhantomData<fn() -> T>,
}

impl<T> JsonDocument<T>
where
    T: Serialize + DeserializeOwned + Send + 'static,
{
    /// Document `name` stored at `path`, with per-operation `timeout`
    pub fn new(name: &'static str, path: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            name,
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
            timeout,
            _marker: PhantomData,
        }
    }

    /// Logical name
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the current value; `None` if the file has never been written
    pub async fn read(&self, operation: &str) -> StoreResult<Option<T>> {
        self.bounded(operation, async {
            let _guard = self.lock.lock().await;
            self.load().await
        })
        .await
    }

    /// Load the current value, or `init()` if the file has never been written
    pub async fn read_or(&self, operation: &str, init: impl FnOnce() -> T) -> StoreResult<T> {
        Ok(self.read(operation).await?.unwrap_or_else(init))
    }

    /// Serialized read-modify-write.
    ///
    /// Loads the document (or `init()` when missing), applies `f`, and
    /// persists the result. If `f` fails nothing is written and the error is
    /// returned unchanged.
    pub async fn mutate<R, I, F>(&self, operation: &str, init: I, f: F) -> StoreResult<R>
    where
        R: Send,
        I: FnOnce() -> T + Send,
        F: FnOnce(&mut T) -> StoreResult<R> + Send,
    {
        let guard = self.acquire(operation).await?;

        let mut value = match self.bounded(operation, self.load()).await? {
            Some(value) => value,
            None => init(),
        };
        let result = f(&mut value)?;
        self.persist(operation, &value, guard).await?;

        Ok(result)
    }

    /// Overwrite the document with `value`
    pub async fn replace(&self, operation: &str, value: &T) -> StoreResult<()> {
        let guard = self.acquire(operation).await?;
        self.persist(operation, value, guard).await
    }

    /// Write `init()` only if the file does not exist yet. Returns whether it wrote.
    pub async fn init_if_missing(&self, init: impl FnOnce() -> T) -> StoreResult<bool> {
        let guard = self.acquire("init").await?;

        let exists = tokio::fs::try_exists(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, e))?;
        if exists {
            return Ok(false);
        }

        self.persist("init", &init(), guard).await?;
        Ok(true)
    }

    async fn acquire(&self, operation: &str) -> StoreResult<OwnedMutexGuard<()>> {
        self.bounded(operation, async { Ok(Arc::clone(&self.lock).lock_owned().await) })
            .await
    }

    async fn bounded<V>(
        &self,
        operation: &str,
        fut: impl std::future::Future<Output = StoreResult<V>>,
    ) -> StoreResult<V> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    document = self.name,
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Storage operation timed out"
                );
                Err(StoreError::timeout(format!("{}.{}", self.name, operation), self.timeout))
            },
        }
    }

    async fn load(&self) -> StoreResult<Option<T>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(&self.path, e)),
        };

        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::serialization(&self.path, e))
    }

    /// Write `value` while holding `guard`; the guard is released only after
    /// the blocking write finishes, even if this future is dropped.
    async fn persist(
        &self,
        operation: &str,
        value: &T,
        guard: OwnedMutexGuard<()>,
    ) -> StoreResult<()> {
        let mut bytes =
            serde_json::to_vec_pretty(value).map_err(|e| StoreError::serialization(&self.path, e))?;
        bytes.push(b'\n');
        let len = bytes.len();

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let _guard = guard;
            write_atomic(&path, &bytes)
        })
        .await
        .map_err(|e| StoreError::io(&self.path, std::io::Error::other(e)))??;

        debug!(document = self.name, operation, bytes = len, path = %self.path.display(), "Document persisted");
        Ok(())
    }
}

/// Sibling temp path used for atomic replacement
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write to `<path>.tmp`, fsync, then rename over `path`
fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let tmp = temp_path(path);

    let mut file = std::fs::File::create(&tmp).map_err(|e| StoreError::io(&tmp, e))?;
    file.write_all(bytes).map_err(|e| StoreError::io(&tmp, e))?;
    file.sync_all().map_err(|e| StoreError::io(&tmp, e))?;
    drop(file);

    std::fs::rename(&tmp, path).map_err(|e| StoreError::io(path, e))?;

    // Persist the rename itself
    #[cfg(unix)]
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::File::open(parent)
            .and_then(|dir| dir.sync_all())
            .map_err(|e| StoreError::io(parent, e))?;
    }

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
