//! Data directory owner
//!
//! A [`FileStore`] is built once per process. It owns every document under
//! one data directory and holds an exclusive advisory lock on
//! `<data_dir>/.ramp.lock` for its whole lifetime, so a second process
//! pointed at the same directory fails to open instead of racing writes.

use crate::analytics::AnalyticsStore;
use crate::config::ConfigStore;
use crate::error::{StoreError, StoreResult};
use crate::orders::OrderStore;
use crate::repository::{AnalyticsRepository, ConfigRepository, OrderRepository, Store};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Name of the lock file inside the data directory
pub const LOCK_FILE: &str = ".ramp.lock";

/// Where and how to store documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageOptions {
    /// Directory holding every JSON document
    pub data_dir: PathBuf,
    /// Budget for acquiring a document and loading it
    pub timeout: Duration,
}

impl StorageOptions {
    /// Default per-operation timeout
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

    /// Options for `data_dir` with the default timeout
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-operation timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Every store under one locked data directory
pub struct FileStore {
    data_dir: PathBuf,
    orders: OrderStore,
    config: ConfigStore,
    analytics: AnalyticsStore,
    lock_file: File,
}

impl FileStore {
    /// Create the data directory if needed and take the process lock.
    ///
    /// Returns `Conflict` if another process already holds the directory.
    pub fn open(options: StorageOptions) -> StoreResult<Self> {
        let data_dir = options.data_dir;
        std::fs::create_dir_all(&data_dir).map_err(|e| StoreError::io(&data_dir, e))?;

        let lock_path = data_dir.join(LOCK_FILE);
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|e| StoreError::io(&lock_path, e))?;

        if let Err(e) = lock_file.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                return Err(StoreError::Conflict(format!(
                    "data directory {} is in use by another process",
                    data_dir.display()
                )));
            }
            return Err(StoreError::io(&lock_path, e));
        }

        debug!(data_dir = %data_dir.display(), timeout_ms = options.timeout.as_millis() as u64, "Storage opened");

        Ok(Self {
            orders: OrderStore::new(&data_dir, options.timeout),
            config: ConfigStore::new(&data_dir, options.timeout),
            analytics: AnalyticsStore::new(&data_dir, options.timeout),
            data_dir,
            lock_file,
        })
    }

    /// Write defaults for every document that has no file yet.
    ///
    /// Existing files are never touched. Returns the file names created.
    pub async fn initialize(&self) -> StoreResult<Vec<&'static str>> {
        let mut created = self.orders.initialize().await?;
        created.extend(self.config.initialize().await?);
        created.extend(self.analytics.initialize().await?);

        for file in &created {
            info!(file, data_dir = %self.data_dir.display(), "Created storage file");
        }
        Ok(created)
    }

    /// The locked data directory
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Order collections
    pub fn order_store(&self) -> &OrderStore {
        &self.orders
    }

    /// Configuration documents
    pub fn config_store(&self) -> &ConfigStore {
        &self.config
    }

    /// Analytics document
    pub fn analytics_store(&self) -> &AnalyticsStore {
        &self.analytics
    }
}

impl Store for FileStore {
    fn orders(&self) -> &dyn OrderRepository {
        &self.orders
    }

    fn config(&self) -> &dyn ConfigRepository {
        &self.config
    }

    fn analytics(&self) -> &dyn AnalyticsRepository {
        &self.analytics
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.lock_file) {
            warn!(error = %e, data_dir = %self.data_dir.display(), "Failed to release storage lock");
        }
    }
}
