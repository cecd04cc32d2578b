//! Test helpers for ramp storage tests.
//!
//! Provides temp-dir backed stores plus valid order and analytics fixtures.

mod helpers;

pub use helpers::{
    deposit_submission, event_from, install_from, withdraw_submission, TEST_WALLET,
};

use anyhow::Result;
use ramp_store::{FileStore, StorageOptions};
use std::time::Duration;
use tempfile::TempDir;

/// A [`FileStore`] over a private temp directory.
///
/// The directory is removed when this value is dropped, so keep it alive for
/// the whole test.
pub struct TestStore {
    /// The opened store
    pub store: FileStore,
    /// Backing directory
    pub dir: TempDir,
}

impl std::ops::Deref for TestStore {
    type Target = FileStore;

    fn deref(&self) -> &FileStore {
        &self.store
    }
}

/// Open a fresh, initialized store in a new temp directory.
pub async fn setup_test_store() -> Result<TestStore> {
    setup_test_store_with_timeout(StorageOptions::DEFAULT_TIMEOUT).await
}

/// Same as [`setup_test_store`] with an explicit operation timeout.
pub async fn setup_test_store_with_timeout(timeout: Duration) -> Result<TestStore> {
    let dir = tempfile::tempdir()?;
    let store = FileStore::open(StorageOptions::new(dir.path()).with_timeout(timeout))?;
    store.initialize().await?;
    Ok(TestStore { store, dir })
}
