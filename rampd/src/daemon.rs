//! Daemon: process bootstrap and lifetime.
//!
//! # Lifecycle
//!
//! 1. Load configuration
//! 2. Open the data directory (takes the cross-process lock)
//! 3. Create any missing storage file with its defaults
//! 4. Hand out the [`AdminService`] to the request layer
//! 5. Wait for SIGINT, then release the store

use std::sync::Arc;

use ramp_store::FileStore;
use tracing::info;

use crate::admin::AdminService;
use crate::config::Config;
use crate::error::{DaemonError, DaemonResult};

// =============================================================================
// Daemon
// =============================================================================

/// The ramp admin daemon.
pub struct Daemon {
    config: Config,
    store: Arc<FileStore>,
    admin: AdminService<FileStore>,
}

impl Daemon {
    /// Open and initialize storage for `config`.
    pub async fn bootstrap(config: Config) -> DaemonResult<Self> {
        let store = FileStore::open(config.storage.options())?;
        let created = store.initialize().await?;

        info!(
            data_dir = %store.data_dir().display(),
            created = created.len(),
            environment = %config.environment,
            "Storage ready"
        );

        let store = Arc::new(store);
        let admin = AdminService::new(Arc::clone(&store));
        Ok(Self {
            config,
            store,
            admin,
        })
    }

    /// Configuration the daemon was started with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared store handle
    pub fn store(&self) -> Arc<FileStore> {
        Arc::clone(&self.store)
    }

    /// Facade for the request layer
    pub fn admin(&self) -> &AdminService<FileStore> {
        &self.admin
    }

    /// Log a startup summary and wait for a shutdown signal.
    pub async fn run(self) -> DaemonResult<()> {
        let dashboard = self.admin.dashboard().await?;
        info!(
            deposits = dashboard.summary.total_deposits,
            withdraws = dashboard.summary.total_withdraws,
            pending_deposits = dashboard.summary.pending_deposits,
            pending_withdraws = dashboard.summary.pending_withdraws,
            usd_to_vnd = %dashboard.config.exchange_rates.usd_to_vnd,
            "Daemon running"
        );

        tokio::signal::ctrl_c()
            .await
            .map_err(|e| DaemonError::Runtime(format!("failed to listen for shutdown signal: {}", e)))?;

        info!("Received shutdown signal");
        drop(self.admin);
        drop(self.store);
        info!("Shutdown complete");
        Ok(())
    }
}
