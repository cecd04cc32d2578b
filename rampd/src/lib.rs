//! Ramp Admin Daemon Library
//!
//! Process bootstrap and the boundary facade for the on/off-ramp admin
//! backend.
//!
//! # Architecture
//!
//! ```text
//! Request layer → AdminService → Store ports → FileStore → JSON documents
//! ```
//!
//! # Components
//!
//! - **Daemon**: Opens and initializes storage, waits for shutdown
//! - **AdminService**: Cross-collection lookups, dashboard and period views,
//!   public rate/fee/swap checks
//! - **Config**: Environment-based configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use rampd::{Config, Daemon};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = Config::from_env().expect("Failed to load config");
//!     let daemon = Daemon::bootstrap(config).await.expect("Storage error");
//!     daemon.run().await.expect("Daemon error");
//! }
//! ```

#![warn(clippy::all)]

pub mod admin;
pub mod config;
pub mod daemon;
pub mod error;

// Re-exports for convenience
pub use admin::{AdminDashboard, AdminService, PeriodStats, PublicRates, StatsPeriod};
pub use config::{Config, Environment, LogConfig, StorageConfig};
pub use daemon::Daemon;
pub use error::{DaemonError, DaemonResult};
