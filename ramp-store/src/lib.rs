//! Ramp Storage Layer
//!
//! File-backed persistence for orders, configuration and analytics.
//!
//! # Architecture
//!
//! - **Repository traits**: Define the storage interface (ports)
//! - **JsonDocument**: One JSON file per logical document, guarded by a
//!   per-document mutex, rewritten atomically, bounded by a timeout
//! - **FileStore**: Owns the data directory and every document in it
//!
//! Collections are read and rewritten in full on every operation. That is
//! fine for an operator-scale admin backend and is the ceiling of this design.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ramp_store::{FileStore, StorageOptions, Store};
//! use ramp_domain::OrderType;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ramp_store::StoreError> {
//!     let store = FileStore::open(StorageOptions::new("./data"))?;
//!     store.initialize().await?;
//!
//!     let pending = store.orders().list(OrderType::Deposit, 50, 0).await?;
//!     println!("Deposits: {}", pending.len());
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]

// Modules
mod analytics;
mod config;
mod document;
mod error;
mod file_store;
mod orders;
mod repository;

// Re-exports
pub use analytics::AnalyticsStore;
pub use config::ConfigStore;
pub use document::JsonDocument;
pub use error::{StoreError, StoreResult};
pub use file_store::{FileStore, StorageOptions, LOCK_FILE};
pub use orders::{collection_file, OrderStore};
pub use repository::{
    AnalyticsRepository, ConfigRepository, OrderRepository, SampleReport, Store,
};
