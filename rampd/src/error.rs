//! Daemon error types.

use ramp_domain::{DomainError, OrderId};
use ramp_store::StoreError;
use thiserror::Error;

/// Daemon-level errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    /// Domain error
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    /// Store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Order not found in either collection
    #[error("Order not found: {0}")]
    OrderNotFound(OrderId),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Runtime failure outside storage (signal handling)
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl DaemonError {
    /// True when the caller sent something invalid
    pub fn is_validation(&self) -> bool {
        match self {
            DaemonError::Domain(_) => true,
            DaemonError::Store(e) => e.is_validation(),
            _ => false,
        }
    }

    /// True when the requested entity does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DaemonError::OrderNotFound(_) | DaemonError::Store(StoreError::NotFound { .. })
        )
    }
}

/// Result type for daemon operations.
pub type DaemonResult<T> = Result<T, DaemonError>;
