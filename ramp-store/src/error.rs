//! Storage layer errors

use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in the storage layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        /// Type of entity (deposit order, withdraw order, ...)
        entity_type: String,
        /// Entity ID
        id: String,
    },

    /// Input rejected before touching storage
    #[error("Validation error: {0}")]
    Validation(String),

    /// Domain error passthrough (value object or config validation)
    #[error("Domain error: {0}")]
    Domain(#[from] ramp_domain::DomainError),

    /// Reading or writing the backing file failed
    #[error("Storage I/O error on {}: {source}", .path.display())]
    StorageIo {
        /// File or directory involved
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// The backing file could not be encoded or decoded
    #[error("Serialization error on {}: {source}", .path.display())]
    Serialization {
        /// File involved
        path: PathBuf,
        /// Underlying error
        source: serde_json::Error,
    },

    /// The backing file decoded but violates a collection invariant
    #[error("Corrupted document {}: {reason}", .path.display())]
    Corrupted {
        /// File involved
        path: PathBuf,
        /// What was wrong
        reason: String,
    },

    /// Another writer holds the storage
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The operation did not get to run within its time budget
    #[error("Storage operation '{operation}' timed out after {after:?}")]
    Timeout {
        /// Operation name
        operation: String,
        /// Configured budget
        after: Duration,
    },
}

impl StoreError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }

    /// Create an I/O error for `path`
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::StorageIo {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a serialization error for `path`
    pub fn serialization(path: impl AsRef<Path>, source: serde_json::Error) -> Self {
        Self::Serialization {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, after: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            after,
        }
    }

    /// True for failures of the persistence layer itself
    pub fn is_storage_io(&self) -> bool {
        matches!(
            self,
            Self::StorageIo { .. } | Self::Serialization { .. } | Self::Corrupted { .. }
        )
    }

    /// True when the same call may succeed if retried unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Conflict(_))
    }

    /// True for caller mistakes
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Domain(_))
    }
}

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ramp_domain::DomainError;

    #[test]
    fn test_error_classification() {
        let io = StoreError::io("/tmp/x.json", std::io::Error::other("disk full"));
        assert!(io.is_storage_io());
        assert!(!io.is_retryable());
        assert!(io.to_string().contains("/tmp/x.json"));

        let timeout = StoreError::timeout("append", Duration::from_millis(50));
        assert!(timeout.is_retryable());
        assert!(!timeout.is_storage_io());

        let domain: StoreError = DomainError::InvalidStatus("shipped".to_string()).into();
        assert!(domain.is_validation());

        let missing = StoreError::not_found("deposit order", "abc");
        assert_eq!(missing.to_string(), "Entity not found: deposit order with id abc");
    }
}
