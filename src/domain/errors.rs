//! Domain errors for the advisor cache.

use thiserror::Error;

use crate::domain::models::BatchFailure;
use crate::domain::ports::{CodecError, DocumentStoreError, StorageError};

/// Domain-level errors that can occur in the advisor cache.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Requested resource exists in no tier
    #[error("{kind} not found: {id}")]
    ResourceNotFound {
        /// Resource family label
        kind: &'static str,
        /// Identifier that was looked up
        id: String,
    },

    /// Document store refused a read
    #[error("Permission denied reading {collection}: {message}")]
    PermissionDenied {
        /// Collection that was read
        collection: String,
        /// Backend message
        message: String,
    },

    /// TTL was zero
    #[error("Invalid TTL for key {0}: must be greater than zero")]
    InvalidTtl(String),

    /// Caller input was rejected
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Key/value storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Document store failed
    #[error("Document store error: {0}")]
    DocumentStore(#[from] DocumentStoreError),

    /// Some chunks of a batched write did not commit
    #[error("Batch commit failed: {0}")]
    BatchCommitFailed(BatchFailure),

    /// SQLite error outside an adapter
    #[error("Database error: {0}")]
    DatabaseError(String),
}

/// Result alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::DatabaseError(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}

impl From<CodecError> for DomainError {
    fn from(err: CodecError) -> Self {
        DomainError::SerializationError(err.to_string())
    }
}
