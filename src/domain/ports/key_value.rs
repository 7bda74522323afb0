//! Durable key/value storage port.

use async_trait::async_trait;
use thiserror::Error;

/// Errors from a key/value storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Read or write failed
    #[error("Storage backend error: {0}")]
    Backend(String),

    /// Backend refused a write for lack of space
    #[error("Storage quota exceeded writing {0}")]
    QuotaExceeded(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Durable string-keyed, string-valued storage primitive.
///
/// Implementations must survive process restarts unless documented
/// otherwise. There is no cross-process coordination: last write wins.
#[async_trait]
pub trait KeyValueStorage: Send + Sync {
    /// Value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove a key. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Every key currently stored.
    async fn keys(&self) -> Result<Vec<String>, StorageError>;
}
