//! Document store read and write ports.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::domain::models::{Document, DocumentQuery, DocumentRef};

/// Field the store stamps with its own commit time on `set` and `update`.
pub const UPDATED_AT_FIELD: &str = "updated_at";

/// Errors reported by a document store adapter.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DocumentStoreError {
    /// Backend could not be reached or timed out
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    /// Caller may not read or write the collection
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Stored document does not have the expected shape
    #[error("Malformed document {0}: {1}")]
    Malformed(String, String),

    /// Update targeted a document that does not exist
    #[error("Document not found: {0}")]
    NotFound(String),

    /// Any other backend failure
    #[error("Document store backend error: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for DocumentStoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::Unavailable(err.to_string())
            }
            _ => Self::Backend(err.to_string()),
        }
    }
}

/// Read side of the document store.
#[async_trait]
pub trait DocumentReader: Send + Sync {
    /// Fetch a single document.
    ///
    /// # Returns
    /// * `Ok(Some(doc))` if found
    /// * `Ok(None)` if the document does not exist
    /// * `Err(DocumentStoreError)` on read failure
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, DocumentStoreError>;

    /// Run a filtered, optionally ordered and limited query over a collection.
    async fn query_documents(
        &self,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, DocumentStoreError>;
}

/// An open atomic batch. Operations are buffered until `commit`.
#[async_trait]
pub trait WriteBatch: Send {
    /// Create or fully replace a document.
    fn set(&mut self, target: &DocumentRef, data: Map<String, Value>);

    /// Replace the given top-level fields of an existing document.
    ///
    /// Fields absent from `data` are kept. Nested objects are replaced
    /// whole, not merged, and a `null` value is stored as `null`.
    /// Committing fails if the document is absent.
    fn update(&mut self, target: &DocumentRef, data: Map<String, Value>);

    /// Remove a document. Deleting a missing document is not an error.
    fn delete(&mut self, target: &DocumentRef);

    /// Number of buffered operations.
    fn len(&self) -> usize;

    /// Whether no operations are buffered.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Apply every buffered operation atomically, returning how many ran.
    ///
    /// On error nothing from this batch is applied.
    async fn commit(&mut self) -> Result<usize, DocumentStoreError>;
}

/// Write side of the document store.
pub trait DocumentWriter: Send + Sync {
    /// Start a new empty batch.
    fn open_batch(&self) -> Box<dyn WriteBatch>;
}
