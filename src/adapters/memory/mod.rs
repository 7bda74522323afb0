//! In-memory adapters for tests and ephemeral runs.

pub mod document_store;
pub mod kv_storage;

pub use document_store::{InMemoryDocumentStore, StoreStats};
pub use kv_storage::InMemoryKeyValueStorage;
