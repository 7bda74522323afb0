//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the collaborator interfaces the cache core consumes:
//! - DocumentReader / DocumentWriter / WriteBatch: the hosted document store
//! - KeyValueStorage: durable string key/value primitive
//! - Clock: time source for TTL arithmetic
//! - EntryCodec: cache entry serialization
//!
//! Adapters in `crate::adapters` implement these for SQLite and memory.

pub mod clock;
pub mod codec;
pub mod document_store;
pub mod key_value;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{CodecError, EntryCodec, JsonEntryCodec};
pub use document_store::{
    DocumentReader, DocumentStoreError, DocumentWriter, WriteBatch, UPDATED_AT_FIELD,
};
pub use key_value::{KeyValueStorage, StorageError};
