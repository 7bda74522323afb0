//! Cache entry encoding.

use thiserror::Error;

use crate::domain::models::CacheEntry;

/// Errors converting cache entries to and from their stored form.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Entry could not be serialized
    #[error("Failed to encode cache entry: {0}")]
    Encode(String),

    /// Stored text is not a valid entry
    #[error("Failed to decode cache entry: {0}")]
    Decode(String),
}

/// Serializer/deserializer pair used by the expiring store.
pub trait EntryCodec: Send + Sync {
    /// Stored form of `entry`.
    fn encode(&self, entry: &CacheEntry) -> Result<String, CodecError>;

    /// Parse a stored form back into an entry.
    fn decode(&self, raw: &str) -> Result<CacheEntry, CodecError>;
}

/// JSON encoding: `{"value": .., "timestamp": .., "expires": ..}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEntryCodec;

impl EntryCodec for JsonEntryCodec {
    fn encode(&self, entry: &CacheEntry) -> Result<String, CodecError> {
        serde_json::to_string(entry).map_err(|e| CodecError::Encode(e.to_string()))
    }

    fn decode(&self, raw: &str) -> Result<CacheEntry, CodecError> {
        serde_json::from_str(raw).map_err(|e| CodecError::Decode(e.to_string()))
    }
}
