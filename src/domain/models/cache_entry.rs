//! Stored cache entries and their expiry arithmetic.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single TTL-bound cache record as it is persisted.
///
/// Timestamps are epoch milliseconds. An entry is immutable once written;
/// writing the same key again replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// Cached payload
    pub value: Value,

    /// When the entry was written
    pub timestamp: i64,

    /// Instant after which the entry counts as absent
    pub expires: i64,
}

impl CacheEntry {
    /// Build an entry written at `now_ms` that lives for `ttl_ms`.
    pub fn new(value: Value, now_ms: i64, ttl_ms: i64) -> Self {
        Self {
            value,
            timestamp: now_ms,
            expires: now_ms.saturating_add(ttl_ms),
        }
    }

    /// Whether the entry is past its TTL at `now_ms`.
    pub const fn is_expired_at(&self, now_ms: i64) -> bool {
        now_ms > self.expires
    }

    /// Remaining lifetime at `now_ms`, zero once expired.
    pub fn remaining_ms(&self, now_ms: i64) -> i64 {
        (self.expires - now_ms).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_new_entry_expires_after_written() {
        let entry = CacheEntry::new(json!({"name": "A"}), 1_000, 600_000);
        assert_eq!(entry.timestamp, 1_000);
        assert_eq!(entry.expires, 601_000);
        assert!(entry.expires > entry.timestamp);
    }

    #[test]
    fn test_expiry_boundary() {
        let entry = CacheEntry::new(json!(1), 0, 100);
        assert!(!entry.is_expired_at(100));
        assert!(entry.is_expired_at(101));
        assert_eq!(entry.remaining_ms(40), 60);
        assert_eq!(entry.remaining_ms(500), 0);
    }

    #[test]
    fn test_wire_shape() {
        let entry = CacheEntry::new(json!("v"), 5, 10);
        let encoded = serde_json::to_value(&entry).unwrap();
        assert_eq!(encoded, json!({"value": "v", "timestamp": 5, "expires": 15}));
    }
}
