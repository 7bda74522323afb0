//! TTL cache over a durable string key/value primitive.
//!
//! Entries live under `<namespace><key>` (default namespace `cache_`) as
//! encoded [`CacheEntry`] records. Expiry is lazy on read and eager in
//! [`ExpiringStore::clear_expired`], which the cache sweeper runs on a timer.
//! Entries that fail to decode are deleted and reported as absent.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CacheConfig, CacheEntry};
use crate::domain::ports::{Clock, EntryCodec, JsonEntryCodec, KeyValueStorage};

const DEFAULT_NAMESPACE: &str = "cache_";

/// Counts from one expired-entry sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Namespaced keys inspected
    pub scanned: usize,
    /// Entries removed because they had expired
    pub expired_removed: usize,
    /// Entries removed because they failed to decode
    pub corrupt_removed: usize,
}

impl SweepReport {
    /// Expired and corrupt entries removed together.
    pub const fn total_removed(&self) -> usize {
        self.expired_removed + self.corrupt_removed
    }
}

/// Namespaced, TTL-based cache over a [`KeyValueStorage`].
pub struct ExpiringStore<S: KeyValueStorage> {
    storage: Arc<S>,
    clock: Arc<dyn Clock>,
    codec: Arc<dyn EntryCodec>,
    namespace: String,
}

impl<S: KeyValueStorage> ExpiringStore<S> {
    /// Create a store with the default `cache_` namespace and JSON encoding.
    pub fn new(storage: Arc<S>, clock: Arc<dyn Clock>) -> Self {
        Self {
            storage,
            clock,
            codec: Arc::new(JsonEntryCodec),
            namespace: DEFAULT_NAMESPACE.to_string(),
        }
    }

    /// Create a store using the namespace from configuration.
    pub fn from_config(storage: Arc<S>, clock: Arc<dyn Clock>, config: &CacheConfig) -> Self {
        Self::new(storage, clock).with_namespace(config.namespace_prefix.clone())
    }

    /// Use `namespace` as the key prefix instead of `cache_`.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Replace the JSON entry encoding.
    #[must_use]
    pub fn with_codec(mut self, codec: Arc<dyn EntryCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Key prefix owned by this store.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Clock used to stamp and expire entries.
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Storage key for a cache key.
    pub fn namespaced(&self, key: &str) -> String {
        format!("{}{}", self.namespace, key)
    }

    /// Cache `value` under `key` for `ttl`.
    ///
    /// Fails fast if the value cannot be represented as JSON or `ttl` is zero.
    pub async fn set<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> DomainResult<()> {
        let value = serde_json::to_value(value)?;
        self.set_value(key, value, ttl).await
    }

    /// Like [`set`](Self::set) for an already built JSON value.
    pub async fn set_value(&self, key: &str, value: Value, ttl: Duration) -> DomainResult<()> {
        let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
        if ttl_ms <= 0 {
            return Err(DomainError::InvalidTtl(key.to_string()));
        }

        let entry = CacheEntry::new(value, self.clock.now_millis(), ttl_ms);
        let encoded = self.codec.encode(&entry)?;
        self.storage.set(&self.namespaced(key), &encoded).await?;

        debug!(key, ttl_ms, expires = entry.expires, "cache entry written");
        Ok(())
    }

    /// Cached value for `key`, or `None` when missing, expired or unreadable.
    ///
    /// Expired and unreadable entries are removed as a side effect. A value
    /// that no longer deserializes into `T` counts as unreadable.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> DomainResult<Option<T>> {
        let Some(value) = self.get_value(key).await? else {
            return Ok(None);
        };

        match serde_json::from_value(value) {
            Ok(typed) => Ok(Some(typed)),
            Err(e) => {
                warn!(key, error = %e, "cached value has unexpected shape, discarding");
                self.storage.remove(&self.namespaced(key)).await?;
                Ok(None)
            }
        }
    }

    /// Like [`get`](Self::get) without deserializing.
    pub async fn get_value(&self, key: &str) -> DomainResult<Option<Value>> {
        Ok(self.get_entry(key).await?.map(|entry| entry.value))
    }

    /// Live entry for `key` with its timestamps, under the same expiry and
    /// self-healing rules as [`ExpiringStore::get_value`].
    pub async fn get_entry(&self, key: &str) -> DomainResult<Option<CacheEntry>> {
        let storage_key = self.namespaced(key);
        let Some(raw) = self.storage.get(&storage_key).await? else {
            return Ok(None);
        };

        let entry = match self.codec.decode(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "corrupt cache entry, removing");
                self.storage.remove(&storage_key).await?;
                return Ok(None);
            }
        };

        let now = self.clock.now_millis();
        if entry.is_expired_at(now) {
            debug!(key, expired_at = entry.expires, now, "cache entry expired");
            self.storage.remove(&storage_key).await?;
            return Ok(None);
        }

        Ok(Some(entry))
    }

    /// Remove a single entry.
    pub async fn remove(&self, key: &str) -> DomainResult<()> {
        self.storage.remove(&self.namespaced(key)).await?;
        Ok(())
    }

    /// Remove every entry whose key starts with `pattern`.
    ///
    /// An empty pattern clears the whole namespace. Keys outside the
    /// namespace are never touched.
    pub async fn clear(&self, pattern: &str) -> DomainResult<usize> {
        let mut removed = 0;
        for storage_key in self.storage.keys().await? {
            let Some(key) = storage_key.strip_prefix(&self.namespace) else {
                continue;
            };
            if key.starts_with(pattern) {
                self.storage.remove(&storage_key).await?;
                removed += 1;
            }
        }

        debug!(pattern, removed, "cache entries cleared");
        Ok(removed)
    }

    /// Delete entries past their TTL and entries that fail to decode.
    pub async fn clear_expired(&self) -> DomainResult<SweepReport> {
        let now = self.clock.now_millis();
        let mut report = SweepReport::default();

        for storage_key in self.storage.keys().await? {
            if !storage_key.starts_with(&self.namespace) {
                continue;
            }
            report.scanned += 1;

            // Removed between listing and reading.
            let Some(raw) = self.storage.get(&storage_key).await? else {
                continue;
            };

            match self.codec.decode(&raw) {
                Ok(entry) if entry.expires < now => {
                    self.storage.remove(&storage_key).await?;
                    report.expired_removed += 1;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(key = %storage_key, error = %e, "corrupt cache entry, removing");
                    self.storage.remove(&storage_key).await?;
                    report.corrupt_removed += 1;
                }
            }
        }

        debug!(
            scanned = report.scanned,
            expired = report.expired_removed,
            corrupt = report.corrupt_removed,
            "expired cache entries swept"
        );
        Ok(report)
    }

    /// Cache keys currently stored, without the namespace prefix.
    pub async fn keys(&self) -> DomainResult<Vec<String>> {
        let mut keys: Vec<String> = self
            .storage
            .keys()
            .await?
            .into_iter()
            .filter_map(|k| k.strip_prefix(&self.namespace).map(str::to_string))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryKeyValueStorage;
    use crate::domain::ports::{CodecError, ManualClock};
    use serde_json::json;
    use std::collections::HashMap;

    fn setup() -> (Arc<InMemoryKeyValueStorage>, Arc<ManualClock>, ExpiringStore<InMemoryKeyValueStorage>) {
        let storage = Arc::new(InMemoryKeyValueStorage::new());
        let clock = Arc::new(ManualClock::at_millis(1_700_000_000_000));
        let store = ExpiringStore::new(storage.clone(), clock.clone());
        (storage, clock, store)
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let (_, _, store) = setup();
        store
            .set("advisor_1", &json!({"name": "A"}), Duration::from_secs(60))
            .await
            .unwrap();

        let value: Option<Value> = store.get("advisor_1").await.unwrap();
        assert_eq!(value, Some(json!({"name": "A"})));
    }

    #[tokio::test]
    async fn test_entry_written_under_namespace() {
        let (storage, _, store) = setup();
        store.set("k", &1, Duration::from_secs(1)).await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["cache_k".to_string()]);
    }

    #[tokio::test]
    async fn test_expired_entry_is_removed_on_read() {
        let (storage, clock, store) = setup();
        store.set("k", &"v", Duration::from_millis(500)).await.unwrap();

        clock.advance_millis(500);
        assert_eq!(store.get::<String>("k").await.unwrap(), Some("v".to_string()));

        clock.advance_millis(1);
        assert_eq!(store.get::<String>("k").await.unwrap(), None);
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_ttl_rejected() {
        let (_, _, store) = setup();
        let err = store.set("k", &1, Duration::ZERO).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidTtl(key) if key == "k"));
    }

    #[tokio::test]
    async fn test_non_json_value_fails_at_set() {
        let (storage, _, store) = setup();
        let mut map = HashMap::new();
        map.insert((1, 2), "tuple keys are not JSON");

        let err = store.set("k", &map, Duration::from_secs(1)).await.unwrap_err();
        assert!(matches!(err, DomainError::SerializationError(_)));
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_entry() {
        let (_, clock, store) = setup();
        store.set("k", &json!({"a": 1}), Duration::from_millis(10)).await.unwrap();
        store.set("k", &json!({"b": 2}), Duration::from_secs(10)).await.unwrap();

        clock.advance_millis(100);
        let value: Option<Value> = store.get("k").await.unwrap();
        assert_eq!(value, Some(json!({"b": 2})));
    }

    #[tokio::test]
    async fn test_shape_mismatch_discards_entry() {
        let (storage, _, store) = setup();
        store.set("k", &json!({"not": "a number"}), Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.get::<u64>("k").await.unwrap(), None);
        assert!(storage.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_ignores_foreign_keys() {
        let (storage, _, store) = setup();
        storage.set("search_outside", "x").await.unwrap();
        store.set("search_a", &1, Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.clear("").await.unwrap(), 1);
        assert_eq!(storage.keys().await.unwrap(), vec!["search_outside".to_string()]);
    }

    #[tokio::test]
    async fn test_custom_namespace() {
        let (storage, _, store) = setup();
        let store = store.with_namespace("adv:");
        store.set("x", &1, Duration::from_secs(1)).await.unwrap();
        assert_eq!(storage.keys().await.unwrap(), vec!["adv:x".to_string()]);
        assert_eq!(store.keys().await.unwrap(), vec!["x".to_string()]);
    }

    #[tokio::test]
    async fn test_sweep_counts_expired_and_corrupt() {
        let (storage, clock, store) = setup();
        store.set("short", &1, Duration::from_millis(10)).await.unwrap();
        store.set("long", &2, Duration::from_secs(60)).await.unwrap();
        storage.set("cache_broken", "{oops").await.unwrap();

        clock.advance_millis(11);
        let report = store.clear_expired().await.unwrap();

        assert_eq!(report.scanned, 3);
        assert_eq!(report.expired_removed, 1);
        assert_eq!(report.corrupt_removed, 1);
        assert_eq!(report.total_removed(), 2);
        assert_eq!(store.keys().await.unwrap(), vec!["long".to_string()]);
    }

    /// `timestamp|expires|json` instead of a JSON object.
    struct PipeCodec;

    impl EntryCodec for PipeCodec {
        fn encode(&self, entry: &CacheEntry) -> Result<String, CodecError> {
            Ok(format!("{}|{}|{}", entry.timestamp, entry.expires, entry.value))
        }

        fn decode(&self, raw: &str) -> Result<CacheEntry, CodecError> {
            let mut parts = raw.splitn(3, '|');
            let mut field = || parts.next().ok_or_else(|| CodecError::Decode(raw.to_string()));
            let timestamp = field()?.parse().map_err(|_| CodecError::Decode(raw.to_string()))?;
            let expires = field()?.parse().map_err(|_| CodecError::Decode(raw.to_string()))?;
            let value = serde_json::from_str(field()?).map_err(|e| CodecError::Decode(e.to_string()))?;
            Ok(CacheEntry {
                value,
                timestamp,
                expires,
            })
        }
    }

    #[tokio::test]
    async fn test_injected_codec_controls_stored_form() {
        let (storage, clock, store) = setup();
        let store = store.with_codec(Arc::new(PipeCodec));
        store.set("advisor_1", &json!({"name": "A"}), Duration::from_millis(100)).await.unwrap();

        let raw = storage.get("cache_advisor_1").await.unwrap().unwrap();
        assert_eq!(raw, r#"1700000000000|1700000000100|{"name":"A"}"#);
        assert_eq!(store.get_value("advisor_1").await.unwrap(), Some(json!({"name": "A"})));

        // JSON written by the default codec is unreadable to this one.
        storage.set("cache_advisor_2", r#"{"value":1,"timestamp":0,"expires":1}"#).await.unwrap();
        assert_eq!(store.get_value("advisor_2").await.unwrap(), None);

        clock.advance_millis(101);
        assert_eq!(store.get_value("advisor_1").await.unwrap(), None);
        assert!(storage.keys().await.unwrap().is_empty());
    }
}
