//! Read-through fetching with a cache → optimized → legacy fallback chain.
//!
//! Every resource is looked up in the expiring store first. On a miss the
//! fetcher tries one read against a denormalized collection keyed by the
//! resource id, and only when that document is missing or unreadable does it
//! run the multi-query legacy aggregation. Whatever tier answers, the result
//! is written back to the cache with the resource kind's TTL.
//!
//! Submodules hold the per-resource legacy assembly:
//! - `advisor`: profile + logo + extended parts + reviews
//! - `search`: filtered advisor listings
//! - `user`: user record + bookmarks + review activity
//! - `suggestions`: cached suggestion index with a built-in fallback

mod advisor;
mod search;
mod suggestions;
mod user;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    CacheConfig, Document, FetchConfig, FetchResult, FetchSource, ResourceKind, SearchParams,
};
use crate::domain::ports::{DocumentReader, DocumentStoreError, KeyValueStorage, UPDATED_AT_FIELD};
use crate::services::expiring_store::ExpiringStore;

/// Collection names in the document store.
pub mod collections {
    /// Primary advisor records
    pub const ADVISORS: &str = "advisors";
    /// Denormalized advisor profiles
    pub const OPTIMIZED_ADVISORS: &str = "optimized_advisors";
    /// Logos keyed by registration number
    pub const ADVISOR_LOGOS: &str = "advisor_logos";
    /// First half of the extended profile
    pub const ADVISOR_PROFILES_A: &str = "advisor_profiles_a";
    /// Second half of the extended profile
    pub const ADVISOR_PROFILES_B: &str = "advisor_profiles_b";
    /// Reviews, one per document
    pub const REVIEWS: &str = "reviews";
    /// Denormalized advisor listing used for search
    pub const OPTIMIZED_SEARCH: &str = "optimized_search";
    /// Primary user records
    pub const USERS: &str = "users";
    /// Denormalized user profiles
    pub const OPTIMIZED_USERS: &str = "optimized_users";
    /// Bookmarks, one per user/advisor pair
    pub const BOOKMARKS: &str = "bookmarks";
    /// Prebuilt suggestion index
    pub const SEARCH_SUGGESTIONS: &str = "search_suggestions";
}

/// Classified outcome of an optimized-path read.
#[derive(Debug)]
pub enum OptimizedRead<T> {
    /// Document decoded into `T`
    Found(T),
    /// No such document
    NotFound,
    /// Backend trouble or an unreadable denormalized document
    TransientError(DocumentStoreError),
    /// Access to the optimized collection was refused
    Denied(DocumentStoreError),
}

impl<T: DeserializeOwned> OptimizedRead<T> {
    /// Classify a raw read, decoding a found document into `T`.
    ///
    /// The document id is injected as `id` when the stored body lacks one.
    pub fn classify(collection: &str, result: Result<Option<Document>, DocumentStoreError>) -> Self {
        match result {
            Ok(Some(doc)) => {
                let reference = format!("{collection}/{}", doc.id);
                let mut data = doc.data;
                data.entry("id").or_insert(Value::String(doc.id));
                match serde_json::from_value(Value::Object(data)) {
                    Ok(value) => Self::Found(value),
                    Err(e) => Self::TransientError(DocumentStoreError::Malformed(reference, e.to_string())),
                }
            }
            Ok(None) | Err(DocumentStoreError::NotFound(_)) => Self::NotFound,
            Err(e @ DocumentStoreError::PermissionDenied(_)) => Self::Denied(e),
            Err(e) => Self::TransientError(e),
        }
    }
}

/// Cache-first fetcher for advisor directory resources.
pub struct TieredFetcher<S, D>
where
    S: KeyValueStorage,
    D: DocumentReader,
{
    cache: Arc<ExpiringStore<S>>,
    reader: Arc<D>,
    cache_config: CacheConfig,
    fetch_config: FetchConfig,
}

impl<S, D> TieredFetcher<S, D>
where
    S: KeyValueStorage,
    D: DocumentReader,
{
    /// Create a fetcher with explicit TTLs and fetch policy.
    pub const fn new(
        cache: Arc<ExpiringStore<S>>,
        reader: Arc<D>,
        cache_config: CacheConfig,
        fetch_config: FetchConfig,
    ) -> Self {
        Self {
            cache,
            reader,
            cache_config,
            fetch_config,
        }
    }

    /// Create with default TTLs and fetch policy.
    pub fn with_defaults(cache: Arc<ExpiringStore<S>>, reader: Arc<D>) -> Self {
        Self::new(cache, reader, CacheConfig::default(), FetchConfig::default())
    }

    /// Underlying expiring cache.
    pub const fn cache(&self) -> &Arc<ExpiringStore<S>> {
        &self.cache
    }

    /// Fetch any resource kind by id, returning its JSON form.
    ///
    /// For search results the id is the JSON encoding of [`SearchParams`];
    /// for suggestions the id is ignored.
    pub async fn fetch_resource(&self, id: &str, kind: ResourceKind) -> DomainResult<FetchResult<Value>> {
        match kind {
            ResourceKind::AdvisorProfile => to_json(self.fetch_advisor(id).await?),
            ResourceKind::SearchResults => {
                let params: SearchParams = serde_json::from_str(id).map_err(|e| {
                    DomainError::ValidationFailed(format!("invalid search parameters: {e}"))
                })?;
                to_json(self.search(&params).await?)
            }
            ResourceKind::UserProfile => to_json(self.fetch_user_profile(id).await?),
            ResourceKind::Suggestions => to_json(self.suggestion_index().await?),
        }
    }

    /// Drop the cached profile for one advisor.
    pub async fn invalidate_advisor(&self, id: &str) -> DomainResult<()> {
        self.cache.remove(&ResourceKind::AdvisorProfile.cache_key(id)).await
    }

    /// Drop the cached profile for one user.
    pub async fn invalidate_user(&self, uid: &str) -> DomainResult<()> {
        self.cache.remove(&ResourceKind::UserProfile.cache_key(uid)).await
    }

    /// Drop every cached search result set.
    pub async fn invalidate_searches(&self) -> DomainResult<usize> {
        self.cache.clear(ResourceKind::SearchResults.key_prefix()).await
    }

    /// Cached value for `key`; storage failures count as a miss.
    async fn cached<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get::<T>(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key, error = %e, "cache read failed, treating as miss");
                None
            }
        }
    }

    /// Write-back; failures are logged and never fail the fetch.
    async fn remember<T: Serialize>(&self, kind: ResourceKind, key: &str, value: &T) {
        if let Err(e) = self.cache.set(key, value, self.cache_config.ttl_for(kind)).await {
            warn!(key, error = %e, "cache write-back failed");
        }
    }

    /// Run the three-tier lookup for one resource.
    ///
    /// `legacy` is only polled when the optimized read does not produce a
    /// value; its errors propagate unchanged.
    async fn read_through<T, L>(
        &self,
        kind: ResourceKind,
        id: &str,
        optimized_collection: &str,
        legacy: L,
    ) -> DomainResult<FetchResult<T>>
    where
        T: Serialize + DeserializeOwned,
        L: Future<Output = DomainResult<T>>,
    {
        let key = kind.cache_key(id);
        if let Some(hit) = self.cached::<T>(&key).await {
            debug!(%kind, key = %key, "cache hit");
            return Ok(FetchResult::new(FetchSource::Cache, hit));
        }

        let read = self.reader.get_document(optimized_collection, id).await;
        let (source, data) = match OptimizedRead::classify(optimized_collection, read) {
            OptimizedRead::Found(data) => {
                debug!(%kind, id, "optimized document found");
                (FetchSource::Optimized, data)
            }
            OptimizedRead::NotFound => {
                debug!(%kind, id, "no optimized document, using legacy path");
                (FetchSource::Legacy, legacy.await?)
            }
            OptimizedRead::TransientError(e) => {
                warn!(%kind, id, error = %e, "optimized read failed, using legacy path");
                (FetchSource::Legacy, legacy.await?)
            }
            OptimizedRead::Denied(e) => {
                self.denied(optimized_collection, &e)?;
                (FetchSource::Legacy, legacy.await?)
            }
        };

        self.remember(kind, &key, &data).await;
        Ok(FetchResult::new(source, data))
    }

    /// Apply the permission-denied policy: surface the error unless
    /// configured to fall back.
    fn denied(&self, collection: &str, error: &DocumentStoreError) -> DomainResult<()> {
        if self.fetch_config.fallback_on_permission_denied {
            warn!(collection, error = %error, "optimized read denied, falling back");
            return Ok(());
        }
        Err(DomainError::PermissionDenied {
            collection: collection.to_string(),
            message: error.to_string(),
        })
    }
}

fn to_json<T: Serialize>(result: FetchResult<T>) -> DomainResult<FetchResult<Value>> {
    Ok(FetchResult::new(result.source, serde_json::to_value(result.data)?))
}

/// Document body without store bookkeeping fields.
fn strip_bookkeeping(doc: Document) -> serde_json::Map<String, Value> {
    let mut data = doc.data;
    data.remove(UPDATED_AT_FIELD);
    data
}
