//! Common test utilities for integration tests
//!
//! Store fakes with failure injection and call counting, plus fixtures for
//! the advisor directory collections.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use advisor_cache::adapters::memory::{InMemoryDocumentStore, InMemoryKeyValueStorage};
use advisor_cache::domain::models::{Document, DocumentQuery, DocumentRef};
use advisor_cache::domain::ports::{
    DocumentReader, DocumentStoreError, DocumentWriter, ManualClock, WriteBatch,
};
use advisor_cache::services::{ExpiringStore, TieredFetcher};

/// Fixed start time for manual clocks: 2024-01-01T00:00:00Z.
pub const T0_MS: i64 = 1_704_067_200_000;

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn obj(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// Document reader that can be told to fail per collection and counts calls.
#[derive(Default)]
pub struct FlakyReader {
    pub inner: InMemoryDocumentStore,
    failures: Mutex<HashMap<String, DocumentStoreError>>,
    calls: AtomicUsize,
}

impl FlakyReader {
    pub fn new(inner: InMemoryDocumentStore) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Every read against `collection` fails with `error` from now on.
    pub fn fail(&self, collection: &str, error: DocumentStoreError) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(collection.to_string(), error);
    }

    pub fn heal(&self, collection: &str) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(collection);
    }

    /// Reads issued so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn check(&self, collection: &str) -> Result<(), DocumentStoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
        {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentReader for FlakyReader {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, DocumentStoreError> {
        self.check(collection)?;
        self.inner.get_document(collection, id).await
    }

    async fn query_documents(
        &self,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        self.check(&query.collection)?;
        self.inner.query_documents(query).await
    }
}

/// Writer that records the targets of every committed batch and can fail
/// chosen batches, counted in the order they were opened.
#[derive(Clone, Default)]
pub struct RecordingWriter {
    pub inner: InMemoryDocumentStore,
    committed: Arc<Mutex<Vec<Vec<DocumentRef>>>>,
    fail_batches: Arc<Mutex<Vec<usize>>>,
    opened: Arc<AtomicUsize>,
}

impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_batch(&self, index: usize) {
        self.fail_batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(index);
    }

    pub fn commit_sizes(&self) -> Vec<usize> {
        self.committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(Vec::len)
            .collect()
    }

    pub fn committed_targets(&self) -> Vec<DocumentRef> {
        self.committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .flatten()
            .cloned()
            .collect()
    }
}

impl DocumentWriter for RecordingWriter {
    fn open_batch(&self) -> Box<dyn WriteBatch> {
        let index = self.opened.fetch_add(1, Ordering::SeqCst);
        let fail = self
            .fail_batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&index);
        Box::new(RecordingBatch {
            inner: self.inner.open_batch(),
            targets: Vec::new(),
            committed: self.committed.clone(),
            fail,
        })
    }
}

struct RecordingBatch {
    inner: Box<dyn WriteBatch>,
    targets: Vec<DocumentRef>,
    committed: Arc<Mutex<Vec<Vec<DocumentRef>>>>,
    fail: bool,
}

#[async_trait]
impl WriteBatch for RecordingBatch {
    fn set(&mut self, target: &DocumentRef, data: Map<String, Value>) {
        self.targets.push(target.clone());
        self.inner.set(target, data);
    }

    fn update(&mut self, target: &DocumentRef, data: Map<String, Value>) {
        self.targets.push(target.clone());
        self.inner.update(target, data);
    }

    fn delete(&mut self, target: &DocumentRef) {
        self.targets.push(target.clone());
        self.inner.delete(target);
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    async fn commit(&mut self) -> Result<usize, DocumentStoreError> {
        if self.fail {
            return Err(DocumentStoreError::Unavailable(
                "injected commit failure".into(),
            ));
        }
        let applied = self.inner.commit().await?;
        self.committed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(std::mem::take(&mut self.targets));
        Ok(applied)
    }
}

pub type MemoryCache = ExpiringStore<InMemoryKeyValueStorage>;

/// Expiring store over fresh in-memory storage with a manual clock at `T0_MS`.
pub fn memory_cache() -> (
    Arc<InMemoryKeyValueStorage>,
    Arc<ManualClock>,
    Arc<MemoryCache>,
) {
    let storage = Arc::new(InMemoryKeyValueStorage::new());
    let clock = Arc::new(ManualClock::at_millis(T0_MS));
    let cache = Arc::new(ExpiringStore::new(storage.clone(), clock.clone()));
    (storage, clock, cache)
}

pub struct FetcherFixture {
    pub storage: Arc<InMemoryKeyValueStorage>,
    pub clock: Arc<ManualClock>,
    pub cache: Arc<MemoryCache>,
    pub reader: Arc<FlakyReader>,
    pub fetcher: TieredFetcher<InMemoryKeyValueStorage, FlakyReader>,
}

/// Fetcher with default policy over a seeded in-memory directory.
pub fn fetcher_fixture() -> FetcherFixture {
    let (storage, clock, cache) = memory_cache();
    let store = InMemoryDocumentStore::new();
    seed_directory(&store);
    let reader = Arc::new(FlakyReader::new(store));
    let fetcher = TieredFetcher::with_defaults(cache.clone(), reader.clone());
    FetcherFixture {
        storage,
        clock,
        cache,
        reader,
        fetcher,
    }
}

/// Legacy collections for advisors `42` and `7` and user `u1`.
pub fn seed_directory(store: &InMemoryDocumentStore) {
    for (collection, id, data) in directory_documents() {
        store.insert(collection, id, data);
    }
}

/// `(collection, id, body)` for every seeded document.
pub fn directory_documents() -> Vec<(&'static str, &'static str, Value)> {
    vec![
        (
            "advisors",
            "42",
            json!({
                "name": "Avery Lin",
                "registration_number": "REG-42",
                "location": "Boston, MA",
                "specializations": ["Retirement Planning"],
                "average_rating": 4.5,
                "review_count": 2
            }),
        ),
        (
            "advisors",
            "7",
            json!({
                "name": "Blake Ortiz",
                "registration_number": "REG-7",
                "location": "Denver, CO",
                "specializations": ["Tax Planning"],
                "average_rating": 3.0,
                "review_count": 1
            }),
        ),
        (
            "advisor_logos",
            "logo-42",
            json!({"registration_number": "REG-42", "url": "https://cdn.example.com/42.png"}),
        ),
        (
            "advisor_profiles_a",
            "pa-42",
            json!({"registration_number": "REG-42", "firm": "Lin Wealth", "years_active": 12}),
        ),
        (
            "advisor_profiles_b",
            "pb-42",
            json!({"registration_number": "REG-42", "bio": "Fee-only planner", "languages": ["en", "zh"]}),
        ),
        (
            "reviews",
            "r1",
            json!({"registration_number": "REG-42", "user_id": "u1", "rating": 5, "created_at": "2024-01-02"}),
        ),
        (
            "reviews",
            "r2",
            json!({"registration_number": "REG-42", "user_id": "u2", "rating": 4, "created_at": "2024-01-03"}),
        ),
        (
            "reviews",
            "r3",
            json!({"registration_number": "REG-7", "user_id": "u1", "rating": 3, "created_at": "2024-01-04"}),
        ),
        ("users", "u1", json!({"display_name": "Robin"})),
        (
            "bookmarks",
            "b1",
            json!({"user_id": "u1", "advisor_id": "42", "created_at": "2024-01-05"}),
        ),
        (
            "bookmarks",
            "b2",
            json!({"user_id": "u1", "advisor_id": "7", "created_at": "2024-01-06"}),
        ),
    ]
}
