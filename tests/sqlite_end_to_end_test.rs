//! End-to-end: seed SQLite through the batch writer, then read through the
//! fetcher with a SQLite-backed cache.

mod common;

use advisor_cache::adapters::sqlite::{
    create_migrated_test_pool, SqliteDocumentStore, SqliteKeyValueStorage,
};
use advisor_cache::domain::models::{BatchIntent, DocumentRef, FetchSource, SearchParams};
use advisor_cache::domain::ports::{KeyValueStorage, ManualClock};
use advisor_cache::services::{BatchedWriter, ExpiringStore, TieredFetcher};
use std::sync::Arc;

use common::{directory_documents, obj, T0_MS};

struct SqliteFixture {
    storage: Arc<SqliteKeyValueStorage>,
    clock: Arc<ManualClock>,
    fetcher: TieredFetcher<SqliteKeyValueStorage, SqliteDocumentStore>,
}

async fn seeded_fixture() -> SqliteFixture {
    let pool = create_migrated_test_pool().await.unwrap();
    let documents = Arc::new(SqliteDocumentStore::new(pool.clone()));

    let intents: Vec<_> = directory_documents()
        .into_iter()
        .map(|(collection, id, body)| BatchIntent::set(DocumentRef::new(collection, id), obj(body)))
        .collect();
    let report = BatchedWriter::new(documents.clone(), 4)
        .apply_batch(&intents)
        .await
        .unwrap();
    assert_eq!(report.operations, intents.len());

    let storage = Arc::new(SqliteKeyValueStorage::new(pool));
    let clock = Arc::new(ManualClock::at_millis(T0_MS));
    let cache = Arc::new(ExpiringStore::new(storage.clone(), clock.clone()));
    SqliteFixture {
        storage,
        clock,
        fetcher: TieredFetcher::with_defaults(cache, documents),
    }
}

#[tokio::test]
async fn test_advisor_read_through_sqlite() {
    let fx = seeded_fixture().await;

    let first = fx.fetcher.fetch_advisor("42").await.unwrap();
    assert_eq!(first.source, FetchSource::Legacy);
    assert_eq!(first.data.registration_number, "REG-42");
    assert_eq!(first.data.logo_url.as_deref(), Some("https://cdn.example.com/42.png"));
    assert_eq!(first.data.details["firm"], "Lin Wealth");
    assert!(!first.data.details.contains_key("updated_at"));
    assert!(!first.data.record.contains_key("updated_at"));
    let review_ids: Vec<_> = first.data.reviews.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(review_ids, vec!["r2", "r1"]);

    assert!(fx
        .storage
        .keys()
        .await
        .unwrap()
        .contains(&"cache_advisor_42".to_string()));

    let second = fx.fetcher.fetch_advisor("42").await.unwrap();
    assert_eq!(second.source, FetchSource::Cache);
    assert_eq!(second.data, first.data);

    fx.clock.advance_millis(600_001);
    let third = fx.fetcher.fetch_advisor("42").await.unwrap();
    assert_eq!(third.source, FetchSource::Legacy);
}

#[tokio::test]
async fn test_search_and_user_over_sqlite() {
    let fx = seeded_fixture().await;

    let results = fx
        .fetcher
        .search(&SearchParams {
            specialization: Some("Tax Planning".into()),
            ..SearchParams::default()
        })
        .await
        .unwrap();
    assert_eq!(results.source, FetchSource::Legacy);
    assert_eq!(results.data.total, 1);
    assert_eq!(results.data.advisors[0].id, "7");

    let user = fx.fetcher.fetch_user_profile("u1").await.unwrap();
    assert_eq!(user.source, FetchSource::Legacy);
    assert_eq!(user.data.bookmarks, vec!["7".to_string(), "42".to_string()]);
    assert_eq!(user.data.review_count, 2);
}
