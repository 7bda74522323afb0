//! Both document store adapters must agree on write semantics.

mod common;

use advisor_cache::adapters::memory::InMemoryDocumentStore;
use advisor_cache::adapters::sqlite::{create_migrated_test_pool, SqliteDocumentStore};
use advisor_cache::domain::models::DocumentRef;
use advisor_cache::domain::ports::{DocumentReader, DocumentWriter, UPDATED_AT_FIELD};
use serde_json::{json, Map, Value};

use common::obj;

/// Set a document, update it with a nested object and a null, and return
/// the stored body without the commit stamp.
async fn set_then_update<S: DocumentReader + DocumentWriter>(store: &S) -> Map<String, Value> {
    let target = DocumentRef::new("users", "u1");

    let mut batch = store.open_batch();
    batch.set(
        &target,
        obj(json!({"address": {"city": "Boston", "zip": "02110"}, "phone": "555", "name": "Robin"})),
    );
    batch.commit().await.unwrap();

    let mut batch = store.open_batch();
    batch.update(&target, obj(json!({"address": {"city": "Denver"}, "phone": null})));
    batch.commit().await.unwrap();

    let mut data = store.get_document("users", "u1").await.unwrap().unwrap().data;
    assert!(data.remove(UPDATED_AT_FIELD).is_some());
    data
}

#[tokio::test]
async fn test_update_replaces_top_level_fields_in_both_adapters() {
    let expected = obj(json!({"address": {"city": "Denver"}, "phone": null, "name": "Robin"}));

    let memory = set_then_update(&InMemoryDocumentStore::new()).await;
    assert_eq!(memory, expected);

    let sqlite = SqliteDocumentStore::new(create_migrated_test_pool().await.unwrap());
    let sqlite = set_then_update(&sqlite).await;
    assert_eq!(sqlite, expected);
}
