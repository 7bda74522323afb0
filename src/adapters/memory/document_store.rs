//! In-memory document store, used by tests and ephemeral runs.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Arc, PoisonError, RwLock};

use crate::domain::models::{Document, DocumentQuery, DocumentRef};
use crate::domain::ports::{
    DocumentReader, DocumentStoreError, DocumentWriter, WriteBatch, UPDATED_AT_FIELD,
};

type Collections = HashMap<String, BTreeMap<String, Map<String, Value>>>;

/// Operation counters, handy for asserting how much I/O a caller caused.
#[derive(Debug, Default)]
pub struct StoreStats {
    /// Single-document reads
    pub gets: AtomicUsize,
    /// Query executions
    pub queries: AtomicUsize,
    /// Batches committed successfully
    pub commits: AtomicUsize,
}

impl StoreStats {
    /// Total reads of either kind.
    pub fn reads(&self) -> usize {
        self.gets.load(AtomicOrdering::SeqCst) + self.queries.load(AtomicOrdering::SeqCst)
    }

    /// Number of successful commits.
    pub fn commits(&self) -> usize {
        self.commits.load(AtomicOrdering::SeqCst)
    }
}

/// Process-local document store. Clones share the same data.
#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<Collections>>,
    stats: Arc<StoreStats>,
}

impl InMemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document directly, bypassing batches and counters.
    pub fn insert(&self, collection: &str, id: &str, data: Value) {
        let data = match data {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        self.collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), data);
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(collection)
            .map_or(0, BTreeMap::len)
    }

    /// Operation counters for this store and its clones.
    pub fn stats(&self) -> &StoreStats {
        &self.stats
    }
}

#[async_trait]
impl DocumentReader for InMemoryDocumentStore {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, DocumentStoreError> {
        self.stats.gets.fetch_add(1, AtomicOrdering::SeqCst);
        let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document::new(id, data.clone())))
    }

    async fn query_documents(
        &self,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        self.stats.queries.fetch_add(1, AtomicOrdering::SeqCst);
        let collections = self.collections.read().unwrap_or_else(PoisonError::into_inner);
        let Some(docs) = collections.get(&query.collection) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<Document> = docs
            .iter()
            .map(|(id, data)| Document::new(id.clone(), data.clone()))
            .filter(|doc| query.matches(doc))
            .collect();

        if let Some(order) = &query.order_by {
            matched.sort_by(|a, b| {
                let ord = compare_fields(a.data.get(&order.field), b.data.get(&order.field));
                if order.descending {
                    ord.reverse()
                } else {
                    ord
                }
            });
        }

        if let Some(limit) = query.limit {
            matched.truncate(limit as usize);
        }

        Ok(matched)
    }
}

/// Missing values sort last; numbers before strings.
fn compare_fields(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Number(_)), Some(_)) | (Some(_), None) => Ordering::Less,
        (Some(_), Some(Value::Number(_))) | (None, Some(_)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

impl DocumentWriter for InMemoryDocumentStore {
    fn open_batch(&self) -> Box<dyn WriteBatch> {
        Box::new(InMemoryWriteBatch {
            collections: self.collections.clone(),
            stats: self.stats.clone(),
            ops: Vec::new(),
        })
    }
}

#[derive(Debug)]
enum PendingOp {
    Set(DocumentRef, Map<String, Value>),
    Update(DocumentRef, Map<String, Value>),
    Delete(DocumentRef),
}

struct InMemoryWriteBatch {
    collections: Arc<RwLock<Collections>>,
    stats: Arc<StoreStats>,
    ops: Vec<PendingOp>,
}

#[async_trait]
impl WriteBatch for InMemoryWriteBatch {
    fn set(&mut self, target: &DocumentRef, data: Map<String, Value>) {
        self.ops.push(PendingOp::Set(target.clone(), data));
    }

    fn update(&mut self, target: &DocumentRef, data: Map<String, Value>) {
        self.ops.push(PendingOp::Update(target.clone(), data));
    }

    fn delete(&mut self, target: &DocumentRef) {
        self.ops.push(PendingOp::Delete(target.clone()));
    }

    fn len(&self) -> usize {
        self.ops.len()
    }

    async fn commit(&mut self) -> Result<usize, DocumentStoreError> {
        let ops = std::mem::take(&mut self.ops);
        let stamp = Value::String(Utc::now().to_rfc3339());
        let mut collections = self.collections.write().unwrap_or_else(PoisonError::into_inner);

        // Stage on a copy so a failing update leaves the store untouched.
        let mut staged = collections.clone();
        for op in &ops {
            match op {
                PendingOp::Set(target, data) => {
                    let mut data = data.clone();
                    data.insert(UPDATED_AT_FIELD.to_string(), stamp.clone());
                    staged
                        .entry(target.collection.clone())
                        .or_default()
                        .insert(target.id.clone(), data);
                }
                PendingOp::Update(target, data) => {
                    let existing = staged
                        .get_mut(&target.collection)
                        .and_then(|docs| docs.get_mut(&target.id))
                        .ok_or_else(|| DocumentStoreError::NotFound(target.to_string()))?;
                    existing.extend(data.clone());
                    existing.insert(UPDATED_AT_FIELD.to_string(), stamp.clone());
                }
                PendingOp::Delete(target) => {
                    if let Some(docs) = staged.get_mut(&target.collection) {
                        docs.remove(&target.id);
                    }
                }
            }
        }

        *collections = staged;
        self.stats.commits.fetch_add(1, AtomicOrdering::SeqCst);
        Ok(ops.len())
    }
}
