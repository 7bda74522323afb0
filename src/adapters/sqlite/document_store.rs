//! SQLite implementation of the document store ports.
//!
//! Documents are JSON objects in the `documents` table. Predicates and
//! ordering are evaluated with SQLite's JSON1 functions.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteArguments;
use sqlx::query::QueryAs;
use sqlx::{Sqlite, SqlitePool};
use tracing::debug;

use crate::domain::models::{Document, DocumentQuery, DocumentRef, FilterOp};
use crate::domain::ports::{
    DocumentReader, DocumentStoreError, DocumentWriter, WriteBatch, UPDATED_AT_FIELD,
};

/// Document store over the `documents` table, one JSON body per row.
#[derive(Clone)]
pub struct SqliteDocumentStore {
    pool: SqlitePool,
}

impl SqliteDocumentStore {
    /// Wrap a migrated pool.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// Bind parameter for dynamically built queries.
#[derive(Debug, Clone, PartialEq)]
enum SqlParam {
    Text(String),
    Int(i64),
    Real(f64),
    Null,
}

impl From<&Value> for SqlParam {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Int(i64::from(*b)),
            Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Real(n.as_f64().unwrap_or_default()), Self::Int),
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }
}

fn bind_all<'q>(
    mut query: QueryAs<'q, Sqlite, (String, String), SqliteArguments<'q>>,
    params: Vec<SqlParam>,
) -> QueryAs<'q, Sqlite, (String, String), SqliteArguments<'q>> {
    for param in params {
        query = match param {
            SqlParam::Text(s) => query.bind(s),
            SqlParam::Int(i) => query.bind(i),
            SqlParam::Real(f) => query.bind(f),
            SqlParam::Null => query.bind(Option::<String>::None),
        };
    }
    query
}

/// JSON path for a top-level field, quoted so any field name is addressable.
fn json_path(field: &str) -> String {
    format!("$.\"{}\"", field.replace('"', ""))
}

fn build_query(query: &DocumentQuery) -> (String, Vec<SqlParam>) {
    let mut sql = String::from("SELECT id, data FROM documents WHERE collection = ?");
    let mut params = vec![SqlParam::Text(query.collection.clone())];

    for predicate in &query.predicates {
        let path = SqlParam::Text(json_path(&predicate.field));
        let value = SqlParam::from(&predicate.value);

        match predicate.op.sql_operator() {
            Some(op) => {
                sql.push_str(&format!(" AND json_extract(data, ?) {op} ?"));
            }
            None => {
                debug_assert_eq!(predicate.op, FilterOp::ArrayContains);
                sql.push_str(
                    " AND EXISTS (SELECT 1 FROM json_each(data, ?) WHERE json_each.value = ?)",
                );
            }
        }
        params.push(path);
        params.push(value);
    }

    if let Some(order) = &query.order_by {
        let direction = if order.descending { "DESC" } else { "ASC" };
        sql.push_str(&format!(" ORDER BY json_extract(data, ?) {direction}, id ASC"));
        params.push(SqlParam::Text(json_path(&order.field)));
    } else {
        sql.push_str(" ORDER BY id ASC");
    }

    if let Some(limit) = query.limit {
        sql.push_str(" LIMIT ?");
        params.push(SqlParam::Int(i64::from(limit)));
    }

    (sql, params)
}

fn decode_row(collection: &str, id: String, data: &str) -> Result<Document, DocumentStoreError> {
    let data: Map<String, Value> = serde_json::from_str(data).map_err(|e| {
        DocumentStoreError::Malformed(format!("{collection}/{id}"), e.to_string())
    })?;
    Ok(Document::new(id, data))
}

#[async_trait]
impl DocumentReader for SqliteDocumentStore {
    async fn get_document(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Document>, DocumentStoreError> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT id, data FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(id, data)| decode_row(collection, id, &data)).transpose()
    }

    async fn query_documents(
        &self,
        query: &DocumentQuery,
    ) -> Result<Vec<Document>, DocumentStoreError> {
        let (sql, params) = build_query(query);
        let rows = bind_all(sqlx::query_as(&sql), params)
            .fetch_all(&self.pool)
            .await?;

        debug!(collection = %query.collection, rows = rows.len(), "documents queried");
        rows.into_iter()
            .map(|(id, data)| decode_row(&query.collection, id, &data))
            .collect()
    }
}

impl DocumentWriter for SqliteDocumentStore {
    fn open_batch(&self) -> Box<dyn WriteBatch> {
        Box::new(SqliteWriteBatch {
            pool: self.pool.clone(),
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

/// Buffered operations committed in a single transaction.
pub struct SqliteWriteBatch {
    pool: SqlitePool,
    ops: Vec<PendingOp>,
}

#[async_trait]
impl WriteBatch for SqliteWriteBatch {
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
        let now = Utc::now().to_rfc3339();
        let mut tx = self.pool.begin().await?;

        for op in &ops {
            match op {
                PendingOp::Set(target, data) => {
                    let mut data = data.clone();
                    data.insert(UPDATED_AT_FIELD.to_string(), Value::String(now.clone()));
                    sqlx::query(
                        r"INSERT INTO documents (collection, id, data, updated_at) VALUES (?, ?, ?, ?)
                          ON CONFLICT(collection, id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
                    )
                    .bind(&target.collection)
                    .bind(&target.id)
                    .bind(Value::Object(data).to_string())
                    .bind(&now)
                    .execute(&mut *tx)
                    .await?;
                }
                PendingOp::Update(target, data) => {
                    let stored: Option<String> =
                        sqlx::query_scalar("SELECT data FROM documents WHERE collection = ? AND id = ?")
                            .bind(&target.collection)
                            .bind(&target.id)
                            .fetch_optional(&mut *tx)
                            .await?;
                    // Dropping the transaction rolls the batch back.
                    let stored = stored.ok_or_else(|| DocumentStoreError::NotFound(target.to_string()))?;
                    let mut merged: Map<String, Value> = serde_json::from_str(&stored)
                        .map_err(|e| DocumentStoreError::Malformed(target.to_string(), e.to_string()))?;
                    merged.extend(data.clone());
                    merged.insert(UPDATED_AT_FIELD.to_string(), Value::String(now.clone()));

                    sqlx::query("UPDATE documents SET data = ?, updated_at = ? WHERE collection = ? AND id = ?")
                        .bind(Value::Object(merged).to_string())
                        .bind(&now)
                        .bind(&target.collection)
                        .bind(&target.id)
                        .execute(&mut *tx)
                        .await?;
                }
                PendingOp::Delete(target) => {
                    sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
                        .bind(&target.collection)
                        .bind(&target.id)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        debug!(operations = ops.len(), "document batch committed");
        Ok(ops.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;
    use crate::domain::models::Predicate;
    use serde_json::json;

    fn obj(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    async fn seeded_store() -> SqliteDocumentStore {
        let store = SqliteDocumentStore::new(create_migrated_test_pool().await.unwrap());
        let mut batch = store.open_batch();
        batch.set(
            &DocumentRef::new("advisors", "a1"),
            obj(json!({"name": "Cara", "location": "boston", "average_rating": 4.6, "specializations": ["tax"]})),
        );
        batch.set(
            &DocumentRef::new("advisors", "a2"),
            obj(json!({"name": "Abe", "location": "boston", "average_rating": 3.9, "specializations": ["estate"]})),
        );
        batch.set(
            &DocumentRef::new("advisors", "a3"),
            obj(json!({"name": "Bea", "location": "denver", "average_rating": 4.9, "specializations": ["tax"]})),
        );
        batch.commit().await.unwrap();
        store
    }

    #[test]
    fn test_build_query_shape() {
        let query = DocumentQuery::collection("advisors")
            .filter(Predicate::eq("location", "boston"))
            .filter(Predicate::new("specializations", FilterOp::ArrayContains, "tax"))
            .order_by("name", true)
            .limit(3);
        let (sql, params) = build_query(&query);

        assert!(sql.contains("json_extract(data, ?) = ?"));
        assert!(sql.contains("json_each(data, ?)"));
        assert!(sql.ends_with("ORDER BY json_extract(data, ?) DESC, id ASC LIMIT ?"));
        assert_eq!(params.len(), 7);
        assert_eq!(params[1], SqlParam::Text("$.\"location\"".into()));
        assert_eq!(params[6], SqlParam::Int(3));
    }

    #[tokio::test]
    async fn test_get_document() {
        let store = seeded_store().await;
        let doc = store.get_document("advisors", "a1").await.unwrap().unwrap();
        assert_eq!(doc.str_field("name"), Some("Cara"));
        assert!(doc.data.contains_key(UPDATED_AT_FIELD));
        assert!(store.get_document("advisors", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_query_with_predicates_and_order() {
        let store = seeded_store().await;

        let query = DocumentQuery::collection("advisors")
            .filter(Predicate::new("specializations", FilterOp::ArrayContains, "tax"))
            .filter(Predicate::new("average_rating", FilterOp::Gte, 4.5))
            .order_by("name", false);
        let docs = store.query_documents(&query).await.unwrap();
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["a3", "a1"]);

        let query = DocumentQuery::collection("advisors")
            .filter(Predicate::eq("location", "boston"))
            .limit(1);
        assert_eq!(store.query_documents(&query).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_merges_and_missing_update_rolls_back() {
        let store = seeded_store().await;

        let mut batch = store.open_batch();
        batch.update(&DocumentRef::new("advisors", "a1"), obj(json!({"location": "austin"})));
        batch.commit().await.unwrap();
        let doc = store.get_document("advisors", "a1").await.unwrap().unwrap();
        assert_eq!(doc.str_field("location"), Some("austin"));
        assert_eq!(doc.str_field("name"), Some("Cara"));

        let mut batch = store.open_batch();
        batch.delete(&DocumentRef::new("advisors", "a2"));
        batch.update(&DocumentRef::new("advisors", "ghost"), obj(json!({"x": 1})));
        let err = batch.commit().await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::NotFound(_)));
        assert!(store.get_document("advisors", "a2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_malformed_row_is_reported() {
        let pool = create_migrated_test_pool().await.unwrap();
        sqlx::query("INSERT INTO documents (collection, id, data, updated_at) VALUES ('c', 'x', 'not json', '')")
            .execute(&pool)
            .await
            .unwrap();
        let store = SqliteDocumentStore::new(pool);

        let err = store.get_document("c", "x").await.unwrap_err();
        assert!(matches!(err, DocumentStoreError::Malformed(..)));
    }
}
