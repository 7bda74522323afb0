//! SQLite implementation of the durable key/value primitive.

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::ports::{KeyValueStorage, StorageError};

/// Durable key/value storage in the `kv_storage` table.
#[derive(Clone)]
pub struct SqliteKeyValueStorage {
    pool: SqlitePool,
}

impl SqliteKeyValueStorage {
    /// Wrap a migrated pool.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl KeyValueStorage for SqliteKeyValueStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_storage WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(value,)| value))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO kv_storage (key, value) VALUES (?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM kv_storage WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, StorageError> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT key FROM kv_storage ORDER BY key")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(|(key,)| key).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    #[tokio::test]
    async fn test_upsert_and_keys() {
        let storage = SqliteKeyValueStorage::new(create_migrated_test_pool().await.unwrap());

        storage.set("cache_b", "1").await.unwrap();
        storage.set("cache_a", "2").await.unwrap();
        storage.set("cache_b", "3").await.unwrap();

        assert_eq!(storage.get("cache_b").await.unwrap().as_deref(), Some("3"));
        assert_eq!(storage.keys().await.unwrap(), vec!["cache_a", "cache_b"]);

        storage.remove("cache_a").await.unwrap();
        assert_eq!(storage.get("cache_a").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}", dir.path().join("kv.db").display());

        let pool = crate::adapters::sqlite::initialize_database(&url, None).await.unwrap();
        SqliteKeyValueStorage::new(pool.clone()).set("cache_k", "v").await.unwrap();
        pool.close().await;

        let pool = crate::adapters::sqlite::initialize_database(&url, None).await.unwrap();
        let value = SqliteKeyValueStorage::new(pool).get("cache_k").await.unwrap();
        assert_eq!(value.as_deref(), Some("v"));
    }
}
