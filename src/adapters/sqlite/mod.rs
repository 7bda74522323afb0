//! SQLite adapters for the document store and cache storage.
//!
//! Both adapters share one pool and one schema: JSON documents live in
//! `documents`, cache entries in `kv_storage`.

pub mod connection;
pub mod document_store;
pub mod kv_storage;
pub mod migrations;

pub use connection::{create_pool, create_test_pool, verify_connection, ConnectionError, PoolConfig};
pub use document_store::{SqliteDocumentStore, SqliteWriteBatch};
pub use kv_storage::SqliteKeyValueStorage;
pub use migrations::{Migration, MigrationError, Migrator, MIGRATIONS};

use sqlx::SqlitePool;

/// Failure to bring up the cache database.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Pool could not be opened
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    /// Schema could not be migrated
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
}

/// Open (creating if needed) the database at `database_url` and bring its
/// schema up to date.
pub async fn initialize_database(database_url: &str, config: Option<PoolConfig>) -> Result<SqlitePool, DatabaseError> {
    migrated(create_pool(database_url, config).await?).await
}

/// In-memory pool with the full schema, for tests.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    migrated(create_test_pool().await?).await
}

async fn migrated(pool: SqlitePool) -> Result<SqlitePool, DatabaseError> {
    Migrator::new(pool.clone()).migrate(MIGRATIONS).await?;
    Ok(pool)
}
