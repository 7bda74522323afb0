//! CLI command implementations.

pub mod advisor;
pub mod batch;
pub mod cache;
pub mod init;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::adapters::sqlite::{initialize_database, PoolConfig, SqliteDocumentStore, SqliteKeyValueStorage};
use crate::domain::models::Config;
use crate::domain::ports::SystemClock;
use crate::infrastructure::config::ConfigLoader;
use crate::services::{BatchedWriter, ExpiringStore, TieredFetcher};

/// Wired-up services backed by the project database.
pub struct AppContext {
    /// Effective configuration
    pub config: Config,
    /// Namespaced expiring cache
    pub cache: Arc<ExpiringStore<SqliteKeyValueStorage>>,
    /// Document store sharing the cache's pool
    pub documents: Arc<SqliteDocumentStore>,
}

impl AppContext {
    /// Load configuration and open the configured database.
    pub async fn open() -> Result<Self> {
        let config = ConfigLoader::load().context("Failed to load configuration")?;
        Self::with_config(config).await
    }

    /// Open the database named by an already loaded configuration.
    pub async fn with_config(config: Config) -> Result<Self> {
        let pool = initialize_database(&config.database.url(), Some(PoolConfig::from(&config.database)))
            .await
            .context("Failed to initialize database. Run 'advisor-cache init' first.")?;

        let storage = Arc::new(SqliteKeyValueStorage::new(pool.clone()));
        let cache = Arc::new(ExpiringStore::from_config(
            storage,
            Arc::new(SystemClock),
            &config.cache,
        ));

        Ok(Self {
            config,
            cache,
            documents: Arc::new(SqliteDocumentStore::new(pool)),
        })
    }

    /// Tiered fetcher over this context's cache and documents.
    pub fn fetcher(&self) -> TieredFetcher<SqliteKeyValueStorage, SqliteDocumentStore> {
        TieredFetcher::new(
            self.cache.clone(),
            self.documents.clone(),
            self.config.cache.clone(),
            self.config.fetch.clone(),
        )
    }

    /// Batched writer honoring `batch.max_operations`.
    pub fn batch_writer(&self) -> BatchedWriter<SqliteDocumentStore> {
        BatchedWriter::from_config(self.documents.clone(), &self.config.batch)
    }
}
