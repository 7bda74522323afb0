//! Connection pools for the cache database.
//!
//! File databases run in WAL mode so the sweeper and foreground reads do not
//! block each other. Tests use a single-connection in-memory database.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::domain::models::DatabaseConfig;

const MEMORY_URL: &str = "sqlite::memory:";

/// Errors opening the cache database.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// URL could not be parsed as SQLite connect options
    #[error("Invalid database URL: {0}")]
    InvalidUrl(String),
    /// Parent directory of the database file could not be created
    #[error("Cannot create database directory {path}: {source}")]
    Directory {
        /// Directory that could not be created
        path: String,
        /// Filesystem error
        #[source]
        source: std::io::Error,
    },
    /// SQLite refused the connection
    #[error("Cannot open database: {0}")]
    Open(#[source] sqlx::Error),
}

/// Pool sizing; `max_connections` comes from `database.max_connections`.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Upper bound on pooled connections
    pub max_connections: u32,
    /// Connections kept open while idle
    pub min_connections: u32,
    /// How long to wait for a free connection
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(3),
        }
    }
}

impl From<&DatabaseConfig> for PoolConfig {
    fn from(config: &DatabaseConfig) -> Self {
        Self {
            max_connections: config.max_connections,
            ..Self::default()
        }
    }
}

fn parse_url(database_url: &str) -> Result<SqliteConnectOptions, ConnectionError> {
    SqliteConnectOptions::from_str(database_url).map_err(|_| ConnectionError::InvalidUrl(database_url.to_string()))
}

/// Open a file-backed pool, creating the file and its directory if missing.
pub async fn create_pool(database_url: &str, config: Option<PoolConfig>) -> Result<SqlitePool, ConnectionError> {
    let config = config.unwrap_or_default();
    create_parent_dir(database_url)?;

    let options = parse_url(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(Duration::from_secs(30));

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_with(options)
        .await
        .map_err(ConnectionError::Open)?;

    debug!(database_url, max_connections = config.max_connections, "sqlite pool created");
    Ok(pool)
}

/// Single-connection in-memory pool. The database lives as long as the pool.
pub async fn create_test_pool() -> Result<SqlitePool, ConnectionError> {
    let options = parse_url(MEMORY_URL)?.synchronous(SqliteSynchronous::Normal);

    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .map_err(ConnectionError::Open)
}

fn create_parent_dir(database_url: &str) -> Result<(), ConnectionError> {
    let path = ["sqlite://", "sqlite:"]
        .iter()
        .find_map(|scheme| database_url.strip_prefix(scheme))
        .unwrap_or(database_url);
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }

    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent).map_err(|source| ConnectionError::Directory {
                path: parent.display().to_string(),
                source,
            })
        }
        _ => Ok(()),
    }
}

/// Round-trip a trivial query to prove the pool is usable.
pub async fn verify_connection(pool: &SqlitePool) -> Result<(), ConnectionError> {
    sqlx::query("SELECT 1").execute(pool).await.map_err(ConnectionError::Open)?;
    Ok(())
}
