//! Embedded schema migrations for the cache database.
//!
//! Each migration runs in its own transaction together with the row that
//! records it in `schema_migrations`, so a failed migration leaves no trace.

use sqlx::SqlitePool;
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised while migrating the schema.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The `schema_migrations` table could not be created or read
    #[error("Failed to prepare migration bookkeeping: {0}")]
    Bookkeeping(#[source] sqlx::Error),
    /// A migration failed and was rolled back
    #[error("Migration {version} ({description}) failed: {source}")]
    Failed {
        /// Version of the failed migration
        version: i64,
        /// Its description
        description: &'static str,
        /// Underlying SQLite error
        #[source]
        source: sqlx::Error,
    },
}

/// One versioned schema change compiled into the binary.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    /// Monotonic version, recorded once applied
    pub version: i64,
    /// Human-readable summary
    pub description: &'static str,
    /// Statements executed as one script
    pub sql: &'static str,
}

/// Every schema change, in version order.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "documents and key/value storage",
    sql: include_str!("../../../migrations/001_initial_schema.sql"),
}];

/// Applies embedded migrations to a pool.
pub struct Migrator {
    pool: SqlitePool,
}

impl Migrator {
    /// Create a migrator for `pool`.
    pub const fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Apply every migration not yet recorded. Returns the versions applied.
    pub async fn migrate(&self, migrations: &[Migration]) -> Result<Vec<i64>, MigrationError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                applied_at TEXT NOT NULL DEFAULT (datetime('now'))
            )",
        )
        .execute(&self.pool)
        .await
        .map_err(MigrationError::Bookkeeping)?;

        let applied = self.applied_versions().await?;
        let mut newly_applied = Vec::new();
        for migration in migrations.iter().filter(|m| !applied.contains(&m.version)) {
            self.apply(migration).await?;
            info!(version = migration.version, description = migration.description, "migration applied");
            newly_applied.push(migration.version);
        }

        debug!(pending = newly_applied.len(), "schema up to date");
        Ok(newly_applied)
    }

    /// Versions already recorded in `schema_migrations`.
    pub async fn applied_versions(&self) -> Result<HashSet<i64>, MigrationError> {
        let rows: Vec<(i64,)> = sqlx::query_as("SELECT version FROM schema_migrations")
            .fetch_all(&self.pool)
            .await
            .map_err(MigrationError::Bookkeeping)?;
        Ok(rows.into_iter().map(|(version,)| version).collect())
    }

    async fn apply(&self, migration: &Migration) -> Result<(), MigrationError> {
        let failed = |source| MigrationError::Failed {
            version: migration.version,
            description: migration.description,
            source,
        };

        let mut tx = self.pool.begin().await.map_err(failed)?;
        sqlx::raw_sql(migration.sql).execute(&mut *tx).await.map_err(failed)?;
        sqlx::query("INSERT INTO schema_migrations (version, description) VALUES (?, ?)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(failed)?;
        tx.commit().await.map_err(failed)
    }
}
