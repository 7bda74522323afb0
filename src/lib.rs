//! Advisor Cache - read-through caching for an advisor directory
//!
//! A TTL cache over a durable key/value store, a tiered fetcher that serves
//! advisor profiles, search results, user profiles and search suggestions
//! from cache, then a denormalized document, then a multi-query legacy
//! aggregation, and a batched writer that splits large write sets into
//! store-sized atomic chunks.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Adapters** (`adapters`): SQLite and in-memory implementations of the ports
//! - **Service Layer** (`services`): expiring store, sweeper, tiered fetcher, batch writer
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use advisor_cache::adapters::memory::{InMemoryDocumentStore, InMemoryKeyValueStorage};
//! use advisor_cache::domain::ports::SystemClock;
//! use advisor_cache::services::{ExpiringStore, TieredFetcher};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let cache = Arc::new(ExpiringStore::new(
//!         Arc::new(InMemoryKeyValueStorage::new()),
//!         Arc::new(SystemClock),
//!     ));
//!     let fetcher = TieredFetcher::with_defaults(cache, Arc::new(InMemoryDocumentStore::new()));
//!     let advisor = fetcher.fetch_advisor("42").await?;
//!     println!("{} from {}", advisor.data.id, advisor.source);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    BatchFailure, BatchIntent, BatchReport, CacheEntry, Config, FetchResult, FetchSource,
    ResourceKind,
};
pub use domain::ports::{
    Clock, DocumentReader, DocumentStoreError, DocumentWriter, KeyValueStorage, WriteBatch,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{BatchedWriter, CacheSweeper, ExpiringStore, TieredFetcher};
