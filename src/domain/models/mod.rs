//! Domain models for the advisor cache.

pub mod advisor;
pub mod batch;
pub mod cache_entry;
pub mod config;
pub mod document;
pub mod fetch;
pub mod resource;
pub mod suggestion;

pub use advisor::{
    AdvisorProfile, AdvisorSummary, RatingSummary, Review, SearchParams, SearchResults,
    UserProfile,
};
pub use batch::{BatchFailure, BatchIntent, BatchIntentKind, BatchReport, ChunkFailure};
pub use cache_entry::CacheEntry;
pub use config::{
    BatchConfig, CacheConfig, Config, DatabaseConfig, FetchConfig, LoggingConfig,
    STORE_BATCH_LIMIT,
};
pub use document::{Document, DocumentQuery, DocumentRef, FilterOp, OrderBy, Predicate};
pub use fetch::{FetchResult, FetchSource};
pub use resource::ResourceKind;
pub use suggestion::{Suggestion, SuggestionIndex, SuggestionKind};
