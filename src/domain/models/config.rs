//! Application configuration model.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use super::resource::ResourceKind;

/// Main configuration structure for the advisor cache
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Cache namespace, TTLs and sweep schedule
    #[serde(default)]
    pub cache: CacheConfig,

    /// Batched writer limits
    #[serde(default)]
    pub batch: BatchConfig,

    /// Tiered fetch policy
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".advisor-cache/advisor-cache.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// `sqlx` connection URL for the configured path.
    pub fn url(&self) -> String {
        if self.path.starts_with("sqlite:") {
            self.path.clone()
        } else {
            format!("sqlite:{}", self.path)
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Number of days to retain logs
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,

    /// Directory for rotated log files; stdout only when unset
    #[serde(default)]
    pub log_dir: Option<PathBuf>,

    /// Rotation policy for file output: daily, hourly, never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

const fn default_retention_days() -> u32 {
    30
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            retention_days: default_retention_days(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CacheConfig {
    /// Prefix applied to every key the cache writes to storage
    #[serde(default = "default_namespace_prefix")]
    pub namespace_prefix: String,

    /// Seconds between expired-entry sweeps
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Run one sweep as soon as the sweeper starts
    #[serde(default = "default_true")]
    pub sweep_on_startup: bool,

    /// TTL for advisor profiles
    #[serde(default = "default_advisor_ttl_secs")]
    pub advisor_ttl_secs: u64,

    /// TTL for search result sets
    #[serde(default = "default_search_ttl_secs")]
    pub search_ttl_secs: u64,

    /// TTL for the suggestion index
    #[serde(default = "default_suggestions_ttl_secs")]
    pub suggestions_ttl_secs: u64,

    /// TTL for user profiles
    #[serde(default = "default_user_profile_ttl_secs")]
    pub user_profile_ttl_secs: u64,
}

fn default_namespace_prefix() -> String {
    "cache_".to_string()
}

const fn default_sweep_interval_secs() -> u64 {
    300
}

const fn default_true() -> bool {
    true
}

const fn default_advisor_ttl_secs() -> u64 {
    600
}

const fn default_search_ttl_secs() -> u64 {
    900
}

const fn default_suggestions_ttl_secs() -> u64 {
    3600
}

const fn default_user_profile_ttl_secs() -> u64 {
    1800
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            namespace_prefix: default_namespace_prefix(),
            sweep_interval_secs: default_sweep_interval_secs(),
            sweep_on_startup: true,
            advisor_ttl_secs: default_advisor_ttl_secs(),
            search_ttl_secs: default_search_ttl_secs(),
            suggestions_ttl_secs: default_suggestions_ttl_secs(),
            user_profile_ttl_secs: default_user_profile_ttl_secs(),
        }
    }
}

impl CacheConfig {
    /// TTL applied when caching a resource of `kind`.
    pub const fn ttl_for(&self, kind: ResourceKind) -> Duration {
        let secs = match kind {
            ResourceKind::AdvisorProfile => self.advisor_ttl_secs,
            ResourceKind::SearchResults => self.search_ttl_secs,
            ResourceKind::Suggestions => self.suggestions_ttl_secs,
            ResourceKind::UserProfile => self.user_profile_ttl_secs,
        };
        Duration::from_secs(secs)
    }

    /// Delay between background sweeps.
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// Batched writer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BatchConfig {
    /// Operations per atomic batch; the store rejects batches above 500
    #[serde(default = "default_max_operations")]
    pub max_operations: usize,
}

/// Hard ceiling imposed by the document store on a single batch.
pub const STORE_BATCH_LIMIT: usize = 500;

const fn default_max_operations() -> usize {
    450
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_operations: default_max_operations(),
        }
    }
}

/// Tiered fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct FetchConfig {
    /// Fall back to the legacy path when the optimized collection denies access
    #[serde(default)]
    pub fallback_on_permission_denied: bool,

    /// Search limit when the caller gives none
    #[serde(default = "default_search_limit")]
    pub default_search_limit: u32,

    /// Suggestions returned when the caller gives no limit
    #[serde(default = "default_suggestion_limit")]
    pub default_suggestion_limit: usize,
}

const fn default_search_limit() -> u32 {
    20
}

const fn default_suggestion_limit() -> usize {
    10
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            fallback_on_permission_denied: false,
            default_search_limit: default_search_limit(),
            default_suggestion_limit: default_suggestion_limit(),
        }
    }
}
