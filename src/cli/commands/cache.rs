//! Cache maintenance CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value;
use std::time::Duration;

use super::AppContext;
use crate::cli::output::table::CacheKeyRow;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::ports::Clock;
use crate::services::{CacheSweeper, SweepReport, SweeperConfig};

/// Arguments for `advisor-cache cache`.
#[derive(Args, Debug)]
pub struct CacheArgs {
    /// Cache subcommand to run
    #[command(subcommand)]
    pub command: CacheCommands,
}

/// Cache maintenance subcommands.
#[derive(Subcommand, Debug)]
pub enum CacheCommands {
    /// Print a cached value
    Get {
        /// Cache key, without the namespace prefix
        key: String,
    },
    /// Store a value
    Set {
        /// Cache key, without the namespace prefix
        key: String,
        /// JSON value; anything that does not parse is stored as a string
        value: String,
        /// Time to live in seconds
        #[arg(long, default_value = "300")]
        ttl: u64,
    },
    /// Remove one entry
    Remove {
        /// Cache key, without the namespace prefix
        key: String,
    },
    /// Remove every entry whose key starts with PATTERN (all entries when omitted)
    Clear {
        /// Key prefix, without the namespace prefix
        #[arg(default_value = "")]
        pattern: String,
    },
    /// Delete expired and unreadable entries
    Sweep {
        /// Keep sweeping on the configured interval until interrupted
        #[arg(long)]
        watch: bool,
    },
    /// List cached keys with their remaining lifetime
    Keys,
}

/// Result of `cache get`.
#[derive(Debug, serde::Serialize)]
pub struct CacheValueOutput {
    /// Requested key
    pub key: String,
    /// Whether a live entry exists
    pub found: bool,
    /// Cached value, if found
    pub value: Option<Value>,
}

impl CommandOutput for CacheValueOutput {
    fn to_human(&self) -> String {
        match &self.value {
            Some(value) => serde_json::to_string_pretty(value).unwrap_or_default(),
            None => format!("No live entry for '{}'.", self.key),
        }
    }
}

/// Result of a cache mutation.
#[derive(Debug, serde::Serialize)]
pub struct CacheActionOutput {
    /// Whether the mutation succeeded
    pub success: bool,
    /// Summary for humans
    pub message: String,
    /// Entries removed, when the command counts them
    #[serde(skip_serializing_if = "Option::is_none")]
    pub removed: Option<u64>,
}

impl CommandOutput for CacheActionOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }
}

/// Result of `cache sweep`.
#[derive(Debug, serde::Serialize)]
pub struct SweepOutput {
    /// Namespaced keys inspected
    pub scanned: usize,
    /// Entries past their expiry
    pub expired_removed: usize,
    /// Entries that failed to decode
    pub corrupt_removed: usize,
}

impl From<SweepReport> for SweepOutput {
    fn from(report: SweepReport) -> Self {
        Self {
            scanned: report.scanned,
            expired_removed: report.expired_removed,
            corrupt_removed: report.corrupt_removed,
        }
    }
}

impl CommandOutput for SweepOutput {
    fn to_human(&self) -> String {
        format!(
            "Scanned {} entr{}: removed {} expired, {} unreadable.",
            self.scanned,
            if self.scanned == 1 { "y" } else { "ies" },
            self.expired_removed,
            self.corrupt_removed
        )
    }
}

/// Result of `cache keys`.
#[derive(Debug, serde::Serialize)]
pub struct KeyListOutput {
    /// Live keys with remaining lifetime
    pub keys: Vec<CacheKeyRow>,
    /// Number of keys listed
    pub total: usize,
}

impl CommandOutput for KeyListOutput {
    fn to_human(&self) -> String {
        if self.keys.is_empty() {
            return "Cache is empty.".to_string();
        }
        format!(
            "{} cached key(s):\n{}",
            self.total,
            TableFormatter::new().format_cache_keys(&self.keys)
        )
    }
}

/// Run a cache subcommand.
pub async fn execute(args: CacheArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open().await?;
    let cache = &ctx.cache;

    match args.command {
        CacheCommands::Get { key } => {
            let value = cache.get_value(&key).await.context("Failed to read cache")?;
            let out = CacheValueOutput {
                found: value.is_some(),
                key,
                value,
            };
            output(&out, json_mode);
        }

        CacheCommands::Set { key, value, ttl } => {
            let value = serde_json::from_str(&value).unwrap_or(Value::String(value));
            cache
                .set_value(&key, value, Duration::from_secs(ttl))
                .await
                .with_context(|| format!("Failed to cache '{key}'"))?;
            let out = CacheActionOutput {
                success: true,
                message: format!("Cached '{key}' for {ttl}s."),
                removed: None,
            };
            output(&out, json_mode);
        }

        CacheCommands::Remove { key } => {
            cache.remove(&key).await?;
            let out = CacheActionOutput {
                success: true,
                message: format!("Removed '{key}'."),
                removed: None,
            };
            output(&out, json_mode);
        }

        CacheCommands::Clear { pattern } => {
            let removed = cache.clear(&pattern).await?;
            let scope = if pattern.is_empty() {
                "the cache".to_string()
            } else {
                format!("keys starting with '{pattern}'")
            };
            let out = CacheActionOutput {
                success: true,
                message: format!("Removed {removed} entr{} from {scope}.", if removed == 1 { "y" } else { "ies" }),
                removed: u64::try_from(removed).ok(),
            };
            output(&out, json_mode);
        }

        CacheCommands::Sweep { watch: false } => {
            let report = cache.clear_expired().await?;
            output(&SweepOutput::from(report), json_mode);
        }

        CacheCommands::Sweep { watch: true } => {
            let config = SweeperConfig::from(&ctx.config.cache);
            let handle = CacheSweeper::new(cache.clone(), config).start();
            tokio::signal::ctrl_c()
                .await
                .context("Failed to listen for interrupt")?;

            let status = handle.status().await;
            handle.stop().await;
            let out = CacheActionOutput {
                success: true,
                message: format!(
                    "Sweeper stopped after {} sweep(s), {} entr{} removed.",
                    status.successful_runs,
                    status.total_removed,
                    if status.total_removed == 1 { "y" } else { "ies" }
                ),
                removed: Some(status.total_removed),
            };
            output(&out, json_mode);
        }

        CacheCommands::Keys => {
            let now = cache.clock().now_millis();
            let mut rows = Vec::new();
            for key in cache.keys().await? {
                let expires_in_secs = cache
                    .get_entry(&key)
                    .await?
                    .map(|entry| entry.remaining_ms(now) / 1000);
                rows.push(CacheKeyRow { key, expires_in_secs });
            }
            let out = KeyListOutput {
                total: rows.len(),
                keys: rows,
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}
