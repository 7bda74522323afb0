//! CLI type definitions
//!
//! This module contains the top-level clap structures. Each subcommand's
//! arguments live next to its implementation in `cli::commands`.

use clap::{Parser, Subcommand};

use super::commands::{advisor::AdvisorArgs, batch::BatchArgs, cache::CacheArgs, init::InitArgs};

/// Command-line interface for the advisor cache.
#[derive(Parser, Debug)]
#[command(name = "advisor-cache")]
#[command(about = "Advisor directory cache: TTL store, tiered fetching and batched writes", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write default configuration and create the database
    Init(InitArgs),

    /// Inspect and maintain the expiring cache
    Cache(CacheArgs),

    /// Fetch advisor directory resources through the cache
    Advisor(AdvisorArgs),

    /// Apply batched writes to the document store
    Batch(BatchArgs),
}
