//! Batched write CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::PathBuf;

use super::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{BatchIntent, BatchReport};
use crate::infrastructure::config::ConfigLoader;
use crate::services::BatchedWriter;

/// Arguments for `advisor-cache batch`.
#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Batch subcommand to run
    #[command(subcommand)]
    pub command: BatchCommands,
}

/// Batched write subcommands.
#[derive(Subcommand, Debug)]
pub enum BatchCommands {
    /// Apply a JSON array of write intents
    Apply {
        /// File holding `[{"kind": "set", "target": {...}, "payload": {...}}, ...]`
        file: PathBuf,
        /// Override batch.max_operations for this run (1..=500)
        #[arg(long, value_parser = parse_max_operations)]
        max_operations: Option<usize>,
    },
}

/// Result of `batch apply`.
#[derive(Debug, serde::Serialize)]
pub struct BatchApplyOutput {
    /// Whether the batch was applied
    pub success: bool,
    /// Intents read from the input file
    pub intents: usize,
    /// Chunks committed
    pub chunks: usize,
    /// Operations committed
    pub operations: usize,
}

impl CommandOutput for BatchApplyOutput {
    fn to_human(&self) -> String {
        if self.intents == 0 {
            return "No intents to apply.".to_string();
        }
        format!(
            "Applied {} operation(s) in {} chunk(s).",
            self.operations, self.chunks
        )
    }
}

/// Same bounds as `batch.max_operations` in the config file.
fn parse_max_operations(raw: &str) -> Result<usize, String> {
    let value: usize = raw.parse().map_err(|e| format!("{e}"))?;
    ConfigLoader::validate_batch_size(value).map_err(|e| e.to_string())?;
    Ok(value)
}

/// Parse an intent file body.
pub fn parse_intents(content: &str) -> Result<Vec<BatchIntent>> {
    serde_json::from_str(content).context("Intent file must be a JSON array of write intents")
}

/// Run a batch subcommand.
pub async fn execute(args: BatchArgs, json_mode: bool) -> Result<()> {
    match args.command {
        BatchCommands::Apply {
            file,
            max_operations,
        } => {
            let content = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let intents = parse_intents(&content)?;

            let ctx = AppContext::open().await?;
            let writer = match max_operations {
                Some(max) => BatchedWriter::new(ctx.documents.clone(), max),
                None => ctx.batch_writer(),
            };

            let BatchReport { chunks, operations } = writer.apply_batch(&intents).await?;
            let out = BatchApplyOutput {
                success: true,
                intents: intents.len(),
                chunks,
                operations,
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}
