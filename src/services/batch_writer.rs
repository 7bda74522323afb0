//! Chunked batch writes against the document store.
//!
//! The store caps a single atomic batch at [`STORE_BATCH_LIMIT`] operations.
//! `apply_batch` splits a caller's intents into chunks of at most
//! `max_operations`, commits the chunks concurrently and reports which chunks
//! did not land. Atomicity holds per chunk only.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    BatchConfig, BatchFailure, BatchIntent, BatchIntentKind, BatchReport, ChunkFailure,
    STORE_BATCH_LIMIT,
};
use crate::domain::ports::{DocumentWriter, WriteBatch};

/// Applies write intents in store-sized atomic chunks.
pub struct BatchedWriter<W: DocumentWriter> {
    writer: Arc<W>,
    max_operations: usize,
}

impl<W: DocumentWriter> BatchedWriter<W> {
    /// `max_operations` is clamped to `1..=STORE_BATCH_LIMIT`.
    pub fn new(writer: Arc<W>, max_operations: usize) -> Self {
        Self {
            writer,
            max_operations: max_operations.clamp(1, STORE_BATCH_LIMIT),
        }
    }

    /// Writer using `batch.max_operations`.
    pub fn from_config(writer: Arc<W>, config: &BatchConfig) -> Self {
        Self::new(writer, config.max_operations)
    }

    /// Effective operations per chunk.
    pub const fn max_operations(&self) -> usize {
        self.max_operations
    }

    /// Commit `intents`, chunked.
    ///
    /// Payloads are validated before anything is committed. If any chunk
    /// fails the error carries the failed chunks and how many operations
    /// from the other chunks were committed.
    #[instrument(skip(self, intents), fields(intents = intents.len()))]
    pub async fn apply_batch(&self, intents: &[BatchIntent]) -> DomainResult<BatchReport> {
        validate(intents)?;
        if intents.is_empty() {
            return Ok(BatchReport::default());
        }

        let mut batches: Vec<Box<dyn WriteBatch>> = intents
            .chunks(self.max_operations)
            .map(|chunk| self.stage(chunk))
            .collect();
        let chunks = batches.len();
        debug!(chunks, max_operations = self.max_operations, "committing chunks");

        let results = join_all(batches.iter_mut().map(|batch| batch.commit())).await;

        let mut committed_operations = 0;
        let mut failed_chunks = Vec::new();
        for (chunk, result) in results.into_iter().enumerate() {
            let start = chunk * self.max_operations;
            let len = self.max_operations.min(intents.len() - start);
            match result {
                Ok(applied) => committed_operations += applied,
                Err(e) => {
                    error!(chunk, start, len, error = %e, "batch chunk commit failed");
                    failed_chunks.push(ChunkFailure {
                        chunk,
                        start,
                        len,
                        error: e.to_string(),
                    });
                }
            }
        }

        if !failed_chunks.is_empty() {
            return Err(DomainError::BatchCommitFailed(BatchFailure {
                committed_operations,
                failed_chunks,
            }));
        }

        info!(chunks, operations = committed_operations, "batch applied");
        Ok(BatchReport {
            chunks,
            operations: committed_operations,
        })
    }

    fn stage(&self, chunk: &[BatchIntent]) -> Box<dyn WriteBatch> {
        let mut batch = self.writer.open_batch();
        for intent in chunk {
            let payload = intent.payload.clone().unwrap_or_default();
            match intent.kind {
                BatchIntentKind::Set => batch.set(&intent.target, payload),
                BatchIntentKind::Update => batch.update(&intent.target, payload),
                BatchIntentKind::Delete => batch.delete(&intent.target),
            }
        }
        batch
    }
}

fn validate(intents: &[BatchIntent]) -> DomainResult<()> {
    for (index, intent) in intents.iter().enumerate() {
        if intent.target.collection.is_empty() || intent.target.id.is_empty() {
            return Err(DomainError::ValidationFailed(format!(
                "intent {index}: target needs a collection and an id"
            )));
        }
        let needs_payload = matches!(intent.kind, BatchIntentKind::Set | BatchIntentKind::Update);
        if needs_payload && intent.payload.is_none() {
            return Err(DomainError::ValidationFailed(format!(
                "intent {index}: {:?} on {} needs a payload",
                intent.kind, intent.target
            )));
        }
    }
    Ok(())
}
