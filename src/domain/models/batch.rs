//! Write intents and the outcome of batched commits.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::document::DocumentRef;

/// Kind of write an intent performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchIntentKind {
    /// Create or replace
    Set,
    /// Replace top-level fields of an existing document
    Update,
    /// Remove
    Delete,
}

/// One requested write. `set` and `update` need an object payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchIntent {
    /// Write to perform
    pub kind: BatchIntentKind,
    /// Document written
    pub target: DocumentRef,
    /// Body for `set` and `update`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Map<String, Value>>,
}

impl BatchIntent {
    /// Intent to create or replace `target`.
    pub fn set(target: DocumentRef, payload: Map<String, Value>) -> Self {
        Self {
            kind: BatchIntentKind::Set,
            target,
            payload: Some(payload),
        }
    }

    /// Intent to replace top-level fields of `target`.
    pub fn update(target: DocumentRef, payload: Map<String, Value>) -> Self {
        Self {
            kind: BatchIntentKind::Update,
            target,
            payload: Some(payload),
        }
    }

    /// Intent to delete `target`.
    pub const fn delete(target: DocumentRef) -> Self {
        Self {
            kind: BatchIntentKind::Delete,
            target,
            payload: None,
        }
    }
}

/// Outcome of a fully committed `apply_batch` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchReport {
    /// Chunks committed
    pub chunks: usize,
    /// Operations committed
    pub operations: usize,
}

/// A chunk whose commit failed. Its operations were rolled back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkFailure {
    /// Position of the chunk in commit order
    pub chunk: usize,
    /// Index of the first intent in the chunk
    pub start: usize,
    /// Number of intents in the chunk
    pub len: usize,
    /// Store error that rejected the chunk
    pub error: String,
}

/// Partial failure of a multi-chunk write. Chunks not listed were committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Operations in chunks that did commit
    pub committed_operations: usize,
    /// Chunks that were rolled back
    pub failed_chunks: Vec<ChunkFailure>,
}

impl BatchFailure {
    /// Indices (into the caller's intent list) of writes that did not land.
    pub fn unconfirmed_intents(&self) -> Vec<usize> {
        self.failed_chunks
            .iter()
            .flat_map(|c| c.start..c.start + c.len)
            .collect()
    }
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} chunk(s) failed, {} operation(s) unconfirmed, {} committed",
            self.failed_chunks.len(),
            self.failed_chunks.iter().map(|c| c.len).sum::<usize>(),
            self.committed_operations
        )?;
        if let Some(first) = self.failed_chunks.first() {
            write!(f, " (chunk {}: {})", first.chunk, first.error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfirmed_intents() {
        let failure = BatchFailure {
            committed_operations: 450,
            failed_chunks: vec![ChunkFailure {
                chunk: 1,
                start: 450,
                len: 3,
                error: "boom".into(),
            }],
        };
        assert_eq!(failure.unconfirmed_intents(), vec![450, 451, 452]);
        assert_eq!(
            failure.to_string(),
            "1 chunk(s) failed, 3 operation(s) unconfirmed, 450 committed (chunk 1: boom)"
        );
    }

    #[test]
    fn test_intent_json_shape() {
        let intent: BatchIntent = serde_json::from_str(
            r#"{"kind":"delete","target":{"collection":"bookmarks","id":"b1"}}"#,
        )
        .unwrap();
        assert_eq!(intent, BatchIntent::delete(DocumentRef::new("bookmarks", "b1")));
    }
}
