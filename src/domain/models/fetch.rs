//! Fetch results tagged with the tier that served them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Which tier produced a fetched value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchSource {
    /// Served from the expiring cache
    Cache,
    /// Read from a denormalized collection
    Optimized,
    /// Assembled from the normalized collections
    Legacy,
}

impl fmt::Display for FetchSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cache => "cache",
            Self::Optimized => "optimized",
            Self::Legacy => "legacy",
        })
    }
}

/// Value plus the tier it came from. `data` has the same shape for every
/// source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchResult<T> {
    /// Tier that produced `data`
    pub source: FetchSource,
    /// Fetched value
    pub data: T,
}

impl<T> FetchResult<T> {
    /// Tag `data` with its source.
    pub const fn new(source: FetchSource, data: T) -> Self {
        Self { source, data }
    }

    /// Drop the source tag.
    pub fn into_data(self) -> T {
        self.data
    }

    /// Transform the value, keeping the source.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> FetchResult<U> {
        FetchResult {
            source: self.source,
            data: f(self.data),
        }
    }
}
