//! Cached resource families.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Family of cached resources. Each kind owns a key prefix and a TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Single advisor profile, keyed by advisor id
    AdvisorProfile,
    /// Search result set, keyed by canonical search parameters
    SearchResults,
    /// Suggestion index
    Suggestions,
    /// User profile, keyed by user id
    UserProfile,
}

impl ResourceKind {
    /// Key prefix used inside the cache namespace.
    pub const fn key_prefix(self) -> &'static str {
        match self {
            Self::AdvisorProfile => "advisor_",
            Self::SearchResults => "search_",
            Self::Suggestions => "suggestions_",
            Self::UserProfile => "user_",
        }
    }

    /// Cache key for the resource identified by `id`.
    pub fn cache_key(self, id: &str) -> String {
        format!("{}{}", self.key_prefix(), id)
    }

    /// Label used in errors and logs.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AdvisorProfile => "advisor profile",
            Self::SearchResults => "search results",
            Self::Suggestions => "suggestions",
            Self::UserProfile => "user profile",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
