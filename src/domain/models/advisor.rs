//! Advisor directory payloads produced by the tiered fetcher.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single client review of an advisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Review document id
    pub id: String,
    /// Display name of the reviewer
    #[serde(default)]
    pub author: Option<String>,
    /// Star rating, 1 to 5
    pub rating: f64,
    /// Free-text review body
    #[serde(default)]
    pub comment: Option<String>,
    /// Creation time as stored
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Aggregates derived from an advisor's reviews.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RatingSummary {
    /// Reviews with a finite rating
    pub review_count: u32,

    /// Mean rating rounded to one decimal, 0.0 without reviews
    pub average_rating: f64,

    /// Review counts per star, index 0 is one star
    pub histogram: [u32; 5],
}

impl RatingSummary {
    /// Summarize `reviews`, skipping non-finite ratings.
    pub fn from_reviews(reviews: &[Review]) -> Self {
        let mut histogram = [0u32; 5];
        let mut total = 0.0;
        let mut count = 0u32;

        for review in reviews.iter().filter(|r| r.rating.is_finite()) {
            total += review.rating;
            count += 1;
            // Bucket index is clamped to 0..=4 before the cast.
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let bucket = (review.rating.round().clamp(1.0, 5.0) as usize) - 1;
            histogram[bucket] += 1;
        }

        let average_rating = if count == 0 {
            0.0
        } else {
            (total / f64::from(count) * 10.0).round() / 10.0
        };

        Self {
            review_count: count,
            average_rating,
            histogram,
        }
    }
}

/// Fully assembled advisor profile.
///
/// The denormalized `optimized_advisors` documents carry exactly this shape,
/// so both fetch tiers return the same type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorProfile {
    /// Advisor id
    pub id: String,
    /// Regulator registration number, used to find the logo
    pub registration_number: String,
    /// Primary advisor record
    pub record: Map<String, Value>,
    /// Logo image URL, when one is on file
    #[serde(default)]
    pub logo_url: Option<String>,
    /// Extended profile parts merged together
    #[serde(default)]
    pub details: Map<String, Value>,
    /// Reviews, newest first
    #[serde(default)]
    pub reviews: Vec<Review>,
    /// Aggregates over `reviews`
    #[serde(default)]
    pub rating: RatingSummary,
}

impl AdvisorProfile {
    /// Display name from the primary record.
    pub fn name(&self) -> Option<&str> {
        self.record.get("name").and_then(Value::as_str)
    }
}

/// Listing row in a search result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorSummary {
    /// Advisor id
    pub id: String,
    /// Display name
    pub name: String,
    /// City or region
    #[serde(default)]
    pub location: Option<String>,
    /// Areas of practice
    #[serde(default)]
    pub specializations: Vec<String>,
    /// Mean review rating, when known
    #[serde(default)]
    pub average_rating: Option<f64>,
    /// Number of reviews, when known
    #[serde(default)]
    pub review_count: Option<u32>,
}

/// Search filters. Text fields are compared case-insensitively.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchParams {
    /// Substring of the advisor name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Location substring
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Specialization the advisor must list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    /// Lowest acceptable average rating
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    /// Maximum rows returned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

impl SearchParams {
    /// Normalized copy: trimmed, lowercased, blank strings dropped.
    #[must_use]
    pub fn normalized(&self) -> Self {
        fn clean(value: Option<&String>) -> Option<String> {
            value
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
        }

        Self {
            query: clean(self.query.as_ref()),
            location: clean(self.location.as_ref()),
            specialization: clean(self.specialization.as_ref()),
            min_rating: self.min_rating.filter(|r| r.is_finite()),
            limit: self.limit,
        }
    }

    /// Stable identity of the search, shared by equivalent parameter sets.
    ///
    /// Field order follows the struct declaration, so the JSON encoding is
    /// deterministic.
    pub fn canonical_key(&self) -> String {
        serde_json::to_string(&self.normalized()).unwrap_or_default()
    }
}

/// Advisors matching a search.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SearchResults {
    /// Matching rows, at most the requested limit
    pub advisors: Vec<AdvisorSummary>,
    /// Matches before the limit was applied
    pub total: usize,
}

/// Signed-in user's profile with bookmark and review activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// User id
    pub id: String,
    /// Primary user record
    pub record: Map<String, Value>,
    /// Bookmarked advisor ids
    #[serde(default)]
    pub bookmarks: Vec<String>,
    /// Reviews written by the user
    #[serde(default)]
    pub review_count: u32,
}
