//! Search autocomplete suggestions.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Field a suggestion was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    /// Advisor name
    Name,
    /// Location
    Location,
    /// Specialization
    Specialization,
}

impl fmt::Display for SuggestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Name => "name",
            Self::Location => "location",
            Self::Specialization => "specialization",
        };
        f.write_str(label)
    }
}

/// One autocomplete candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    /// Source list
    pub kind: SuggestionKind,
    /// Suggested text, as stored
    pub text: String,
}

/// Prebuilt lists of known advisor names, locations and specializations.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SuggestionIndex {
    /// Advisor names
    #[serde(default)]
    pub names: Vec<String>,
    /// Known locations
    #[serde(default)]
    pub locations: Vec<String>,
    /// Known specializations
    #[serde(default)]
    pub specializations: Vec<String>,
}

impl SuggestionIndex {
    /// Index used when no suggestion document has been published.
    pub fn fallback() -> Self {
        let owned = |items: &[&str]| items.iter().map(|s| (*s).to_string()).collect();
        Self {
            names: Vec::new(),
            locations: owned(&[
                "New York, NY",
                "Los Angeles, CA",
                "Chicago, IL",
                "Houston, TX",
                "Boston, MA",
                "San Francisco, CA",
            ]),
            specializations: owned(&[
                "Retirement Planning",
                "Tax Planning",
                "Estate Planning",
                "Investment Management",
                "Insurance",
                "College Savings",
            ]),
        }
    }

    /// Case-insensitive substring matches, names first, then locations, then
    /// specializations. Duplicates within a kind are dropped.
    pub fn filter(&self, text: &str, limit: usize) -> Vec<Suggestion> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() || limit == 0 {
            return Vec::new();
        }

        let groups = [
            (SuggestionKind::Name, &self.names),
            (SuggestionKind::Location, &self.locations),
            (SuggestionKind::Specialization, &self.specializations),
        ];

        let mut seen: HashSet<(SuggestionKind, String)> = HashSet::new();
        let mut out = Vec::new();

        for (kind, items) in groups {
            for item in items {
                let lowered = item.to_lowercase();
                if !lowered.contains(&needle) || !seen.insert((kind, lowered)) {
                    continue;
                }
                out.push(Suggestion {
                    kind,
                    text: item.clone(),
                });
                if out.len() == limit {
                    return out;
                }
            }
        }

        out
    }
}
