//! Advisor directory CLI commands, served through the tiered fetcher.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use super::AppContext;
use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{
    AdvisorProfile, FetchResult, FetchSource, SearchParams, SearchResults, Suggestion, UserProfile,
};

/// Arguments for `advisor-cache advisor`.
#[derive(Args, Debug)]
pub struct AdvisorArgs {
    /// Advisor subcommand to run
    #[command(subcommand)]
    pub command: AdvisorCommands,
}

/// Advisor directory subcommands.
#[derive(Subcommand, Debug)]
pub enum AdvisorCommands {
    /// Show one advisor profile
    Show {
        /// Advisor id
        id: String,
    },
    /// Search advisors
    Search {
        /// Substring of the advisor name
        #[arg(short, long)]
        query: Option<String>,
        /// Substring of the advisor location
        #[arg(short = 'L', long)]
        location: Option<String>,
        /// Specialization the advisor must list
        #[arg(short, long)]
        specialization: Option<String>,
        /// Lowest acceptable average rating
        #[arg(long)]
        min_rating: Option<f64>,
        /// Maximum results (defaults to fetch.default_search_limit)
        #[arg(short, long)]
        limit: Option<u32>,
    },
    /// Suggest names, locations and specializations for partial input
    Suggest {
        /// Partial input to complete
        text: String,
        /// Maximum suggestions (defaults to fetch.default_suggestion_limit)
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Show a user's profile with bookmarks
    User {
        /// User id
        uid: String,
    },
    /// Drop cached data so the next read goes to the store
    Invalidate {
        /// Advisor id; omit with --searches to only drop search results
        id: Option<String>,
        /// Treat the id as a user id
        #[arg(long)]
        user: bool,
        /// Also drop every cached search result set
        #[arg(long)]
        searches: bool,
    },
}

/// Fetched data plus the tier that answered.
#[derive(Debug, Serialize)]
pub struct FetchedOutput<T: Serialize> {
    /// Tier that answered
    pub source: FetchSource,
    /// Fetched payload
    #[serde(rename = "data")]
    pub result: T,
}

impl<T: Serialize> From<FetchResult<T>> for FetchedOutput<T> {
    fn from(fetched: FetchResult<T>) -> Self {
        Self {
            source: fetched.source,
            result: fetched.data,
        }
    }
}

impl CommandOutput for FetchedOutput<AdvisorProfile> {
    fn to_human(&self) -> String {
        let profile = &self.result;
        let mut lines = vec![
            format!("Advisor: {}", profile.name().unwrap_or(&profile.id)),
            format!("ID: {}", profile.id),
            format!("Registration: {}", profile.registration_number),
        ];
        if let Some(ref logo) = profile.logo_url {
            lines.push(format!("Logo: {logo}"));
        }
        lines.push(format!(
            "Rating: {:.1} ({} review(s))",
            profile.rating.average_rating, profile.rating.review_count
        ));
        for (stars, count) in profile.rating.histogram.iter().enumerate().rev() {
            lines.push(format!("  {}★ {count}", stars + 1));
        }
        if !profile.details.is_empty() {
            lines.push(format!("Details: {} field(s)", profile.details.len()));
        }
        lines.push(format!("\nSource: {}", self.source));
        lines.join("\n")
    }
}

impl CommandOutput for FetchedOutput<SearchResults> {
    fn to_human(&self) -> String {
        if self.result.advisors.is_empty() {
            return format!("No advisors found. (source: {})", self.source);
        }
        format!(
            "Showing {} of {} advisor(s) (source: {}):\n{}",
            self.result.advisors.len(),
            self.result.total,
            self.source,
            TableFormatter::new().format_advisors(&self.result.advisors)
        )
    }
}

impl CommandOutput for FetchedOutput<Vec<Suggestion>> {
    fn to_human(&self) -> String {
        if self.result.is_empty() {
            return "No suggestions.".to_string();
        }
        TableFormatter::new().format_suggestions(&self.result)
    }
}

impl CommandOutput for FetchedOutput<UserProfile> {
    fn to_human(&self) -> String {
        let user = &self.result;
        let mut lines = vec![
            format!("User: {}", user.id),
            format!("Reviews written: {}", user.review_count),
            format!("Bookmarks: {}", user.bookmarks.len()),
        ];
        lines.extend(user.bookmarks.iter().map(|id| format!("  - {id}")));
        lines.push(format!("\nSource: {}", self.source));
        lines.join("\n")
    }
}

/// Result of an invalidation.
#[derive(Debug, Serialize)]
pub struct InvalidateOutput {
    /// Whether anything was dropped
    pub success: bool,
    /// Summary for humans
    pub message: String,
}

impl CommandOutput for InvalidateOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }
}

/// Run an advisor subcommand.
pub async fn execute(args: AdvisorArgs, json_mode: bool) -> Result<()> {
    let ctx = AppContext::open().await?;
    let fetcher = ctx.fetcher();

    match args.command {
        AdvisorCommands::Show { id } => {
            let out = FetchedOutput::from(fetcher.fetch_advisor(&id).await?);
            output(&out, json_mode);
        }

        AdvisorCommands::Search {
            query,
            location,
            specialization,
            min_rating,
            limit,
        } => {
            let params = SearchParams {
                query,
                location,
                specialization,
                min_rating,
                limit,
            };
            let out = FetchedOutput::from(fetcher.search(&params).await?);
            output(&out, json_mode);
        }

        AdvisorCommands::Suggest { text, limit } => {
            let out = FetchedOutput::from(fetcher.suggest(&text, limit).await?);
            output(&out, json_mode);
        }

        AdvisorCommands::User { uid } => {
            let out = FetchedOutput::from(fetcher.fetch_user_profile(&uid).await?);
            output(&out, json_mode);
        }

        AdvisorCommands::Invalidate { id, user, searches } => {
            let mut dropped = Vec::new();
            if let Some(id) = id {
                if user {
                    fetcher.invalidate_user(&id).await?;
                    dropped.push(format!("user {id}"));
                } else {
                    fetcher.invalidate_advisor(&id).await?;
                    dropped.push(format!("advisor {id}"));
                }
            }
            if searches {
                let removed = fetcher.invalidate_searches().await?;
                dropped.push(format!("{removed} search result set(s)"));
            }
            let out = InvalidateOutput {
                success: !dropped.is_empty(),
                message: if dropped.is_empty() {
                    "Nothing to invalidate. Pass an id or --searches.".to_string()
                } else {
                    format!("Invalidated {}.", dropped.join(" and "))
                },
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}
