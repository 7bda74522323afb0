use serde_json::Value;
use tracing::{debug, instrument};

use super::collections::{ADVISORS, OPTIMIZED_SEARCH};
use super::TieredFetcher;
use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AdvisorSummary, Document, DocumentQuery, FetchResult, FilterOp, Predicate, ResourceKind,
    SearchParams, SearchResults,
};
use crate::domain::ports::{DocumentReader, KeyValueStorage};

impl<S, D> TieredFetcher<S, D>
where
    S: KeyValueStorage,
    D: DocumentReader,
{
    /// Search results for `params`, cached under their canonical key.
    #[instrument(skip(self))]
    pub async fn search(&self, params: &SearchParams) -> DomainResult<FetchResult<SearchResults>> {
        let canonical = params.canonical_key();
        self.read_through(
            ResourceKind::SearchResults,
            &canonical,
            OPTIMIZED_SEARCH,
            self.legacy_search(params),
        )
        .await
    }

    /// Query the advisors collection directly.
    ///
    /// The rating floor is pushed to the store; text filters are matched
    /// case-insensitively here. `total` counts matches before the limit.
    pub async fn legacy_search(&self, params: &SearchParams) -> DomainResult<SearchResults> {
        let params = params.normalized();
        let limit = params.limit.unwrap_or(self.fetch_config.default_search_limit) as usize;

        let mut query = DocumentQuery::collection(ADVISORS).order_by("name", false);
        if let Some(min_rating) = params.min_rating {
            query = query.filter(Predicate::new("average_rating", FilterOp::Gte, min_rating));
        }

        let docs = self.reader.query_documents(&query).await?;
        let mut advisors: Vec<AdvisorSummary> = docs
            .into_iter()
            .map(summary_from_document)
            .filter(|summary| matches_text_filters(summary, &params))
            .collect();

        let total = advisors.len();
        advisors.truncate(limit);

        debug!(total, returned = advisors.len(), "legacy search completed");
        Ok(SearchResults { advisors, total })
    }
}

fn summary_from_document(doc: Document) -> AdvisorSummary {
    let text = |field: &str| doc.str_field(field).map(str::to_string);
    let specializations = doc
        .data
        .get("specializations")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();
    let review_count = doc
        .data
        .get("review_count")
        .and_then(Value::as_u64)
        .and_then(|n| u32::try_from(n).ok());

    AdvisorSummary {
        name: text("name").unwrap_or_default(),
        location: text("location"),
        specializations,
        average_rating: doc.data.get("average_rating").and_then(Value::as_f64),
        review_count,
        id: doc.id,
    }
}

/// `params` must already be normalized.
fn matches_text_filters(summary: &AdvisorSummary, params: &SearchParams) -> bool {
    if let Some(query) = &params.query {
        if !summary.name.to_lowercase().contains(query) {
            return false;
        }
    }
    if let Some(location) = &params.location {
        let matches = summary
            .location
            .as_deref()
            .is_some_and(|l| l.to_lowercase().contains(location));
        if !matches {
            return false;
        }
    }
    if let Some(specialization) = &params.specialization {
        if !summary
            .specializations
            .iter()
            .any(|s| s.to_lowercase() == *specialization)
        {
            return false;
        }
    }
    true
}
