use serde_json::{Map, Value};
use tracing::{debug, instrument};

use super::collections::{
    ADVISORS, ADVISOR_LOGOS, ADVISOR_PROFILES_A, ADVISOR_PROFILES_B, OPTIMIZED_ADVISORS, REVIEWS,
};
use super::{strip_bookkeeping, TieredFetcher};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AdvisorProfile, Document, DocumentQuery, FetchResult, Predicate, RatingSummary, ResourceKind,
    Review,
};
use crate::domain::ports::{DocumentReader, KeyValueStorage};

const REGISTRATION_FIELD: &str = "registration_number";

impl<S, D> TieredFetcher<S, D>
where
    S: KeyValueStorage,
    D: DocumentReader,
{
    /// Advisor profile by id, cache first.
    #[instrument(skip(self))]
    pub async fn fetch_advisor(&self, id: &str) -> DomainResult<FetchResult<AdvisorProfile>> {
        self.read_through(
            ResourceKind::AdvisorProfile,
            id,
            OPTIMIZED_ADVISORS,
            self.legacy_advisor(id),
        )
        .await
    }

    /// Assemble an advisor profile from the normalized collections.
    ///
    /// The four secondary queries run concurrently and are keyed by the
    /// registration number on the primary record. Any failure fails the
    /// whole assembly.
    pub async fn legacy_advisor(&self, id: &str) -> DomainResult<AdvisorProfile> {
        let primary = self
            .reader
            .get_document(ADVISORS, id)
            .await?
            .ok_or_else(|| DomainError::ResourceNotFound {
                kind: "advisor",
                id: id.to_string(),
            })?;

        let registration_number = primary
            .str_field(REGISTRATION_FIELD)
            .unwrap_or(id)
            .to_string();
        let by_registration =
            |collection: &str| DocumentQuery::collection(collection).filter(Predicate::eq(REGISTRATION_FIELD, registration_number.clone()));

        let logos_query = by_registration(ADVISOR_LOGOS);
        let part_a_query = by_registration(ADVISOR_PROFILES_A);
        let part_b_query = by_registration(ADVISOR_PROFILES_B);
        let reviews_query = by_registration(REVIEWS).order_by("created_at", true);

        let (logos, part_a, part_b, review_docs) = tokio::try_join!(
            self.reader.query_documents(&logos_query),
            self.reader.query_documents(&part_a_query),
            self.reader.query_documents(&part_b_query),
            self.reader.query_documents(&reviews_query),
        )?;

        let logo_url = logos.iter().find_map(|doc| {
            doc.str_field("url")
                .or_else(|| doc.str_field("logo_url"))
                .map(str::to_string)
        });

        let mut details = Map::new();
        for doc in part_a.into_iter().chain(part_b) {
            let mut data = strip_bookkeeping(doc);
            data.remove(REGISTRATION_FIELD);
            details.extend(data);
        }

        let reviews: Vec<Review> = review_docs.into_iter().filter_map(review_from_document).collect();
        let rating = RatingSummary::from_reviews(&reviews);

        debug!(
            id,
            registration_number = %registration_number,
            reviews = rating.review_count,
            has_logo = logo_url.is_some(),
            "advisor assembled from legacy collections"
        );

        Ok(AdvisorProfile {
            id: id.to_string(),
            registration_number,
            record: strip_bookkeeping(primary),
            logo_url,
            details,
            reviews,
            rating,
        })
    }
}

/// Reviews without a numeric rating are skipped.
pub(super) fn review_from_document(doc: Document) -> Option<Review> {
    let Some(rating) = doc.data.get("rating").and_then(Value::as_f64) else {
        debug!(review = %doc.id, "review without numeric rating skipped");
        return None;
    };
    let text = |field: &str| doc.str_field(field).map(str::to_string);

    Some(Review {
        author: text("author"),
        comment: text("comment"),
        created_at: text("created_at"),
        rating,
        id: doc.id,
    })
}
