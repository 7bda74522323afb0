use tracing::instrument;

use super::collections::{BOOKMARKS, OPTIMIZED_USERS, REVIEWS, USERS};
use super::{strip_bookkeeping, TieredFetcher};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{DocumentQuery, FetchResult, Predicate, ResourceKind, UserProfile};
use crate::domain::ports::{DocumentReader, KeyValueStorage};

impl<S, D> TieredFetcher<S, D>
where
    S: KeyValueStorage,
    D: DocumentReader,
{
    /// Signed-in user's profile with bookmarks and review count.
    #[instrument(skip(self))]
    pub async fn fetch_user_profile(&self, uid: &str) -> DomainResult<FetchResult<UserProfile>> {
        self.read_through(
            ResourceKind::UserProfile,
            uid,
            OPTIMIZED_USERS,
            self.legacy_user_profile(uid),
        )
        .await
    }

    /// Assemble a user profile from the normalized collections.
    pub async fn legacy_user_profile(&self, uid: &str) -> DomainResult<UserProfile> {
        let bookmarks_query = DocumentQuery::collection(BOOKMARKS)
            .filter(Predicate::eq("user_id", uid))
            .order_by("created_at", true);
        let reviews_query = DocumentQuery::collection(REVIEWS).filter(Predicate::eq("user_id", uid));

        let (user, bookmark_docs, review_docs) = tokio::try_join!(
            self.reader.get_document(USERS, uid),
            self.reader.query_documents(&bookmarks_query),
            self.reader.query_documents(&reviews_query),
        )?;

        let user = user.ok_or_else(|| DomainError::ResourceNotFound {
            kind: "user",
            id: uid.to_string(),
        })?;

        let bookmarks = bookmark_docs
            .iter()
            .filter_map(|doc| doc.str_field("advisor_id").map(str::to_string))
            .collect();

        Ok(UserProfile {
            id: uid.to_string(),
            record: strip_bookkeeping(user),
            bookmarks,
            review_count: u32::try_from(review_docs.len()).unwrap_or(u32::MAX),
        })
    }
}
