use tracing::{debug, instrument, warn};

use super::collections::SEARCH_SUGGESTIONS;
use super::{OptimizedRead, TieredFetcher};
use crate::domain::errors::DomainResult;
use crate::domain::models::{FetchResult, FetchSource, ResourceKind, Suggestion, SuggestionIndex};
use crate::domain::ports::{DocumentReader, KeyValueStorage};

const INDEX_ID: &str = "index";

impl<S, D> TieredFetcher<S, D>
where
    S: KeyValueStorage,
    D: DocumentReader,
{
    /// The suggestion index, read from the store at most once per TTL window.
    ///
    /// When the index document is missing or unreadable the built-in
    /// fallback index is returned (tagged legacy) and nothing is cached, so
    /// a later publish is picked up on the next call.
    pub async fn suggestion_index(&self) -> DomainResult<FetchResult<SuggestionIndex>> {
        let key = ResourceKind::Suggestions.cache_key(INDEX_ID);
        if let Some(hit) = self.cached::<SuggestionIndex>(&key).await {
            return Ok(FetchResult::new(FetchSource::Cache, hit));
        }

        let read = self.reader.get_document(SEARCH_SUGGESTIONS, INDEX_ID).await;
        match OptimizedRead::<SuggestionIndex>::classify(SEARCH_SUGGESTIONS, read) {
            OptimizedRead::Found(index) => {
                debug!(
                    names = index.names.len(),
                    locations = index.locations.len(),
                    specializations = index.specializations.len(),
                    "suggestion index loaded"
                );
                self.remember(ResourceKind::Suggestions, &key, &index).await;
                Ok(FetchResult::new(FetchSource::Optimized, index))
            }
            OptimizedRead::NotFound => {
                debug!("no suggestion index published, using fallback");
                Ok(FetchResult::new(FetchSource::Legacy, SuggestionIndex::fallback()))
            }
            OptimizedRead::TransientError(e) => {
                warn!(error = %e, "suggestion index unreadable, using fallback");
                Ok(FetchResult::new(FetchSource::Legacy, SuggestionIndex::fallback()))
            }
            OptimizedRead::Denied(e) => {
                self.denied(SEARCH_SUGGESTIONS, &e)?;
                Ok(FetchResult::new(FetchSource::Legacy, SuggestionIndex::fallback()))
            }
        }
    }

    /// Suggestions matching `text`. Callers debounce keystrokes.
    #[instrument(skip(self))]
    pub async fn suggest(
        &self,
        text: &str,
        limit: Option<usize>,
    ) -> DomainResult<FetchResult<Vec<Suggestion>>> {
        let limit = limit.unwrap_or(self.fetch_config.default_suggestion_limit);
        let index = self.suggestion_index().await?;
        Ok(index.map(|index| index.filter(text, limit)))
    }
}
