//! Search-and-history pipeline behind the web pages.
//!
//! Each operation returns a [`SearchError`] instead of rendering anything, so
//! the HTTP layer decides how a failure is shown.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::clients::cat_api::{
    Breed, CatApi, CatApiError, Category, ImageQuery, ImageSearchPayload,
};
use crate::db::Store;
use crate::models::search::{NewSearchRecord, SearchRecord};
use crate::services::lookup::Lookup;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("External API error: {0}")]
    ExternalApi(#[from] CatApiError),

    #[error("Database error: {0}")]
    Database(String),
}

impl SearchError {
    fn database(err: &anyhow::Error) -> Self {
        Self::Database(format!("{err:#}"))
    }
}

/// Lookup lists offered on the search page, passed through unmodified.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOptions {
    pub breeds: Vec<Breed>,
    pub categories: Vec<Category>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub record: SearchRecord,
    pub payload: ImageSearchPayload,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub record: SearchRecord,
    pub breed_name: Option<String>,
    pub category_name: Option<String>,
}

pub struct SearchService {
    api: Arc<dyn CatApi>,
    store: Store,
    search_limit: u32,
    history_limit: u64,
}

impl SearchService {
    #[must_use]
    pub fn new(api: Arc<dyn CatApi>, store: Store, search_limit: u32, history_limit: u64) -> Self {
        Self {
            api,
            store,
            search_limit,
            history_limit,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Fetches both lookup lists concurrently; either failing fails the page.
    pub async fn search_options(&self) -> Result<SearchOptions, SearchError> {
        let (breeds, categories) = tokio::try_join!(self.api.breeds(), self.api.categories())?;

        debug!(
            breeds = breeds.len(),
            categories = categories.len(),
            "Loaded search options"
        );

        Ok(SearchOptions { breeds, categories })
    }

    /// Runs one image search and records it. The record is written whenever
    /// the API answered successfully, even with an empty or unexpected body.
    pub async fn process_search(
        &self,
        submitted: NewSearchRecord,
    ) -> Result<SearchOutcome, SearchError> {
        let query = ImageQuery::from_form(
            self.search_limit,
            submitted.random_cats.as_deref(),
            submitted.breed_ids.as_deref(),
            submitted.category_ids.as_deref(),
        );

        let payload = self.api.search_images(&query).await?;

        let record = self
            .store
            .add_search(&submitted)
            .await
            .map_err(|e| SearchError::database(&e))?;

        metrics::counter!("search_records_total").increment(1);

        info!(
            record_id = record.id,
            query = %query.to_query_string(),
            images = payload.images().len(),
            "Processed cat search"
        );

        Ok(SearchOutcome { record, payload })
    }

    /// Most recent searches, newest first, with display names resolved
    /// against freshly fetched lookup lists.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, SearchError> {
        let records = self
            .store
            .recent_searches(self.history_limit)
            .await
            .map_err(|e| SearchError::database(&e))?;

        let (breeds, categories) = tokio::try_join!(self.api.breeds(), self.api.categories())?;

        let breed_lookup = Lookup::from_breeds(&breeds);
        let category_lookup = Lookup::from_categories(&categories);

        let entries = records
            .into_iter()
            .map(|record| HistoryEntry {
                breed_name: breed_lookup.resolve(record.breed_ids.as_deref()),
                category_name: category_lookup.resolve(record.category_ids.as_deref()),
                record,
            })
            .collect();

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::{Map, json};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct FakeCatApi {
        fail_lookups: bool,
        fail_search: bool,
        payload: Option<ImageSearchPayload>,
        queries: Mutex<Vec<ImageQuery>>,
        lookup_calls: AtomicUsize,
    }

    fn unavailable(endpoint: &'static str) -> CatApiError {
        CatApiError::Status {
            endpoint,
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: "down".to_string(),
        }
    }

    #[async_trait]
    impl CatApi for FakeCatApi {
        async fn breeds(&self) -> Result<Vec<Breed>, CatApiError> {
            self.lookup_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_lookups {
                return Err(unavailable("breeds"));
            }
            Ok(vec![Breed {
                id: "beng".to_string(),
                name: "Bengal".to_string(),
                extra: Map::new(),
            }])
        }

        async fn categories(&self) -> Result<Vec<Category>, CatApiError> {
            self.lookup_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_lookups {
                return Err(unavailable("categories"));
            }
            Ok(vec![Category {
                id: "5".to_string(),
                name: "boxes".to_string(),
            }])
        }

        async fn search_images(
            &self,
            query: &ImageQuery,
        ) -> Result<ImageSearchPayload, CatApiError> {
            self.queries.lock().unwrap().push(query.clone());
            if self.fail_search {
                return Err(unavailable("images/search"));
            }
            Ok(self
                .payload
                .clone()
                .unwrap_or_else(|| ImageSearchPayload::Images(Vec::new())))
        }
    }

    async fn service_with(api: FakeCatApi) -> (SearchService, Arc<FakeCatApi>) {
        let api = Arc::new(api);
        let store = Store::new("sqlite::memory:", "searches").await.unwrap();
        let service = SearchService::new(api.clone(), store, 10, 10);
        (service, api)
    }

    fn submitted(random: Option<&str>, breed: Option<&str>, category: Option<&str>) -> NewSearchRecord {
        NewSearchRecord {
            breed_ids: breed.map(str::to_string),
            category_ids: category.map(str::to_string),
            random_cats: random.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn search_options_returns_both_lists() {
        let (service, _) = service_with(FakeCatApi::default()).await;

        let options = service.search_options().await.unwrap();
        assert_eq!(options.breeds[0].id, "beng");
        assert_eq!(options.categories[0].name, "boxes");
    }

    #[tokio::test]
    async fn search_options_fails_when_a_lookup_fails() {
        let (service, _) = service_with(FakeCatApi {
            fail_lookups: true,
            ..FakeCatApi::default()
        })
        .await;

        let err = service.search_options().await.unwrap_err();
        assert!(matches!(err, SearchError::ExternalApi(_)));
    }

    #[tokio::test]
    async fn process_search_builds_query_and_persists() {
        let (service, api) = service_with(FakeCatApi::default()).await;

        let outcome = service
            .process_search(submitted(Some("true"), Some("beng"), None))
            .await
            .unwrap();

        let queries = api.queries.lock().unwrap().clone();
        assert_eq!(
            queries[0].to_query_string(),
            "limit=10&order=RANDOM&breed_ids=beng"
        );

        assert_eq!(outcome.record.breed_ids.as_deref(), Some("beng"));
        assert_eq!(outcome.record.category_ids, None);
        assert_eq!(outcome.record.random_cats.as_deref(), Some("true"));
        assert_eq!(service.store().count_searches().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn process_search_persists_unexpected_payloads() {
        let (service, _) = service_with(FakeCatApi {
            payload: Some(ImageSearchPayload::Other(json!({"message": "bad breed"}))),
            ..FakeCatApi::default()
        })
        .await;

        let outcome = service
            .process_search(submitted(None, Some("zzzz"), None))
            .await
            .unwrap();

        assert!(outcome.payload.images().is_empty());
        assert_eq!(service.store().count_searches().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn process_search_does_not_persist_on_api_failure() {
        let (service, _) = service_with(FakeCatApi {
            fail_search: true,
            ..FakeCatApi::default()
        })
        .await;

        let err = service
            .process_search(submitted(None, None, None))
            .await
            .unwrap_err();

        assert!(matches!(err, SearchError::ExternalApi(_)));
        assert_eq!(service.store().count_searches().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn history_resolves_names_and_caps_results() {
        let (service, api) = service_with(FakeCatApi::default()).await;

        for i in 0..10 {
            let breed = format!("unknown{i}");
            service
                .process_search(submitted(None, Some(&breed), None))
                .await
                .unwrap();
        }
        service
            .process_search(submitted(Some("true"), Some("beng"), Some("5")))
            .await
            .unwrap();

        let lookups_before = api.lookup_calls.load(Ordering::SeqCst);
        let history = service.history().await.unwrap();

        assert_eq!(history.len(), 10);
        assert_eq!(history[0].breed_name.as_deref(), Some("Bengal"));
        assert_eq!(history[0].category_name.as_deref(), Some("boxes"));
        assert_eq!(history[1].breed_name, None);
        assert_eq!(history[1].category_name, None);
        assert!(
            history
                .windows(2)
                .all(|w| w[0].record.timestamp >= w[1].record.timestamp)
        );
        assert_eq!(api.lookup_calls.load(Ordering::SeqCst), lookups_before + 2);
    }

    #[tokio::test]
    async fn history_refetches_lookups_every_time() {
        let (service, api) = service_with(FakeCatApi::default()).await;

        service.history().await.unwrap();
        service.history().await.unwrap();

        assert_eq!(api.lookup_calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn history_fails_when_lookups_fail() {
        let (service, _) = service_with(FakeCatApi {
            fail_lookups: true,
            ..FakeCatApi::default()
        })
        .await;

        let err = service.history().await.unwrap_err();
        assert!(matches!(err, SearchError::ExternalApi(_)));
    }
}
