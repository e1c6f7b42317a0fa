use std::sync::Arc;

use crate::clients::cat_api::{CatApi, CatApiClient};
use crate::config::Config;
use crate::db::Store;
use crate::services::SearchService;

/// Build the HTTP client shared by every cat API call so connections are
/// pooled for the whole process.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("catsearch/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub store: Store,

    pub search_service: Arc<SearchService>,
}

impl SharedState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            &config.history.collection,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let http_client = build_shared_http_client(config.cat_api.request_timeout_seconds)?;
        let cat_api = Arc::new(CatApiClient::with_shared_client(
            http_client,
            &config.cat_api,
        )) as Arc<dyn CatApi>;

        Ok(Self::with_parts(config, store, cat_api))
    }

    /// Assembles the state around an already opened store and API client.
    #[must_use]
    pub fn with_parts(config: &Config, store: Store, cat_api: Arc<dyn CatApi>) -> Self {
        let search_service = Arc::new(SearchService::new(
            cat_api,
            store.clone(),
            config.cat_api.search_limit,
            config.history.limit,
        ));

        Self {
            store,
            search_service,
        }
    }
}
