use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;

use crate::services::SearchService;
use crate::state::SharedState;

mod assets;
mod error;
mod observability;
pub mod pages;

pub use error::{ApiError, Operation};

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn search_service(&self) -> &Arc<SearchService> {
        &self.shared.search_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(pages::home))
        .route("/searchCats", get(pages::search_cats))
        .route("/processSearchCats", post(pages::process_search_cats))
        .route("/searchHistory", get(pages::search_history))
        .route("/metrics", get(observability::get_metrics))
        .fallback(assets::serve_asset)
        .with_state(state)
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}
