#![allow(dead_code)]

use async_trait::async_trait;
use axum::Router;
use catsearch::clients::cat_api::{
    Breed, CatApi, CatApiError, CatImage, Category, ImageQuery, ImageSearchPayload,
};
use catsearch::config::Config;
use catsearch::db::Store;
use catsearch::state::SharedState;
use reqwest::StatusCode;
use serde_json::Map;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// In-process stand-in for the cat image service.
#[derive(Default)]
pub struct FakeCatApi {
    pub down: AtomicBool,
    pub queries: Mutex<Vec<String>>,
}

impl FakeCatApi {
    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    fn check(&self, endpoint: &'static str) -> Result<(), CatApiError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(CatApiError::Status {
                endpoint,
                status: StatusCode::SERVICE_UNAVAILABLE,
                body: "maintenance".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl CatApi for FakeCatApi {
    async fn breeds(&self) -> Result<Vec<Breed>, CatApiError> {
        self.check("breeds")?;
        Ok(vec![
            Breed {
                id: "beng".to_string(),
                name: "Bengal".to_string(),
                extra: Map::new(),
            },
            Breed {
                id: "abys".to_string(),
                name: "Abyssinian".to_string(),
                extra: Map::new(),
            },
        ])
    }

    async fn categories(&self) -> Result<Vec<Category>, CatApiError> {
        self.check("categories")?;
        Ok(vec![Category {
            id: "5".to_string(),
            name: "boxes".to_string(),
        }])
    }

    async fn search_images(&self, query: &ImageQuery) -> Result<ImageSearchPayload, CatApiError> {
        self.check("images/search")?;
        self.queries.lock().unwrap().push(query.to_query_string());
        Ok(ImageSearchPayload::Images(vec![CatImage {
            id: "0XYvRd7oD".to_string(),
            url: "https://cdn2.thecatapi.com/images/0XYvRd7oD.jpg".to_string(),
            width: Some(1204),
            height: Some(1445),
            extra: Map::new(),
        }]))
    }
}

pub struct TestApp {
    pub router: Router,
    pub api: Arc<FakeCatApi>,
    pub store: Store,
}

pub async fn spawn_app() -> TestApp {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.observability.metrics_enabled = false;

    let store = Store::new(&config.general.database_path, &config.history.collection)
        .await
        .expect("Failed to open store");
    let api = Arc::new(FakeCatApi::default());

    let shared = Arc::new(SharedState::with_parts(
        &config,
        store.clone(),
        api.clone() as Arc<dyn CatApi>,
    ));
    let state = catsearch::api::create_app_state(shared, None);

    TestApp {
        router: catsearch::api::router(state),
        api,
        store,
    }
}
