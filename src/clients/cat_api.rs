use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use crate::config::CatApiConfig;

const API_KEY_HEADER: &str = "x-api-key";

#[derive(Debug, Error)]
pub enum CatApiError {
    #[error("Cat API request to /{endpoint} failed: {source}")]
    Request {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Cat API /{endpoint} returned {status}: {body}")]
    Status {
        endpoint: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("Failed to decode Cat API /{endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Breed {
    pub id: String,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Category {
    /// The API sends numeric ids; they are compared as text.
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatImage {
    pub id: String,
    pub url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body of `/images/search`. Anything that is not a list of images
/// (for example an error object) is kept verbatim.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ImageSearchPayload {
    Images(Vec<CatImage>),
    Other(Value),
}

impl ImageSearchPayload {
    #[must_use]
    pub fn images(&self) -> &[CatImage] {
        match self {
            Self::Images(images) => images,
            Self::Other(_) => &[],
        }
    }
}

/// Filters for one `/images/search` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageQuery {
    pub limit: u32,
    pub random: bool,
    pub breed_ids: Option<String>,
    pub category_ids: Option<String>,
}

impl ImageQuery {
    /// Builds a query from raw form values. Only the literal `"true"` turns on
    /// random ordering; empty identifier strings are treated as absent.
    #[must_use]
    pub fn from_form(
        limit: u32,
        random_cats: Option<&str>,
        breed_ids: Option<&str>,
        category_ids: Option<&str>,
    ) -> Self {
        let non_empty = |v: Option<&str>| v.filter(|s| !s.is_empty()).map(str::to_string);

        Self {
            limit,
            random: random_cats == Some("true"),
            breed_ids: non_empty(breed_ids),
            category_ids: non_empty(category_ids),
        }
    }

    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut query = format!("limit={}", self.limit);

        if self.random {
            query.push_str("&order=RANDOM");
        }

        if let Some(breed_ids) = &self.breed_ids {
            query.push_str("&breed_ids=");
            query.push_str(&encode_ids(breed_ids));
        }

        if let Some(category_ids) = &self.category_ids {
            query.push_str("&category_ids=");
            query.push_str(&encode_ids(category_ids));
        }

        query
    }
}

/// Identifier lists are comma separated; the commas stay literal.
fn encode_ids(ids: &str) -> String {
    ids.split(',')
        .map(|id| urlencoding::encode(id).into_owned())
        .collect::<Vec<_>>()
        .join(",")
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}

/// The operations the web layer needs from the cat image service.
#[async_trait]
pub trait CatApi: Send + Sync {
    async fn breeds(&self) -> Result<Vec<Breed>, CatApiError>;

    async fn categories(&self) -> Result<Vec<Category>, CatApiError>;

    async fn search_images(&self, query: &ImageQuery) -> Result<ImageSearchPayload, CatApiError>;
}

#[derive(Clone)]
pub struct CatApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl CatApiClient {
    #[must_use]
    pub fn with_shared_client(client: Client, config: &CatApiConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    #[must_use]
    pub fn search_url(&self, query: &ImageQuery) -> String {
        format!("{}/images/search?{}", self.base_url, query.to_query_string())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        url: &str,
    ) -> Result<T, CatApiError> {
        debug!(%url, "Cat API request");

        let response = self
            .client
            .get(url)
            .header(API_KEY_HEADER, &self.api_key)
            .send()
            .await
            .map_err(|source| {
                record_call(endpoint, "network_error");
                CatApiError::Request { endpoint, source }
            })?;

        let status = response.status();
        if !status.is_success() {
            record_call(endpoint, "http_error");
            let body = response.text().await.unwrap_or_default();
            return Err(CatApiError::Status {
                endpoint,
                status,
                body,
            });
        }

        let decoded = response.json::<T>().await.map_err(|source| {
            record_call(endpoint, "decode_error");
            CatApiError::Decode { endpoint, source }
        })?;

        record_call(endpoint, "success");
        Ok(decoded)
    }
}

fn record_call(endpoint: &'static str, outcome: &'static str) {
    metrics::counter!(
        "cat_api_requests_total",
        "endpoint" => endpoint,
        "outcome" => outcome
    )
    .increment(1);
}

#[async_trait]
impl CatApi for CatApiClient {
    async fn breeds(&self) -> Result<Vec<Breed>, CatApiError> {
        let url = format!("{}/breeds", self.base_url);
        self.get_json("breeds", &url).await
    }

    async fn categories(&self) -> Result<Vec<Category>, CatApiError> {
        let url = format!("{}/categories", self.base_url);
        self.get_json("categories", &url).await
    }

    async fn search_images(&self, query: &ImageQuery) -> Result<ImageSearchPayload, CatApiError> {
        let url = self.search_url(query);
        self.get_json("images/search", &url).await
    }
}
