use axum::{
    body::Bytes,
    extract::{State, rejection::BytesRejection},
    http::{HeaderMap, header},
    response::Html,
};
use mime_guess::mime;
use std::sync::Arc;
use tracing::Span;

use crate::models::search::NewSearchRecord;
use crate::views;

use super::{ApiError, AppState, Operation};

/// Fields posted by the search form. Unchecked boxes and untouched selects
/// may be missing entirely.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SearchCatsForm {
    pub random_cats: Option<String>,
    pub breed_ids: Option<String>,
    pub category_ids: Option<String>,
}

impl SearchCatsForm {
    /// Decodes a urlencoded body. A repeated field keeps its last value and
    /// unknown fields are ignored.
    #[must_use]
    pub fn from_urlencoded(body: &[u8]) -> Self {
        let mut form = Self::default();

        for (key, value) in url::form_urlencoded::parse(body) {
            let field = match key.as_ref() {
                "random_cats" => &mut form.random_cats,
                "breed_ids" => &mut form.breed_ids,
                "category_ids" => &mut form.category_ids,
                _ => continue,
            };
            *field = Some(value.into_owned());
        }

        form
    }

    /// Bodies that are not urlencoded carry no form fields.
    #[must_use]
    pub fn from_request(headers: &HeaderMap, body: &[u8]) -> Self {
        if is_urlencoded(headers) {
            Self::from_urlencoded(body)
        } else {
            Self::default()
        }
    }
}

fn is_urlencoded(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<mime::Mime>().ok())
        .is_some_and(|m| m.essence_str() == mime::APPLICATION_WWW_FORM_URLENCODED.essence_str())
}

impl From<SearchCatsForm> for NewSearchRecord {
    fn from(form: SearchCatsForm) -> Self {
        Self {
            breed_ids: form.breed_ids,
            category_ids: form.category_ids,
            random_cats: form.random_cats,
        }
    }
}

pub async fn home() -> Html<String> {
    Html(views::home())
}

pub async fn search_cats(State(state): State<Arc<AppState>>) -> Result<Html<String>, ApiError> {
    let options = state
        .search_service()
        .search_options()
        .await
        .map_err(|e| ApiError::from_search(Operation::SearchOptions, e))?;

    Ok(Html(views::search_form(&options)))
}

pub async fn process_search_cats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Html<String>, ApiError> {
    let body = body.map_err(|e| ApiError::InvalidRequest {
        operation: Operation::ProcessSearch,
        message: e.body_text(),
    })?;
    let form = SearchCatsForm::from_request(&headers, &body);

    let outcome = state
        .search_service()
        .process_search(form.into())
        .await
        .map_err(|e| ApiError::from_search(Operation::ProcessSearch, e))?;

    Span::current()
        .record("record_id", outcome.record.id)
        .record("images", outcome.payload.images().len());

    Ok(Html(views::search_results(&outcome.payload)))
}

pub async fn search_history(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, ApiError> {
    let history = state
        .search_service()
        .history()
        .await
        .map_err(|e| ApiError::from_search(Operation::History, e))?;

    Ok(Html(views::search_history(&history)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn repeated_fields_keep_last_value() {
        let form = SearchCatsForm::from_urlencoded(b"breed_ids=beng&breed_ids=abys&other=1");

        assert_eq!(form.breed_ids.as_deref(), Some("abys"));
        assert_eq!(form.category_ids, None);
        assert_eq!(form.random_cats, None);
    }

    #[test]
    fn decodes_percent_and_plus() {
        let form = SearchCatsForm::from_urlencoded(b"breed_ids=beng%2Cabys&category_ids=a+b");

        assert_eq!(form.breed_ids.as_deref(), Some("beng,abys"));
        assert_eq!(form.category_ids.as_deref(), Some("a b"));
    }

    #[test]
    fn content_type_decides_decoding() {
        let body = b"breed_ids=beng";

        assert_eq!(
            SearchCatsForm::from_request(&HeaderMap::new(), body),
            SearchCatsForm::default()
        );

        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded; charset=UTF-8"),
        );
        assert_eq!(
            SearchCatsForm::from_request(&headers, body).breed_ids.as_deref(),
            Some("beng")
        );

        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        assert_eq!(
            SearchCatsForm::from_request(&headers, body),
            SearchCatsForm::default()
        );
    }
}
