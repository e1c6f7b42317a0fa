use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use crate::services::SearchError;

/// The page whose backing work failed; decides the text the user sees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    SearchOptions,
    ProcessSearch,
    History,
}

impl Operation {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SearchOptions => "search_options",
            Self::ProcessSearch => "process_search",
            Self::History => "history",
        }
    }

    #[must_use]
    pub const fn user_message(self) -> &'static str {
        match self {
            Self::SearchOptions => "Error fetching search options.",
            Self::ProcessSearch => "Error fetching cat images.",
            Self::History => "Error fetching search history.",
        }
    }
}

#[derive(Debug)]
pub enum ApiError {
    ExternalApiError {
        operation: Operation,
        message: String,
    },

    DatabaseError {
        operation: Operation,
        message: String,
    },

    /// The request body could not be read at all.
    InvalidRequest {
        operation: Operation,
        message: String,
    },
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ExternalApiError { operation, message } => {
                write!(f, "Cat API error during {:?}: {}", operation, message)
            }
            ApiError::DatabaseError { operation, message } => {
                write!(f, "Database error during {:?}: {}", operation, message)
            }
            ApiError::InvalidRequest { operation, message } => {
                write!(f, "Invalid request during {:?}: {}", operation, message)
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl ApiError {
    #[must_use]
    pub fn from_search(operation: Operation, err: SearchError) -> Self {
        match err {
            SearchError::ExternalApi(e) => ApiError::ExternalApiError {
                operation,
                message: e.to_string(),
            },
            SearchError::Database(message) => ApiError::DatabaseError { operation, message },
        }
    }

    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            ApiError::ExternalApiError { .. } => StatusCode::BAD_GATEWAY,
            ApiError::DatabaseError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub const fn failure_kind(&self) -> &'static str {
        match self {
            ApiError::ExternalApiError { .. } => "cat_api",
            ApiError::DatabaseError { .. } => "database",
            ApiError::InvalidRequest { .. } => "request",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let operation = match &self {
            ApiError::ExternalApiError { operation, message } => {
                tracing::warn!(?operation, "Cat API error: {}", message);
                *operation
            }
            ApiError::DatabaseError { operation, message } => {
                tracing::error!(?operation, "Database error: {}", message);
                *operation
            }
            ApiError::InvalidRequest { operation, message } => {
                tracing::warn!(?operation, "Rejected request: {}", message);
                *operation
            }
        };

        let failure = self.failure_kind();
        tracing::Span::current().record("failure", failure);
        metrics::counter!(
            "page_failures_total",
            "operation" => operation.label(),
            "failure" => failure,
        )
        .increment(1);

        (self.status(), operation.user_message()).into_response()
    }
}
