//! HTTP error responses

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use council_application::{RunTurnError, StoreError};
use council_domain::DomainError;
use thiserror::Error;

/// Errors returned by handlers, rendered as `{"detail": "..."}`
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Conversation not found")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Turn(#[from] RunTurnError),
}

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        ApiError::BadRequest(e.to_string())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound | ApiError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Store(StoreError::AlreadyExists(_)) => StatusCode::CONFLICT,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Turn(e) => match e {
                RunTurnError::NoModels | RunTurnError::Domain(_) => StatusCode::BAD_REQUEST,
                RunTurnError::AllModelsFailed | RunTurnError::ChairmanFailed { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                RunTurnError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
                RunTurnError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
                RunTurnError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!("Request failed: {}", self);
        }
        let body = serde_json::json!({ "detail": self.to_string() });
        (status, Json(body)).into_response()
    }
}
