use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use catalog_core::CatalogError;
use serde_json::json;
use std::collections::BTreeMap;

use crate::backend::BackendError;

/// Field key (`0.uuid`, `name`) → messages.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// Failures as the HTTP layer reports them.
#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Validation(FieldErrors),
    Client(String),
    Unauthorized(String),
    Backend(String),
    Unavailable(String),
    Internal(String),
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::NotFound(_) => ApiError::NotFound,
            CatalogError::Conflict(_)
            | CatalogError::InvalidQuery(_)
            | CatalogError::InvalidInput(_)
            | CatalogError::UnknownRule(_)
            | CatalogError::InvalidBoost { .. } => ApiError::Client(err.to_string()),
            CatalogError::Storage(_)
            | CatalogError::Encoding(_)
            | CatalogError::CategoryCycle(_)
            | CatalogError::CategoryTooDeep(_) => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Client(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Client(rejection.body_text())
    }
}

impl From<BackendError> for ApiError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::NotConfigured => ApiError::Unavailable(err.to_string()),
            _ => ApiError::Backend(err.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, json!({ "message": "Not found" })),
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, json!({ "form_validations": errors })),
            ApiError::Client(msg) => (StatusCode::BAD_REQUEST, json!({ "exception": msg })),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "exception": msg })),
            ApiError::Backend(msg) => {
                tracing::warn!(error = %msg, "search backend failed");
                (StatusCode::BAD_GATEWAY, json!({ "exception": msg }))
            }
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, json!({ "exception": msg })),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, json!({ "exception": msg }))
            }
        };
        (status, Json(body)).into_response()
    }
}
