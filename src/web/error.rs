//! API error type shared by every handler.
//!
//! Every non-2xx response carries a JSON body `{ "error": <message>, "code": <CODE> }`.
//! Internal failures are logged with context here and reported with a generic
//! message so SQL or browser details never reach the client.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use std::fmt::Display;
use ts_rs::TS;

use crate::report::input::InputError;
use crate::report::pdf::RenderError;
use crate::report::pipeline::LoadError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ApiErrorCode {
    Unauthorized,
    Forbidden,
    BadRequest,
    InvalidBody,
    NotFound,
    RateLimited,
    InternalError,
    RenderFailed,
    Timeout,
}

impl ApiErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ApiErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ApiErrorCode::BadRequest | ApiErrorCode::InvalidBody => StatusCode::BAD_REQUEST,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiErrorCode::InternalError | ApiErrorCode::RenderFailed | ApiErrorCode::Timeout => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct ApiErrorBody {
    pub error: String,
    pub code: ApiErrorCode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ApiErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::Forbidden, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::BadRequest, message)
    }

    pub fn not_found(kind: &str, id: impl Display) -> Self {
        Self::new(ApiErrorCode::NotFound, format!("{kind} {id} not found"))
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(ApiErrorCode::InternalError, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = ApiErrorBody {
            error: self.message,
            code: self.code,
        };
        (status, Json(body)).into_response()
    }
}

/// Log a database error with context and convert it into a generic 500.
pub fn db_error(context: &str, error: anyhow::Error) -> ApiError {
    tracing::error!(error = ?error, "{context} failed");
    ApiError::internal_error(format!("{context} failed"))
}

impl From<InputError> for ApiError {
    fn from(error: InputError) -> Self {
        ApiError::bad_request(error.to_string())
    }
}

impl From<LoadError> for ApiError {
    fn from(error: LoadError) -> Self {
        match error {
            LoadError::NotFound { kind, id } => ApiError::not_found(kind, id),
            LoadError::Invalid(e) => e.into(),
            LoadError::Database(e) => db_error("Report data load", e),
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(error: RenderError) -> Self {
        tracing::error!(error = %error, "PDF render failed");
        ApiError::new(ApiErrorCode::RenderFailed, "Failed to render PDF report")
    }
}
