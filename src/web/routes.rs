//! Web API router construction and shared response utilities.

use axum::{
    BoxError, Router,
    error_handling::HandleErrorLayer,
    http::HeaderValue,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use tower::timeout::{TimeoutLayer, error::Elapsed};
use tower_http::compression::CompressionLayer;
use tracing::{error, warn};

use crate::state::AppState;
use crate::web::error::{ApiError, ApiErrorCode};
use crate::web::middleware::rate_limit::RateLimitLayer;
use crate::web::middleware::request_id::RequestIdLayer;
use crate::web::middleware::security_headers::SecurityHeadersLayer;
use crate::web::{filters, reports, status};

/// Cache-Control presets.
pub mod cache {
    /// Filter dropdowns differ per caller, so only the browser may keep them.
    pub const FILTERS: &str = "private, max-age=60";
    /// Reports and previews contain student records.
    pub const NO_STORE: &str = "private, no-store";
}

/// Wraps a JSON response with a `Cache-Control` header.
pub fn with_cache_control<T: serde::Serialize>(value: T, header: &'static str) -> Response {
    let mut response = Json(value).into_response();
    response.headers_mut().insert(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(header),
    );
    response
}

/// Turns errors raised by the timeout layer into the usual JSON error body.
async fn middleware_error(error: BoxError) -> ApiError {
    if error.is::<Elapsed>() {
        warn!("Request timed out");
        ApiError::new(ApiErrorCode::Timeout, "Report generation timed out")
    } else {
        error!(error = %error, "Unhandled middleware error");
        ApiError::internal_error("Internal server error")
    }
}

/// Creates the web server router
pub fn create_router(app_state: AppState) -> Router {
    let rate_limit = app_state.rate_limit.clone();
    let request_timeout = app_state.request_timeout;

    let api_router = Router::new()
        .route("/health", get(status::health))
        .route("/reports/filters", get(filters::get_filters))
        .route("/reports/competency", post(reports::competency_pdf))
        .route(
            "/reports/competency/preview",
            post(reports::competency_preview),
        )
        .route("/reports/progress", post(reports::progress_pdf))
        .route("/reports/progress/preview", post(reports::progress_preview))
        .with_state(app_state);

    Router::new().nest("/api", api_router).layer((
        // Outermost: per-request ID span + severity-proportional response logging.
        RequestIdLayer,
        SecurityHeadersLayer,
        CompressionLayer::new()
            .zstd(true)
            .br(true)
            .gzip(true)
            .quality(tower_http::CompressionLevel::Fastest),
        // Inside compression so its short-circuit response keeps the plain body type.
        RateLimitLayer::new(rate_limit),
        HandleErrorLayer::new(middleware_error),
        TimeoutLayer::new(request_timeout),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn elapsed_requests_get_a_json_error() {
        let error = middleware_error(Box::new(Elapsed::new())).await;
        assert_eq!(error.code, ApiErrorCode::Timeout);

        let other = middleware_error("boom".into()).await;
        assert_eq!(other.code, ApiErrorCode::InternalError);
        assert!(!other.message.contains("boom"));
    }
}
