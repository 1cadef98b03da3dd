//! JSON body extraction with path-aware error messages.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header;
use serde::de::DeserializeOwned;

use crate::web::error::{ApiError, ApiErrorCode};

/// Like `axum::Json`, but rejections are `ApiError`s naming the offending field.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| {
                let mime = ct.split(';').next().unwrap_or("").trim();
                mime.eq_ignore_ascii_case("application/json") || mime.ends_with("+json")
            });
        if !is_json {
            return Err(ApiError::new(
                ApiErrorCode::InvalidBody,
                "Expected a JSON body (Content-Type: application/json)",
            ));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::new(ApiErrorCode::InvalidBody, e.body_text()))?;
        parse_body(&bytes).map(JsonBody)
    }
}

fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, ApiError> {
    let deserializer = &mut serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(deserializer).map_err(|err| {
        let path = err.path().to_string();
        let inner = err.inner();
        let message = describe(&inner.to_string(), inner.line(), inner.column());
        let message = if path.is_empty() || path == "." {
            format!("Invalid request body: {message}")
        } else {
            format!("Invalid request body at '{path}': {message}")
        };
        ApiError::new(ApiErrorCode::InvalidBody, message)
    })
}

/// Drop serde's location suffix and reword "invalid type: X, expected Y".
fn describe(message: &str, line: usize, column: usize) -> String {
    let location = format!(" at line {line} column {column}");
    let message = message.strip_suffix(&location).unwrap_or(message);

    if let Some(rest) = message.strip_prefix("invalid type: ")
        && let Some((actual, expected)) = rest.split_once(", expected ")
    {
        return format!("expected {expected}, got {actual}");
    }
    message.to_string()
}
