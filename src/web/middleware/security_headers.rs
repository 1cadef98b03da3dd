//! Global security headers applied to every response.
//!
//! Injects the standard set (XFO, XCTO, Referrer-Policy, Permissions-Policy,
//! COOP) and adds HSTS when the gateway reports the request arrived over TLS
//! (`X-Forwarded-Proto: https`). Handlers that set their own CSP or frame
//! policy (HTML report previews) keep it.

use crate::web::middleware::client_ip::header_str;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::response::Response;
use std::task::{Context, Poll};
use tower::{Layer, Service};

static XFO: HeaderValue = HeaderValue::from_static("DENY");
static XCTO: HeaderValue = HeaderValue::from_static("nosniff");
static REFERRER: HeaderValue = HeaderValue::from_static("strict-origin-when-cross-origin");
static PERMISSIONS: HeaderValue =
    HeaderValue::from_static("camera=(), microphone=(), geolocation=()");
static COOP: HeaderValue = HeaderValue::from_static("same-origin");
static HSTS: HeaderValue = HeaderValue::from_static("max-age=31536000; includeSubDomains");
static API_CSP: HeaderValue =
    HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'");

#[derive(Clone)]
pub struct SecurityHeadersLayer;

impl<S> Layer<S> for SecurityHeadersLayer {
    type Service = SecurityHeadersService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        SecurityHeadersService { inner }
    }
}

#[derive(Clone)]
pub struct SecurityHeadersService<S> {
    inner: S,
}

impl<S, B> Service<Request> for SecurityHeadersService<S>
where
    S: Service<Request, Response = Response<B>> + Send + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Debug,
    B: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let is_https = header_str(req.headers(), "x-forwarded-proto")
            .is_some_and(|proto| proto.trim().eq_ignore_ascii_case("https"));
        let future = self.inner.call(req);

        Box::pin(async move {
            let mut response = future.await?;
            let headers = response.headers_mut();

            if !headers.contains_key("x-frame-options") {
                headers.insert("x-frame-options", XFO.clone());
            }
            headers.insert("x-content-type-options", XCTO.clone());
            headers.insert("referrer-policy", REFERRER.clone());
            headers.insert("permissions-policy", PERMISSIONS.clone());
            headers.insert("cross-origin-opener-policy", COOP.clone());

            if is_https {
                headers.insert("strict-transport-security", HSTS.clone());
            }

            if !headers.contains_key("content-security-policy") {
                headers.insert("content-security-policy", API_CSP.clone());
            }

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::Router;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use tower::ServiceExt;

    async fn get_headers(router: Router, proto: Option<&str>) -> axum::http::HeaderMap {
        let mut builder = Request::builder().uri("/");
        if let Some(proto) = proto {
            builder = builder.header("x-forwarded-proto", proto);
        }
        router
            .layer(SecurityHeadersLayer)
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
            .headers()
            .clone()
    }

    #[tokio::test]
    async fn defaults_and_hsts_over_tls() {
        let router = Router::new().route("/", get(|| async { "ok" }));
        let headers = get_headers(router.clone(), None).await;
        assert_eq!(headers["x-frame-options"], "DENY");
        assert_eq!(headers["x-content-type-options"], "nosniff");
        assert!(!headers.contains_key("strict-transport-security"));

        let headers = get_headers(router, Some("https")).await;
        assert!(headers.contains_key("strict-transport-security"));
    }

    #[tokio::test]
    async fn handler_policies_are_kept() {
        let router = Router::new().route(
            "/",
            get(|| async {
                (
                    [
                        ("content-security-policy", "style-src 'unsafe-inline'"),
                        ("x-frame-options", "SAMEORIGIN"),
                    ],
                    "<p>preview</p>",
                )
            }),
        );
        let headers = get_headers(router, None).await;
        assert_eq!(headers["content-security-policy"], "style-src 'unsafe-inline'");
        assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
    }
}
