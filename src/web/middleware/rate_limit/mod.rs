//! Inbound HTTP rate limiting with per-IP token buckets.
//!
//! Two route groups, each with its own buckets (first rejection wins):
//!
//! 1. **Render** -- report PDF/HTML generation: burst (10s) + sustained (1min),
//!    sized from `REPORT_RATE_LIMIT`
//! 2. **Api** -- everything else under `/api/` except health: sustained (1min)
//!
//! Requests whose client IP cannot be determined are let through.

use crate::web::error::{ApiError, ApiErrorCode};
use crate::web::middleware::client_ip::resolve_client_ip;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderValue, Method};
use axum::response::{IntoResponse, Response};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter, clock::Clock};
use std::net::IpAddr;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tower::{Layer, Service};
use tracing::warn;

const API_PER_MINUTE: NonZeroU32 = NonZeroU32::new(120).unwrap();
const BURST_WINDOW: Duration = Duration::from_secs(10);
const SUSTAINED_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteGroup {
    Render,
    Api,
    /// Health and anything outside `/api/` -- not limited.
    Unlimited,
}

fn classify_route(method: &Method, path: &str) -> RouteGroup {
    if method == Method::POST && path.starts_with("/api/reports/") {
        RouteGroup::Render
    } else if path.starts_with("/api/health") || !path.starts_with("/api/") {
        RouteGroup::Unlimited
    } else {
        RouteGroup::Api
    }
}

/// Quota helper: `count` requests per `period` with burst = count.
fn quota(count: NonZeroU32, period: Duration) -> Quota {
    Quota::with_period(period / count.get())
        .unwrap_or_else(|| Quota::per_second(count))
        .allow_burst(count)
}

/// Holds the keyed limiters for every route group.
pub struct RateLimitState {
    render_burst: DefaultKeyedRateLimiter<IpAddr>,
    render_sustained: DefaultKeyedRateLimiter<IpAddr>,
    api_sustained: DefaultKeyedRateLimiter<IpAddr>,
}

impl RateLimitState {
    /// `renders_per_minute` bounds report generation per client IP; a third of
    /// it (at least one) may be spent in any 10-second window.
    pub fn new(renders_per_minute: NonZeroU32) -> Self {
        let burst =
            NonZeroU32::new(renders_per_minute.get().div_ceil(3)).unwrap_or(NonZeroU32::MIN);
        Self {
            render_burst: RateLimiter::keyed(quota(burst, BURST_WINDOW)),
            render_sustained: RateLimiter::keyed(quota(renders_per_minute, SUSTAINED_WINDOW)),
            api_sustained: RateLimiter::keyed(quota(API_PER_MINUTE, SUSTAINED_WINDOW)),
        }
    }

    /// `Ok(())` if allowed, or `Err(retry_after_secs)` with the longest wait.
    fn check(&self, ip: IpAddr, group: RouteGroup) -> Result<(), u64> {
        let limiters: Vec<&DefaultKeyedRateLimiter<IpAddr>> = match group {
            RouteGroup::Render => vec![&self.render_burst, &self.render_sustained],
            RouteGroup::Api => vec![&self.api_sustained],
            RouteGroup::Unlimited => return Ok(()),
        };

        let now = governor::clock::DefaultClock::default().now();
        let max_wait = limiters
            .iter()
            .filter_map(|limiter| limiter.check_key(&ip).err())
            .map(|not_until| not_until.wait_time_from(now))
            .max();

        match max_wait {
            Some(wait) => Err(wait.as_secs().max(1)),
            None => Ok(()),
        }
    }

    /// Drop buckets that have fully refilled.
    pub fn retain_recent(&self) {
        self.render_burst.retain_recent();
        self.render_sustained.retain_recent();
        self.api_sustained.retain_recent();
    }
}

pub type SharedRateLimitState = Arc<RateLimitState>;

// -- Tower Layer + Service --

#[derive(Clone)]
pub struct RateLimitLayer {
    state: SharedRateLimitState,
}

impl RateLimitLayer {
    pub fn new(state: SharedRateLimitState) -> Self {
        Self { state }
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RateLimitService {
            inner,
            state: self.state.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RateLimitService<S> {
    inner: S,
    state: SharedRateLimitState,
}

impl<S, ResBody> Service<Request> for RateLimitService<S>
where
    S: Service<Request, Response = Response<ResBody>> + Send + Clone + 'static,
    S::Future: Send + 'static,
    S::Error: std::fmt::Debug + Send,
    ResBody: Send + 'static,
    Body: Into<ResBody>,
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
        let group = classify_route(req.method(), req.uri().path());
        if group == RouteGroup::Unlimited {
            return Box::pin(self.inner.call(req));
        }

        let Some(ip) = resolve_client_ip(req.headers(), req.extensions()) else {
            return Box::pin(self.inner.call(req));
        };

        match self.state.check(ip, group) {
            Ok(()) => Box::pin(self.inner.call(req)),
            Err(retry_after) => {
                warn!(
                    client_ip = %ip,
                    path = %req.uri().path(),
                    retry_after_secs = retry_after,
                    "Rate limit exceeded"
                );
                let resp = rate_limit_response(retry_after).map(Into::into);
                Box::pin(async move { Ok(resp) })
            }
        }
    }
}

fn rate_limit_response(retry_after: u64) -> Response<Body> {
    let mut response = ApiError::new(
        ApiErrorCode::RateLimited,
        format!("Too many requests. Retry after {retry_after} seconds."),
    )
    .into_response();
    response
        .headers_mut()
        .insert("retry-after", HeaderValue::from(retry_after));
    response
}
