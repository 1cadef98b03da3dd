//! Application state shared by every handler.

use chrono_tz::Tz;
use sqlx::PgPool;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

use crate::config::Config;
use crate::report::model::ReportClock;
use crate::report::pdf::{ChromiumRenderer, PdfRenderer};
use crate::web::filter_cache::FilterCache;
use crate::web::middleware::rate_limit::{RateLimitState, SharedRateLimitState};

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub filter_cache: FilterCache,
    pub renderer: Arc<dyn PdfRenderer>,
    /// Bounds how many headless browsers run at once.
    pub render_slots: Arc<Semaphore>,
    pub report_timezone: Tz,
    pub rate_limit: SharedRateLimitState,
    /// Upper bound for a whole request, render queueing included.
    pub request_timeout: Duration,
}

impl AppState {
    pub fn new(db_pool: PgPool, config: &Config) -> Self {
        let renderer = ChromiumRenderer::new(&config.chromium_path, config.pdf_render_timeout);
        Self::with_renderer(db_pool, config, Arc::new(renderer))
    }

    /// Same as [`AppState::new`] with a caller-supplied renderer.
    pub fn with_renderer(db_pool: PgPool, config: &Config, renderer: Arc<dyn PdfRenderer>) -> Self {
        let renders_per_minute =
            NonZeroU32::new(config.report_rate_limit).unwrap_or(NonZeroU32::MIN);
        Self {
            db_pool,
            filter_cache: FilterCache::new(config.filter_cache_ttl),
            renderer,
            render_slots: Arc::new(Semaphore::new(config.max_concurrent_renders.max(1))),
            report_timezone: config.report_timezone,
            rate_limit: Arc::new(RateLimitState::new(renders_per_minute)),
            request_timeout: request_timeout(config.pdf_render_timeout),
        }
    }

    /// A clock pinned to the current instant in the report timezone.
    pub fn report_clock(&self) -> ReportClock {
        ReportClock::system(self.report_timezone)
    }

    /// Spawn a background task that drops refilled rate-limit buckets every `interval`.
    pub fn spawn_rate_limit_sweep(&self, interval: Duration) {
        let rate_limit = self.rate_limit.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await; // skip the immediate first tick
            loop {
                ticker.tick().await;
                rate_limit.retain_recent();
                tracing::trace!("Rate limit buckets swept");
            }
        });
    }
}

/// Room for one render ahead in the queue, our own render, and the data load.
fn request_timeout(pdf_render_timeout: Duration) -> Duration {
    pdf_render_timeout.saturating_mul(3)
}
