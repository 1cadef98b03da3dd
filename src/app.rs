use crate::cli::RenderTarget;
use crate::config::Config;
use crate::report::{self, ReportDocument};
use crate::state::AppState;
use crate::utils::fmt_duration;
use crate::web::create_router;
use anyhow::Context;
use sqlx::ConnectOptions;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// How often refilled rate-limit buckets are dropped.
const RATE_LIMIT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Main application struct: configuration plus the shared state built from it.
pub struct App {
    config: Config,
    app_state: AppState,
}

impl App {
    /// Connect to the database, run migrations and build the shared state.
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        let slow_threshold = Duration::from_millis(500);

        let connect_options = sqlx::postgres::PgConnectOptions::from_str(&config.database_url)
            .context("Failed to parse database URL")?
            .log_statements(tracing::log::LevelFilter::Debug)
            .log_slow_statements(tracing::log::LevelFilter::Warn, Duration::from_secs(1));

        // Report loads fan out up to four queries at once.
        let max_connections = 8;
        let db_pool = PgPoolOptions::new()
            .min_connections(0)
            .max_connections(max_connections)
            .acquire_slow_threshold(slow_threshold)
            .acquire_timeout(Duration::from_secs(4))
            .idle_timeout(Duration::from_secs(60 * 2))
            .max_lifetime(Duration::from_secs(60 * 30))
            .connect_with(connect_options)
            .await
            .context("Failed to create database pool")?;

        info!(
            min_connections = 0,
            max_connections,
            acquire_timeout = "4s",
            idle_timeout = "2m",
            max_lifetime = "30m",
            acquire_slow_threshold = fmt_duration(slow_threshold),
            "database pool established"
        );

        info!("Running database migrations...");
        sqlx::migrate!("./migrations")
            .run(&db_pool)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations completed successfully");

        let app_state = AppState::new(db_pool, &config);
        info!(
            chromium = %config.chromium_path,
            render_timeout = fmt_duration(config.pdf_render_timeout),
            request_timeout = fmt_duration(app_state.request_timeout),
            max_concurrent_renders = config.max_concurrent_renders,
            report_timezone = %config.report_timezone,
            "report renderer configured"
        );

        Ok(App { config, app_state })
    }

    /// Serve HTTP until SIGINT/SIGTERM, then drain in-flight requests.
    pub async fn serve(self) -> ExitCode {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config.port));
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(e) => {
                error!(error = ?e, %addr, "Failed to bind listener");
                return ExitCode::FAILURE;
            }
        };

        self.app_state.spawn_rate_limit_sweep(RATE_LIMIT_SWEEP_INTERVAL);
        let router = create_router(self.app_state.clone());
        info!(%addr, "web server listening");

        let shutdown_timeout = self.config.shutdown_timeout;
        let (signal_tx, signal_rx) = tokio::sync::oneshot::channel::<()>();
        let server = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            let _ = signal_tx.send(());
        });
        let mut server = tokio::spawn(async move { server.await });

        tokio::select! {
            result = &mut server => return finish(result),
            _ = signal_rx => {}
        }

        info!(
            timeout = fmt_duration(shutdown_timeout),
            "Shutdown signal received, draining requests"
        );
        let drain_start = Instant::now();
        match tokio::time::timeout(shutdown_timeout, &mut server).await {
            Ok(result) => {
                info!(
                    elapsed = fmt_duration(drain_start.elapsed()),
                    "Graceful shutdown complete"
                );
                finish(result)
            }
            Err(_) => {
                warn!(
                    timeout = fmt_duration(shutdown_timeout),
                    "Graceful shutdown timed out, aborting in-flight requests"
                );
                server.abort();
                self.app_state.db_pool.close().await;
                ExitCode::FAILURE
            }
        }
    }

    /// Render one report offline and write it to `out` (or the attachment name).
    pub async fn render(
        &self,
        target: RenderTarget,
        out: Option<PathBuf>,
        html: bool,
    ) -> Result<PathBuf, anyhow::Error> {
        let clock = self.app_state.report_clock();
        let pool = &self.app_state.db_pool;
        let document: ReportDocument = match target {
            RenderTarget::Competency {
                student,
                competency,
            } => report::competency_document(pool, &clock, student, competency, None).await,
            RenderTarget::Progress { student, course } => {
                report::progress_document(pool, &clock, student, course, None, None).await
            }
        }
        .context("Failed to build report")?;

        let (bytes, extension) = if html {
            (document.html.clone().into_bytes(), "html")
        } else {
            let start = Instant::now();
            let pdf = self
                .app_state
                .renderer
                .render(&document.html)
                .await
                .context("Failed to render PDF")?;
            info!(
                bytes = pdf.len(),
                duration = fmt_duration(start.elapsed()),
                "Report PDF rendered"
            );
            (pdf, "pdf")
        };

        let path = out.unwrap_or_else(|| PathBuf::from(document.file_name(extension)));
        tokio::fs::write(&path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            student_id = document.student_id,
            kind = document.kind.slug(),
            path = %path.display(),
            bytes = bytes.len(),
            "Report written"
        );
        Ok(path)
    }
}

fn finish(result: Result<std::io::Result<()>, tokio::task::JoinError>) -> ExitCode {
    match result {
        Ok(Ok(())) => ExitCode::SUCCESS,
        Ok(Err(e)) => {
            error!(error = ?e, "Web server failed");
            ExitCode::FAILURE
        }
        Err(e) => {
            error!(error = ?e, "Web server task panicked");
            ExitCode::FAILURE
        }
    }
}

/// Resolves on SIGINT, or SIGTERM on unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = ?e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = ?e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
