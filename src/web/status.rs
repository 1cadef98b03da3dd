//! Health handler.

use axum::extract::State;
use axum::response::Json;
use serde::Serialize;
use tracing::{trace, warn};
use ts_rs::TS;

use crate::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub commit: String,
    pub database: bool,
    /// Free headless-browser slots at the time of the check.
    pub render_slots_available: usize,
    pub timestamp: String,
}

/// `GET /api/health`
pub(super) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    trace!("health check requested");
    let database = match sqlx::query("SELECT 1").execute(&state.db_pool).await {
        Ok(_) => true,
        Err(e) => {
            warn!(error = ?e, "Health check database ping failed");
            false
        }
    };

    Json(HealthResponse {
        status: if database {
            HealthStatus::Healthy
        } else {
            HealthStatus::Degraded
        },
        version: env!("CARGO_PKG_VERSION").to_string(),
        commit: env!("GIT_COMMIT_HASH").to_string(),
        database,
        render_slots_available: state.render_slots.available_permits(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
