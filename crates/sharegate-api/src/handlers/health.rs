//! Health check handler.

use axum::Json;
use axum::extract::State;
use tracing::warn;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
///
/// Always answers 200; a failing storage probe reports `"degraded"`.
pub async fn health(State(state): State<AppState>) -> Json<ApiResponse<HealthResponse>> {
    let probe = tokio::time::timeout(
        state.config.adoption.probe_timeout(),
        state.store.health_check(),
    )
    .await;

    let available = match probe {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            warn!(error = %e, "Storage health check failed");
            false
        }
        Err(_) => {
            warn!("Storage health check timed out");
            false
        }
    };

    Json(ApiResponse::ok(HealthResponse {
        status: if available { "ok" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.started_at.elapsed().as_secs(),
        storage_provider: state.store.provider_type().to_string(),
        storage: if available { "available" } else { "unavailable" }.to_string(),
    }))
}
