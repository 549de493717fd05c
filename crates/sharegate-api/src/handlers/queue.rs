//! Download queue inspection and control.

use axum::Json;
use axum::extract::{Path, State};
use serde_json::json;
use uuid::Uuid;

use sharegate_core::types::DownloadId;
use sharegate_service::download::{DownloadStatus, QueueStatus};

use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/filesystem/download-queue/status
///
/// Lists every queued download id, so only owners may see it. Anonymous
/// callers poll their own entry by id.
pub async fn queue_status(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Json<ApiResponse<QueueStatus>> {
    Json(ApiResponse::ok(state.download_queue.queue_status()))
}

/// GET /api/filesystem/download-queue/{downloadId}
pub async fn download_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<DownloadStatus>>> {
    let status = state.download_queue.status(DownloadId::from(id))?;
    Ok(Json(ApiResponse::ok(status)))
}

/// DELETE /api/filesystem/download-queue/{downloadId}
pub async fn cancel_download(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Json<serde_json::Value> {
    let cancelled = state.download_queue.cancel(DownloadId::from(id));
    Json(json!({ "success": true, "data": { "cancelled": cancelled } }))
}

/// DELETE /api/filesystem/download-queue
pub async fn clear_queue(State(state): State<AppState>, auth: AuthUser) -> Json<serde_json::Value> {
    let cleared = state.download_queue.clear();
    tracing::info!(user_id = %auth.user_id, cleared, "Download queue cleared by owner");
    Json(json!({ "success": true, "data": { "cleared": cleared } }))
}
