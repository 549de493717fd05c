//! Owner library handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use sharegate_service::file::{LibraryUploadRequest, RegisterFileRequest};

use crate::error::ApiResult;
use crate::extractors::AuthUser;
use crate::state::AppState;

/// GET /api/files
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    let files = state.library_service.list(&auth).await?;
    Ok(Json(json!({ "success": true, "data": files })))
}

/// POST /api/files/uploads
pub async fn authorize_upload(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<LibraryUploadRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let grant = state.library_service.authorize_upload(&auth, &req).await?;
    Ok(Json(json!({ "success": true, "data": grant })))
}

/// POST /api/files
pub async fn register_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<RegisterFileRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let file = state.library_service.register(&auth, &req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": file })),
    ))
}

/// GET /api/files/{id}/download
pub async fn download_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let handle = state.library_service.download_url(&auth, id).await?;
    Ok(Json(json!({ "success": true, "data": handle })))
}

/// DELETE /api/files/{id}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.library_service.delete(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
