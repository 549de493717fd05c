//! Owner reverse share management and adoption handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use sharegate_service::reverse_share::{CreateReverseShareRequest, UpdateReverseShareRequest};

use crate::dto::request::{AliasBody, PasswordBody, RenameFileBody};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /api/reverse-shares
pub async fn list_reverse_shares(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    let reverse_shares = state
        .reverse_share_service
        .list_reverse_shares(&auth)
        .await?;
    Ok(Json(json!({ "success": true, "data": reverse_shares })))
}

/// POST /api/reverse-shares
pub async fn create_reverse_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateReverseShareRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let reverse_share = state
        .reverse_share_service
        .create_reverse_share(&auth, req)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": reverse_share })),
    ))
}

/// GET /api/reverse-shares/{id}
pub async fn get_reverse_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let reverse_share = state
        .reverse_share_service
        .get_reverse_share(&auth, id)
        .await?;
    Ok(Json(json!({ "success": true, "data": reverse_share })))
}

/// PATCH /api/reverse-shares/{id}
pub async fn update_reverse_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateReverseShareRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let reverse_share = state
        .reverse_share_service
        .update_reverse_share(&auth, id, req)
        .await?;
    Ok(Json(json!({ "success": true, "data": reverse_share })))
}

/// DELETE /api/reverse-shares/{id}
pub async fn delete_reverse_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .reverse_share_service
        .delete_reverse_share(&auth, id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/reverse-shares/{id}/password
pub async fn update_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<PasswordBody>,
) -> ApiResult<Json<serde_json::Value>> {
    state
        .reverse_share_service
        .update_password(&auth, id, body.password.as_deref())
        .await?;
    Ok(Json(json!({
        "success": true,
        "data": { "hasPassword": body.password.is_some() }
    })))
}

/// PUT /api/reverse-shares/{id}/alias
pub async fn set_alias(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<AliasBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let alias = state
        .reverse_share_service
        .set_alias(&auth, id, &body.alias)
        .await?;
    Ok(Json(json!({ "success": true, "data": alias })))
}

/// POST /api/reverse-shares/{id}/activate
pub async fn activate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let reverse_share = state.reverse_share_service.activate(&auth, id).await?;
    Ok(Json(json!({ "success": true, "data": reverse_share })))
}

/// POST /api/reverse-shares/{id}/deactivate
pub async fn deactivate(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let reverse_share = state.reverse_share_service.deactivate(&auth, id).await?;
    Ok(Json(json!({ "success": true, "data": reverse_share })))
}

/// GET /api/reverse-shares/{id}/files
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let files = state.reverse_share_service.list_files(&auth, id).await?;
    Ok(Json(json!({ "success": true, "data": files })))
}

/// PATCH /api/reverse-shares/files/{fileId}
pub async fn rename_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(file_id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<RenameFileBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let file = state
        .reverse_share_service
        .rename_file(&auth, file_id, &body.name)
        .await?;
    Ok(Json(json!({ "success": true, "data": file })))
}

/// DELETE /api/reverse-shares/files/{fileId}
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(file_id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state
        .reverse_share_service
        .delete_file(&auth, file_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/reverse-shares/files/{fileId}/download
pub async fn download_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(file_id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let handle = state
        .reverse_share_service
        .download_url(&auth, file_id)
        .await?;
    Ok(Json(json!({ "success": true, "data": handle })))
}

/// POST /api/reverse-shares/files/{fileId}/copy
///
/// Copies an uploaded file into the caller's library. Waits for the copy
/// to commit or fail.
pub async fn copy_to_library(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(file_id): Path<Uuid>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let file = state.adoption.adopt(&auth, file_id).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": file })),
    ))
}
