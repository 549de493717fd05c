//! Owner share management handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::json;
use uuid::Uuid;

use sharegate_service::share::{CreateShareRequest, UpdateShareRequest};

use crate::dto::request::{AliasBody, FileIdsBody, NotifyBody, PasswordBody, RecipientsBody};
use crate::error::ApiResult;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /api/shares
pub async fn list_shares(
    State(state): State<AppState>,
    auth: AuthUser,
) -> ApiResult<Json<serde_json::Value>> {
    let shares = state.share_service.list_shares(&auth).await?;
    Ok(Json(json!({ "success": true, "data": shares })))
}

/// POST /api/shares
pub async fn create_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<CreateShareRequest>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let share = state.share_service.create_share(&auth, req).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": share })),
    ))
}

/// GET /api/shares/{id}
pub async fn get_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<serde_json::Value>> {
    let share = state.share_service.get_share(&auth, id).await?;
    Ok(Json(json!({ "success": true, "data": share })))
}

/// PATCH /api/shares/{id}
pub async fn update_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateShareRequest>,
) -> ApiResult<Json<serde_json::Value>> {
    let share = state.share_service.update_share(&auth, id, req).await?;
    Ok(Json(json!({ "success": true, "data": share })))
}

/// DELETE /api/shares/{id}
pub async fn delete_share(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.share_service.delete_share(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/shares/{id}/password
pub async fn update_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<PasswordBody>,
) -> ApiResult<Json<serde_json::Value>> {
    state
        .share_service
        .update_password(&auth, id, body.password.as_deref())
        .await?;
    Ok(Json(json!({
        "success": true,
        "data": { "hasPassword": body.password.is_some() }
    })))
}

/// PUT /api/shares/{id}/alias
pub async fn set_alias(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<AliasBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let alias = state.share_service.set_alias(&auth, id, &body.alias).await?;
    Ok(Json(json!({ "success": true, "data": alias })))
}

/// POST /api/shares/{id}/files
pub async fn add_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<FileIdsBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let share = state.share_service.add_files(&auth, id, &body.file_ids).await?;
    Ok(Json(json!({ "success": true, "data": share })))
}

/// DELETE /api/shares/{id}/files
pub async fn remove_files(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<FileIdsBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let share = state
        .share_service
        .remove_files(&auth, id, &body.file_ids)
        .await?;
    Ok(Json(json!({ "success": true, "data": share })))
}

/// POST /api/shares/{id}/recipients
pub async fn add_recipients(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<RecipientsBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let share = state
        .share_service
        .add_recipients(&auth, id, &body.recipients)
        .await?;
    Ok(Json(json!({ "success": true, "data": share })))
}

/// DELETE /api/shares/{id}/recipients
pub async fn remove_recipients(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<RecipientsBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let share = state
        .share_service
        .remove_recipients(&auth, id, &body.recipients)
        .await?;
    Ok(Json(json!({ "success": true, "data": share })))
}

/// POST /api/shares/{id}/notify
pub async fn notify_recipients(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    ValidatedJson(body): ValidatedJson<NotifyBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let notified = state
        .share_service
        .notify_recipients(&auth, id, &body.share_link)
        .await?;
    Ok(Json(json!({ "success": true, "data": notified })))
}
