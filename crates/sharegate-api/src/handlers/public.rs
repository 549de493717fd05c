//! Anonymous access by alias.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use serde_json::json;

use sharegate_service::access::RegisterUpload;

use crate::dto::request::{AuthorizeUploadBody, OpenReverseShareBody, ResolveShareBody};
use crate::error::ApiResult;
use crate::extractors::ValidatedJson;
use crate::state::AppState;

/// POST /api/s/{alias}
pub async fn resolve_share(
    State(state): State<AppState>,
    Path(alias): Path<String>,
    ValidatedJson(body): ValidatedJson<ResolveShareBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let resolved = state
        .resolver
        .resolve_share(&alias, body.password.as_deref(), body.file_ids.as_deref())
        .await?;
    Ok(Json(json!({ "success": true, "data": resolved })))
}

/// POST /api/r/{alias}
pub async fn open_reverse_share(
    State(state): State<AppState>,
    Path(alias): Path<String>,
    ValidatedJson(body): ValidatedJson<OpenReverseShareBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let info = state
        .resolver
        .open_reverse_share(&alias, body.password.as_deref())
        .await?;
    Ok(Json(json!({ "success": true, "data": info })))
}

/// POST /api/r/{alias}/uploads
pub async fn authorize_upload(
    State(state): State<AppState>,
    Path(alias): Path<String>,
    ValidatedJson(body): ValidatedJson<AuthorizeUploadBody>,
) -> ApiResult<Json<serde_json::Value>> {
    let (password, request) = body.into_parts();
    let grant = state
        .resolver
        .authorize_upload(&alias, password.as_deref(), &request)
        .await?;
    Ok(Json(json!({ "success": true, "data": grant })))
}

/// POST /api/r/{alias}/files
pub async fn register_upload(
    State(state): State<AppState>,
    Path(alias): Path<String>,
    Json(body): Json<RegisterUpload>,
) -> ApiResult<(StatusCode, Json<serde_json::Value>)> {
    let file = state.resolver.register_upload(&alias, &body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "data": file })),
    ))
}
