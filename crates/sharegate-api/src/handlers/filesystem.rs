//! Redemption of locally presigned upload and download handles.
//!
//! Only mounted in effect when the local provider is active; with a remote
//! object store the presigned URLs point at the store itself.

use std::sync::Arc;

use axum::Json;
use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::Response;
use futures::{StreamExt, TryStreamExt};
use tracing::{debug, info};

use sharegate_auth::token::TokenOperation;
use sharegate_core::error::AppError;
use sharegate_core::traits::storage::{ByteStream, ObjectStore};
use sharegate_core::types::DownloadId;
use sharegate_service::download::{ActivePermit, DownloadMeta};
use sharegate_storage::LocalObjectStore;

use crate::dto::request::DownloadQuery;
use crate::dto::response::{ApiResponse, StoredObject};
use crate::error::ApiResult;
use crate::middleware::cors::DOWNLOAD_ID_HEADER;
use crate::state::AppState;

fn local_store(state: &AppState) -> Result<&Arc<LocalObjectStore>, AppError> {
    state
        .local_store
        .as_ref()
        .ok_or_else(|| AppError::not_found("Local storage is not enabled"))
}

/// PUT /api/filesystem/upload/{token}
pub async fn upload(
    State(state): State<AppState>,
    Path(token): Path<String>,
    body: Body,
) -> ApiResult<(StatusCode, Json<ApiResponse<StoredObject>>)> {
    let store = local_store(&state)?;
    let grant = state.issuer.validate_for(&token, TokenOperation::Upload)?;

    let stream: ByteStream = Box::pin(body.into_data_stream().map_err(std::io::Error::other));
    let size = store.write_stream(&grant.resource, stream).await?;

    info!(object = %grant.resource, size, "Local upload stored");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(StoredObject {
            object_name: grant.resource,
            size,
        })),
    ))
}

/// GET /api/filesystem/download/{token}?downloadId=...
///
/// Waits for a slot in the download queue, then streams the object. The
/// slot is held by the response body and freed when the body finishes or
/// is dropped; cancelling the download through the queue ends the stream.
pub async fn download(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> ApiResult<Response> {
    let store = local_store(&state)?;
    let grant = state.issuer.validate_for(&token, TokenOperation::Download)?;
    let object = grant.resource;

    let size = store.head_object(&object).await?;
    let file_name = object.rsplit('/').next().unwrap_or(&object).to_string();
    let id = query.download_id.map(DownloadId::from).unwrap_or_default();

    let permit = state
        .download_queue
        .acquire(
            id,
            DownloadMeta {
                file_name: Some(file_name.clone()),
                file_size: Some(size),
            },
        )
        .await?;
    debug!(download_id = %id, object = %object, tracked = permit.is_tracked(), "Download admitted");

    let stream = store.read(&object).await?;
    let body = Body::from_stream(hold_permit(stream, permit));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, size)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name.replace('"', "")),
        )
        .header(
            DOWNLOAD_ID_HEADER,
            HeaderValue::from_str(&id.to_string())
                .map_err(|e| AppError::internal(format!("Invalid download id header: {e}")))?,
        )
        .body(body)
        .map_err(|e| AppError::internal(format!("Response build failed: {e}")).into())
}

/// Tie the permit's lifetime to the body and stop at cancellation.
fn hold_permit(stream: ByteStream, permit: ActivePermit) -> ByteStream {
    let cancelled = permit.cancellation().cancelled_owned();
    Box::pin(stream.take_until(cancelled).map(move |chunk| {
        let _held = &permit;
        chunk
    }))
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use futures::stream;

    use sharegate_core::config::DownloadQueueConfig;
    use sharegate_service::DownloadQueue;

    use super::*;

    fn endless() -> ByteStream {
        Box::pin(stream::repeat_with(|| Ok(Bytes::from_static(b"chunk"))))
    }

    #[tokio::test]
    async fn test_cancel_ends_body_and_frees_slot() {
        let queue = DownloadQueue::new(DownloadQueueConfig {
            max_concurrent: 1,
            min_file_size_bytes: 0,
            ..DownloadQueueConfig::default()
        });
        let id = DownloadId::new();
        let permit = queue
            .acquire(id, DownloadMeta::default())
            .await
            .unwrap();
        let mut body = hold_permit(endless(), permit);

        assert!(body.next().await.is_some());
        assert!(queue.cancel(id));
        assert!(body.next().await.is_none());
        assert_eq!(queue.queue_status().active_downloads, 0);
    }

    #[tokio::test]
    async fn test_dropping_body_releases_permit() {
        let queue = DownloadQueue::new(DownloadQueueConfig {
            max_concurrent: 1,
            min_file_size_bytes: 0,
            ..DownloadQueueConfig::default()
        });
        let permit = queue
            .acquire(DownloadId::new(), DownloadMeta::default())
            .await
            .unwrap();
        let body = hold_permit(endless(), permit);
        assert_eq!(queue.queue_status().active_downloads, 1);

        drop(body);
        assert_eq!(queue.queue_status().active_downloads, 0);
    }
}
