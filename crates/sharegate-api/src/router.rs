//! Route definitions for the Sharegate HTTP API.
//!
//! All routes are mounted under `/api`. Public routes are grouped apart
//! from owner routes; owner handlers authenticate through the
//! [`AuthUser`](crate::extractors::AuthUser) extractor.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{delete, get, patch, post, put},
};

use crate::handlers;
use crate::state::AppState;

/// Build the API router with every route, threaded with `state`.
pub fn build_router(state: AppState) -> Router {
    let max_body = usize::try_from(state.config.server.max_body_bytes).unwrap_or(usize::MAX);

    let api_routes = Router::new()
        .merge(public_routes())
        .merge(filesystem_routes())
        .merge(share_routes())
        .merge(reverse_share_routes())
        .merge(file_routes())
        .route("/health", get(handlers::health::health));

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .with_state(state)
}

/// Anonymous alias access
fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/s/{alias}", post(handlers::public::resolve_share))
        .route("/r/{alias}", post(handlers::public::open_reverse_share))
        .route(
            "/r/{alias}/uploads",
            post(handlers::public::authorize_upload),
        )
        .route("/r/{alias}/files", post(handlers::public::register_upload))
}

/// Local handle redemption and the download queue
fn filesystem_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/filesystem/upload/{token}",
            put(handlers::filesystem::upload),
        )
        .route(
            "/filesystem/download/{token}",
            get(handlers::filesystem::download),
        )
        .route(
            "/filesystem/download-queue",
            delete(handlers::queue::clear_queue),
        )
        .route(
            "/filesystem/download-queue/status",
            get(handlers::queue::queue_status),
        )
        .route(
            "/filesystem/download-queue/{download_id}",
            get(handlers::queue::download_status).delete(handlers::queue::cancel_download),
        )
}

/// Owner share management
fn share_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/shares",
            get(handlers::share::list_shares).post(handlers::share::create_share),
        )
        .route(
            "/shares/{id}",
            get(handlers::share::get_share)
                .patch(handlers::share::update_share)
                .delete(handlers::share::delete_share),
        )
        .route(
            "/shares/{id}/password",
            put(handlers::share::update_password),
        )
        .route("/shares/{id}/alias", put(handlers::share::set_alias))
        .route(
            "/shares/{id}/files",
            post(handlers::share::add_files).delete(handlers::share::remove_files),
        )
        .route(
            "/shares/{id}/recipients",
            post(handlers::share::add_recipients).delete(handlers::share::remove_recipients),
        )
        .route("/shares/{id}/notify", post(handlers::share::notify_recipients))
}

/// Owner reverse share management and adoption
fn reverse_share_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/reverse-shares",
            get(handlers::reverse_share::list_reverse_shares)
                .post(handlers::reverse_share::create_reverse_share),
        )
        .route(
            "/reverse-shares/{id}",
            get(handlers::reverse_share::get_reverse_share)
                .patch(handlers::reverse_share::update_reverse_share)
                .delete(handlers::reverse_share::delete_reverse_share),
        )
        .route(
            "/reverse-shares/{id}/password",
            put(handlers::reverse_share::update_password),
        )
        .route(
            "/reverse-shares/{id}/alias",
            put(handlers::reverse_share::set_alias),
        )
        .route(
            "/reverse-shares/{id}/activate",
            post(handlers::reverse_share::activate),
        )
        .route(
            "/reverse-shares/{id}/deactivate",
            post(handlers::reverse_share::deactivate),
        )
        .route(
            "/reverse-shares/{id}/files",
            get(handlers::reverse_share::list_files),
        )
        .route(
            "/reverse-shares/files/{file_id}",
            patch(handlers::reverse_share::rename_file)
                .delete(handlers::reverse_share::delete_file),
        )
        .route(
            "/reverse-shares/files/{file_id}/download",
            get(handlers::reverse_share::download_file),
        )
        .route(
            "/reverse-shares/files/{file_id}/copy",
            post(handlers::reverse_share::copy_to_library),
        )
}

/// Owner library
fn file_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/files",
            get(handlers::file::list_files).post(handlers::file::register_file),
        )
        .route("/files/uploads", post(handlers::file::authorize_upload))
        .route("/files/{id}/download", get(handlers::file::download_file))
        .route(
            "/files/{id}",
            delete(handlers::file::delete_file),
        )
}
