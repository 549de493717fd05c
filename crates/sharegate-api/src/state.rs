//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use sharegate_auth::jwt::JwtDecoder;
use sharegate_auth::password::PasswordHasher;
use sharegate_auth::token::TokenIssuer;
use sharegate_core::config::AppConfig;
use sharegate_core::events::EventBus;
use sharegate_core::traits::storage::ObjectStore;
use sharegate_database::Repositories;
use sharegate_service::{
    AccessResolver, AdoptionPipeline, DownloadQueue, LibraryService, ReverseShareService,
    ShareService,
};
use sharegate_storage::{BuiltStore, LocalObjectStore};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. Every field is
/// cheap to clone.
#[derive(Debug, Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    pub config: Arc<AppConfig>,
    pub started_at: Instant,

    // ── Infrastructure ───────────────────────────────────────
    /// Object store used by every service.
    pub store: Arc<dyn ObjectStore>,
    /// Set when the local provider is active; backs the token redemption
    /// routes.
    pub local_store: Option<Arc<LocalObjectStore>>,
    pub events: EventBus,

    // ── Auth ─────────────────────────────────────────────────
    /// Owner access-token decoder
    pub jwt_decoder: Arc<JwtDecoder>,
    /// Presigned handle issuer
    pub issuer: TokenIssuer,

    // ── Services ─────────────────────────────────────────────
    pub resolver: AccessResolver,
    pub download_queue: DownloadQueue,
    pub adoption: AdoptionPipeline,
    pub share_service: ShareService,
    pub reverse_share_service: ReverseShareService,
    pub library_service: LibraryService,
}

impl AppState {
    /// Wire every service from configuration, repositories and the built
    /// object store.
    pub fn new(
        config: AppConfig,
        repos: Repositories,
        built: BuiltStore,
        issuer: TokenIssuer,
        events: EventBus,
    ) -> Self {
        let hasher = PasswordHasher::new();
        let store = built.store;

        let resolver = AccessResolver::new(
            repos.clone(),
            store.clone(),
            issuer.clone(),
            hasher.clone(),
            config.tokens.clone(),
            events.clone(),
        );
        let download_queue = DownloadQueue::new(config.download_queue.clone());
        let adoption = AdoptionPipeline::new(
            repos.clone(),
            store.clone(),
            config.adoption.clone(),
            config.library.clone(),
            events.clone(),
        );
        let share_service = ShareService::new(repos.clone(), hasher.clone(), events.clone());
        let reverse_share_service = ReverseShareService::new(
            repos.clone(),
            store.clone(),
            hasher,
            config.tokens.clone(),
            events.clone(),
        );
        let library_service = LibraryService::new(
            repos,
            store.clone(),
            config.tokens.clone(),
            config.library.clone(),
        );

        Self {
            jwt_decoder: Arc::new(JwtDecoder::new(&config.auth)),
            config: Arc::new(config),
            started_at: Instant::now(),
            store,
            local_store: built.local,
            events,
            issuer,
            resolver,
            download_queue,
            adoption,
            share_service,
            reverse_share_service,
            library_service,
        }
    }
}
