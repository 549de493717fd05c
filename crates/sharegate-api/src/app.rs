//! Application builder: wires router, middleware and state into an Axum
//! app, and runs it with its background tasks.

use std::time::Duration;

use axum::Router;
use axum::middleware::from_fn;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use sharegate_auth::token::TokenIssuer;
use sharegate_core::config::AppConfig;
use sharegate_core::error::{AppError, ErrorKind};
use sharegate_core::events::{AdoptionEvent, DomainEvent, EventBus, EventPayload};
use sharegate_database::{DatabasePool, Repositories};
use sharegate_storage::build_object_store;

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Buffered events per subscriber.
const EVENT_CAPACITY: usize = 256;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(from_fn(request_logging))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Runs the Sharegate server until Ctrl+C.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    info!("Starting Sharegate server...");

    // ── Step 1: Token issuer ─────────────────────────────────────
    let issuer = TokenIssuer::from_config(&config.auth);

    // ── Step 2: Repositories ─────────────────────────────────────
    let repos = if config.database.is_memory() {
        warn!("Using in-memory stores; all data is lost on shutdown");
        Repositories::memory()
    } else {
        let pool = DatabasePool::connect(&config.database).await?;
        pool.migrate().await?;
        Repositories::postgres(pool.pool())
    };

    // ── Step 3: Object store ─────────────────────────────────────
    let built = build_object_store(&config, issuer.clone()).await?;
    info!(provider = built.store.provider_type(), "Object store ready");

    // ── Step 4: Services ─────────────────────────────────────────
    let events = EventBus::new(EVENT_CAPACITY);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = AppState::new(config, repos, built, issuer, events.clone());

    // ── Step 5: Background tasks ─────────────────────────────────
    let shutdown = CancellationToken::new();
    let cleanup = state.download_queue.spawn_cleanup(shutdown.clone());
    let event_log = spawn_event_logger(events.subscribe(), shutdown.clone());

    // ── Step 6: Build and start HTTP server ──────────────────────
    let app = build_app(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, format!("Failed to bind {addr}"), e))?;

    info!(%addr, "Sharegate server listening");

    let signal = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            signal.cancel();
        })
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Internal, "Server error", e))?;

    shutdown.cancel();
    if tokio::time::timeout(grace, async { tokio::join!(cleanup, event_log) })
        .await
        .is_err()
    {
        warn!(grace_seconds = grace.as_secs(), "Background tasks did not stop in time");
    }
    info!("Sharegate server stopped");
    Ok(())
}

/// Log every domain event until shutdown.
pub fn spawn_event_logger(
    mut events: broadcast::Receiver<DomainEvent>,
    shutdown: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                received = events.recv() => match received {
                    Ok(event) => log_event(&event),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Event logger lagged behind");
                    }
                    Err(RecvError::Closed) => break,
                },
            }
        }
    })
}

fn log_event(event: &DomainEvent) {
    match &event.payload {
        EventPayload::Adoption(AdoptionEvent::Failed {
            reverse_share_file_id,
            reason,
        }) => warn!(
            event_id = %event.id,
            reverse_share_file_id = %reverse_share_file_id,
            reason = %reason,
            "Adoption failed"
        ),
        payload => info!(
            event_id = %event.id,
            actor_id = ?event.actor_id,
            payload = ?payload,
            "Domain event"
        ),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C; shutting down");
    }
}
