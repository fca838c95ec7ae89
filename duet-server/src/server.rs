use crate::config::ServerConfig;
use crate::room::RoomRegistry;
use crate::signaling::{SignalingService, ws_handler};
use crate::transport::RtcNegotiatorFactory;
use anyhow::{Context, Result};
use axum::Router;
use axum::routing::get;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;

/// `GET /ws` upgrades to the signaling socket; every other path is served
/// from `static_dir`.
pub fn router(service: SignalingService, static_dir: impl AsRef<Path>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws_handler))
        .fallback_service(ServeDir::new(static_dir))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(service)
}

/// Binds `config.addr` and serves until Ctrl-C.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let registry = RoomRegistry::with_candidate_buffer(config.handshake.candidate_buffer);
    let negotiators = Arc::new(RtcNegotiatorFactory::new(config.transport.clone()));
    let service = SignalingService::new(registry, negotiators, config.handshake.clone());

    let app = router(service, &config.static_dir);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.addr))?;
    info!("Signaling server listening on http://{}", config.addr);
    info!("Serving static files from {}", config.static_dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server runs until killed.
        std::future::pending::<()>().await;
    }
}
