use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get, routing::post};
use tokio::net::TcpListener;
use tower_http::decompression::RequestDecompressionLayer;
use tracing::{error, info};

use super::{
    services::{fetch_batch, health, stats},
    state::AppState,
};
use crate::config::Config;
use crate::engine::Engine;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All routes over shared state
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/fetch", post(fetch_batch))
        .route("/operators/health", get(health))
        .route("/operators/stats", get(stats))
        .route("/health", get(health))
        .with_state(state)
        // gzip/deflate request bodies are inflated before handlers see them
        .layer(RequestDecompressionLayer::new())
}

/// Serve until Ctrl+C / SIGTERM, then drain the worker pool.
///
/// `address` overrides `server.bind_addr` when given.
pub async fn run(config: Config, address: Option<SocketAddr>) -> Result<(), AnyError> {
    let address = address.unwrap_or(config.server.bind_addr);

    let engine_config = config.engine.to_engine_config();
    info!(
        workers = engine_config.workers,
        queue_capacity = engine_config.queue_capacity,
        timeout_secs = engine_config.fetch.request_timeout.as_secs(),
        "Starting fetch engine"
    );
    let engine = Arc::new(
        Engine::new(engine_config).map_err(|e| format!("Failed to start engine: {}", e))?,
    );

    let app = router(AppState::new(config, engine.clone()));

    let listener = TcpListener::bind(address).await?;
    info!(%address, "linkfetcher listening");

    let served = axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await;

    engine.stop().await;
    served?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
