//! HTTP server setup and routing

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::config::UiConfig;
use crate::error::{Error, Result};
use crate::player::PlayerHandle;
use crate::ui::handlers;

/// Shared state for every handler
pub struct AppState {
    pub handle: PlayerHandle,
}

/// Build the API router
pub fn router(handle: PlayerHandle) -> Router {
    let state = Arc::new(AppState { handle });

    Router::new()
        .route("/api/status", get(handlers::get_status))
        .route("/api/queue", post(handlers::enqueue).delete(handlers::clear_queue))
        .route("/api/pause", post(handlers::pause))
        .route("/api/resume", post(handlers::resume))
        .route("/api/skip", post(handlers::skip))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct WebServer {
    config: UiConfig,
    handle: PlayerHandle,
}

impl WebServer {
    pub fn new(config: UiConfig, handle: PlayerHandle) -> Self {
        Self { config, handle }
    }

    pub fn address(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.config.bind_address, self.config.http_port)
            .parse()
            .map_err(|e| Error::Config(format!("ui.bind_address: {}", e)))
    }

    /// Serve until `shutdown` fires
    pub async fn serve(self, shutdown: CancellationToken) -> Result<()> {
        let addr = self.address()?;
        let app = router(self.handle);

        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("HTTP API listening on http://{}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("HTTP API stopped");
        Ok(())
    }

    /// Spawn [`serve`](Self::serve) on the runtime
    pub fn start_background(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Err(e) = self.serve(shutdown).await {
                error!("HTTP API failed: {}", e);
            }
        })
    }
}
