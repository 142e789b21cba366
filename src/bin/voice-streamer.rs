//! Voice Streamer Application
//!
//! Serves the HTTP control API and plays queued media into UDP voice
//! connections until interrupted.
//!
//! Usage: `voice-streamer [config.toml]`

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use voice_streamer::{
    config::AppConfig,
    network::UdpGateway,
    player::Player,
    source::ProcessSource,
    ui::WebServer,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Voice Streamer");

    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load(config_path.as_deref()).context("Failed to load configuration")?;

    tracing::info!(
        producer = %config.source.program,
        target = %config.sink.target,
        queue_capacity = config.player.queue_capacity,
        "Configuration loaded"
    );

    let source = Arc::new(ProcessSource::new(config.source.clone()));
    let gateway = Arc::new(UdpGateway::new(config.sink.clone()));
    let player = Player::new(&config.player, source, gateway);

    let shutdown = CancellationToken::new();

    let web_server = WebServer::new(config.ui.clone(), player.handle());
    let web_handle = web_server.start_background(shutdown.child_token());

    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Shutting down...");
                    shutdown.cancel();
                }
                // Keep running; the process can still be stopped by other signals.
                Err(e) => tracing::error!("Failed to listen for Ctrl+C: {}", e),
            }
        });
    }

    if let Some(session) = player.run(&shutdown).await {
        session.close().await;
    }

    if let Err(e) = web_handle.await {
        tracing::warn!("HTTP API task ended abnormally: {}", e);
    }

    tracing::info!("Voice Streamer stopped");
    Ok(())
}
