use anyhow::Result;
use tokio::net::TcpListener;

use topic_hub::config::Settings;
use topic_hub::server::{create_app, AppState};
use topic_hub::shutdown::{shutdown_signal, GracefulShutdown};
use topic_hub::telemetry::init_tracing;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let settings = Settings::new()?;
    init_tracing(&settings.logging);
    tracing::info!("Configuration loaded");

    // Create application state
    let state = AppState::new(settings.clone());
    tracing::info!(
        cleanup_subscriptions_on_close = settings.websocket.cleanup_subscriptions_on_close,
        "Hub initialized"
    );

    let shutdown = GracefulShutdown::new(state.connections.clone());

    // Create Axum app
    let app = create_app(state);

    // Start server
    let addr = settings.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Close WebSockets first so upgraded connections do not hold the server open
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let reason = shutdown_signal().await;
            shutdown.execute(reason).await;
        })
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}
