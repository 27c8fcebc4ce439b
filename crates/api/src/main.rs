//! Relay API server binary entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use relay_common::config::AppConfig;
use relay_engine::{Coordinator, CoordinatorConfig, Delivery};
use relay_notifier::{ResendEmailSender, TwilioSmsSender};

use relay_api::routes::create_router;
use relay_api::state::AppState;

/// Upper bound on a `POST /comms` body.
const MAX_BODY_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(
                "relay_api=debug,relay_engine=debug,relay_notifier=info,tower_http=debug",
            )
        }))
        .json()
        .init();

    tracing::info!("Starting Relay API server...");

    // Load configuration; missing delivery credentials abort startup
    let config = AppConfig::from_env()?;

    // Build delivery collaborators
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()?;
    let email = ResendEmailSender::from_config(client.clone(), &config)?;
    let sms = TwilioSmsSender::from_config(client, &config)?;
    let delivery = Delivery::new(Arc::new(email), Arc::new(sms));

    // Start the dispatch engine
    let coordinator = Arc::new(Coordinator::new(CoordinatorConfig::from(&config), delivery));
    let state = AppState::new(Arc::clone(&coordinator));

    // Build router
    let app = create_router(state)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    tracing::info!("API server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Received shutdown signal, stopping gracefully...");
        })
        .await?;

    // Queued work is not drained; actors simply stop.
    let stopped = coordinator.shutdown();
    tracing::info!(actors = stopped, "Relay API server stopped.");
    Ok(())
}
