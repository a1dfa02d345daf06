//! Bharosa Server
//!
//! HTTP server for the Bharosa trust network.

use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bharosa_advisor::AdvisorConfig;
use bharosa_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "bharosa_server=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Simulated collaborator latency (OTP dispatch, biometric capture)
    let simulated_delay = std::env::var("BHAROSA_SIM_DELAY_MS")
        .ok()
        .and_then(|v| v.parse().ok())
        .map(Duration::from_millis)
        .unwrap_or_else(|| Duration::from_millis(1500));

    // Create application state
    let state = AppState::new(AdvisorConfig::from_env(), simulated_delay).await?;

    // Build router
    let app = bharosa_server::create_router(state);

    // Start server
    let addr = std::env::var("BHAROSA_BIND").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

    tracing::info!("Starting Bharosa server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
