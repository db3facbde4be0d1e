//! Gateway binary for the Lifecast simulation service.
//!
//! Wires the simulation core to its WebSocket transport: loads
//! configuration, spawns the shared session when the scope calls for
//! one, and serves the HTTP/WebSocket endpoints.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `lifecast.yaml` (defaults if absent)
//! 3. Build application state, spawning the shared session driver
//! 4. Initialize the shared session's grid (shared scope only)
//! 5. Serve HTTP + `WebSocket` until terminated

mod error;
mod handlers;
mod router;
mod server;
mod state;
mod ws;

use std::path::Path;
use std::sync::Arc;

use lifecast_core::config::ServiceConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::GatewayError;
use crate::router::build_router;
use crate::state::AppState;

/// Application entry point for the gateway.
///
/// # Errors
///
/// Returns an error if configuration loading, shared session
/// initialization, or the server itself fails.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("lifecast-gateway starting");

    let config = load_config()?;
    info!(
        host = config.server.host,
        port = config.server.port,
        scope = ?config.session.scope,
        tick_rate_hz = config.session.tick_rate_hz,
        "configuration loaded"
    );

    let state = Arc::new(AppState::new(&config));

    // The shared world is seeded once at startup and stays paused
    // until an observer sends play.
    if let Some(shared) = state.shared_session() {
        shared
            .init(
                config.session.width,
                config.session.height,
                config.session.seed_probability,
            )
            .await
            .map_err(GatewayError::from)?;
        info!(
            session_id = %shared.id(),
            width = config.session.width,
            height = config.session.height,
            "shared session initialized"
        );
    }

    let router = build_router(Arc::clone(&state));
    server::start_server(&config.server, router)
        .await
        .map_err(GatewayError::from)?;

    Ok(())
}

/// Load the service configuration from `lifecast.yaml`.
///
/// Looks for the config file relative to the current working
/// directory; defaults are used when it does not exist.
fn load_config() -> Result<ServiceConfig, GatewayError> {
    let config_path = Path::new("lifecast.yaml");
    if config_path.exists() {
        Ok(ServiceConfig::from_file(config_path)?)
    } else {
        info!("config file not found, using defaults");
        Ok(ServiceConfig::default())
    }
}
