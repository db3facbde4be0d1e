//! Axum router construction for the gateway.
//!
//! Assembles the status page and the `WebSocket` endpoint into a
//! single [`Router`] with CORS middleware enabled so browser clients
//! served from elsewhere can connect during development.

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router for the gateway.
///
/// - `GET /` -- minimal HTML status page
/// - `GET /ws` -- `WebSocket` session stream
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws", get(ws::ws_session))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
