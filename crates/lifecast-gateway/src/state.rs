//! Shared application state for the gateway.
//!
//! [`AppState`] holds the session scope decision: either one shared
//! session every observer subscribes to, or a fresh session per
//! connection. The core engine is agnostic to how many sessions exist
//! -- the gateway is the only place that knows.

use lifecast_core::config::{ServiceConfig, SessionConfig, SessionScope};
use lifecast_core::{spawn_session, DriverConfig, SessionHandle};

/// Shared state for the Axum application.
///
/// Wrapped in `Arc` and injected via Axum's `State` extractor.
pub struct AppState {
    /// Session defaults (dimensions, seed probability) applied to
    /// `init` commands.
    session_defaults: SessionConfig,
    /// Driver tunables used when spawning per-client sessions.
    driver_config: DriverConfig,
    /// The shared session, present only in [`SessionScope::Shared`].
    shared: Option<SessionHandle>,
}

impl AppState {
    /// Build the application state, spawning the shared session when
    /// the configured scope calls for one. The shared session starts
    /// idle; the caller initializes it during startup.
    pub fn new(config: &ServiceConfig) -> Self {
        let driver_config = DriverConfig {
            tick_rate_hz: config.session.tick_rate_hz,
            broadcast_capacity: config.stream.broadcast_capacity,
            command_queue_depth: config.stream.command_queue_depth,
        };

        let shared = match config.session.scope {
            SessionScope::Shared => Some(spawn_session(&driver_config)),
            SessionScope::PerClient => None,
        };

        Self {
            session_defaults: config.session.clone(),
            driver_config,
            shared,
        }
    }

    /// The shared session handle, if the scope is shared.
    pub const fn shared_session(&self) -> Option<&SessionHandle> {
        self.shared.as_ref()
    }

    /// Seed probability applied to `init` and `restart` commands.
    pub const fn seed_probability(&self) -> f64 {
        self.session_defaults.seed_probability
    }

    /// Obtain the session for a new connection.
    ///
    /// Returns the handle plus whether the connection owns it: owned
    /// (per-client) sessions are stopped when the connection closes,
    /// the shared session outlives every observer.
    pub fn session_for_connection(&self) -> (SessionHandle, bool) {
        self.shared.as_ref().map_or_else(
            || (spawn_session(&self.driver_config), true),
            |shared| (shared.clone(), false),
        )
    }
}
