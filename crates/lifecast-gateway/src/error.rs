//! Error types for the gateway binary.
//!
//! [`GatewayError`] is the top-level error type that wraps all failure
//! modes during startup so `main` can propagate them with `?`.

/// Top-level error for the gateway binary.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: lifecast_core::config::ConfigError,
    },

    /// Initializing the shared session failed.
    #[error("session error: {source}")]
    Session {
        /// The underlying session error.
        #[from]
        source: lifecast_core::SessionError,
    },

    /// The HTTP server failed to bind or serve.
    #[error("server error: {source}")]
    Server {
        /// The underlying server error.
        #[from]
        source: crate::server::ServerError,
    },
}
