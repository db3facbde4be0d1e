//! Configuration loading and typed config structures.
//!
//! The canonical configuration lives in `lifecast.yaml` next to the
//! binary. This module defines strongly-typed structs mirroring the
//! YAML structure and a loader that reads and validates the file.
//! Every field has a default matching the original deployment (a
//! 200x200 grid seeded at 0.15, ticking at 30 Hz on port 8081), so a
//! missing file or empty document is valid.

use std::path::Path;

use serde::Deserialize;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The parsed configuration holds an out-of-range value.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level service configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceConfig {
    /// HTTP/WebSocket listener settings.
    #[serde(default)]
    pub server: HttpConfig,

    /// Session defaults (grid size, seeding, tick rate, scope).
    #[serde(default)]
    pub session: SessionConfig,

    /// Output stream and command queue bounds.
    #[serde(default)]
    pub stream: StreamConfig,
}

impl ServiceConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value is out of range.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML,
    /// or [`ConfigError::Invalid`] if a value is out of range.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every value against its permitted range.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.width == 0 || self.session.height == 0 {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "grid dimensions must be positive, got {}x{}",
                    self.session.width, self.session.height
                ),
            });
        }
        if !(0.0..=1.0).contains(&self.session.seed_probability) {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "seed_probability must be within [0, 1], got {}",
                    self.session.seed_probability
                ),
            });
        }
        if !(1..=240).contains(&self.session.tick_rate_hz) {
            return Err(ConfigError::Invalid {
                reason: format!(
                    "tick_rate_hz must be within 1..=240, got {}",
                    self.session.tick_rate_hz
                ),
            });
        }
        if self.stream.broadcast_capacity == 0 || self.stream.command_queue_depth == 0 {
            return Err(ConfigError::Invalid {
                reason: String::from("stream bounds must be at least 1"),
            });
        }
        Ok(())
    }
}

/// HTTP/WebSocket listener configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HttpConfig {
    /// The host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// The TCP port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Whether all observers share one world or each gets their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionScope {
    /// One session created at startup, broadcast to every observer.
    Shared,
    /// One session per connecting observer, stopped on disconnect.
    PerClient,
}

/// Session defaults applied at spawn and init.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SessionConfig {
    /// Default grid width in cells.
    #[serde(default = "default_width")]
    pub width: usize,

    /// Default grid height in cells.
    #[serde(default = "default_height")]
    pub height: usize,

    /// Seed probability used for init and restart, in `[0, 1]`.
    #[serde(default = "default_seed_probability")]
    pub seed_probability: f64,

    /// Timer frequency in ticks per second, `1..=240`.
    #[serde(default = "default_tick_rate_hz")]
    pub tick_rate_hz: u32,

    /// Session deployment scope.
    #[serde(default = "default_scope")]
    pub scope: SessionScope,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            seed_probability: default_seed_probability(),
            tick_rate_hz: default_tick_rate_hz(),
            scope: default_scope(),
        }
    }
}

/// Output stream and command queue bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamConfig {
    /// Bounded capacity of the per-session output stream.
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,

    /// Bounded depth of the per-session command queue.
    #[serde(default = "default_command_queue_depth")]
    pub command_queue_depth: usize,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: default_broadcast_capacity(),
            command_queue_depth: default_command_queue_depth(),
        }
    }
}

fn default_host() -> String {
    String::from("0.0.0.0")
}

const fn default_port() -> u16 {
    8081
}

const fn default_width() -> usize {
    200
}

const fn default_height() -> usize {
    200
}

const fn default_seed_probability() -> f64 {
    0.15
}

const fn default_tick_rate_hz() -> u32 {
    30
}

const fn default_scope() -> SessionScope {
    SessionScope::Shared
}

const fn default_broadcast_capacity() -> usize {
    256
}

const fn default_command_queue_depth() -> usize {
    32
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ServiceConfig::parse("{}").unwrap();
        assert_eq!(config, ServiceConfig::default());
        assert_eq!(config.server.port, 8081);
        assert_eq!((config.session.width, config.session.height), (200, 200));
        assert_eq!(config.session.tick_rate_hz, 30);
        assert_eq!(config.session.scope, SessionScope::Shared);
    }

    #[test]
    fn partial_document_overrides_selected_fields() {
        let yaml = r"
server:
  port: 9000
session:
  width: 64
  height: 48
  tick_rate_hz: 60
  scope: per_client
";
        let config = ServiceConfig::parse(yaml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!((config.session.width, config.session.height), (64, 48));
        assert_eq!(config.session.tick_rate_hz, 60);
        assert_eq!(config.session.scope, SessionScope::PerClient);
        assert_eq!(config.stream.broadcast_capacity, 256);
    }

    #[test]
    fn zero_dimensions_are_rejected() {
        let result = ServiceConfig::parse("session:\n  width: 0\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn out_of_range_probability_is_rejected() {
        let result = ServiceConfig::parse("session:\n  seed_probability: 1.5\n");
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn out_of_range_tick_rate_is_rejected() {
        for yaml in [
            "session:\n  tick_rate_hz: 0\n",
            "session:\n  tick_rate_hz: 500\n",
        ] {
            let result = ServiceConfig::parse(yaml);
            assert!(matches!(result, Err(ConfigError::Invalid { .. })));
        }
    }

    #[test]
    fn unknown_scope_is_a_parse_error() {
        let result = ServiceConfig::parse("session:\n  scope: galaxy\n");
        assert!(matches!(result, Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let result = ServiceConfig::from_file(Path::new("/nonexistent/lifecast.yaml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
