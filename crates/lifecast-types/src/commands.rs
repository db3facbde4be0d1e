//! Inbound control commands for a simulation session.
//!
//! Commands arrive from the transport as JSON objects tagged by the
//! `cmd` field. Unknown or malformed commands fail to deserialize and
//! are discarded by the transport (logged, never fatal).

use serde::{Deserialize, Serialize};

/// Dimensions for an `init` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitOptions {
    /// Requested grid width in cells.
    pub w: usize,
    /// Requested grid height in cells.
    pub h: usize,
}

/// A control command for one session.
///
/// The JSON tag field is `cmd`, matching the shapes the browser client
/// sends: `{"cmd":"init","options":{"w":200,"h":200}}`, `{"cmd":"play"}`,
/// `{"cmd":"pause"}`, `{"cmd":"restart"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "lowercase")]
pub enum Command {
    /// Allocate and randomize a fresh grid of the given dimensions.
    Init {
        /// Requested grid dimensions.
        options: InitOptions,
    },
    /// Resume ticking.
    Play,
    /// Suspend ticking, retaining the grid.
    Pause,
    /// Re-initialize with the current dimensions and the default seed
    /// probability.
    Restart,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn init_command_parses() {
        let cmd: Command =
            serde_json::from_str(r#"{"cmd":"init","options":{"w":200,"h":100}}"#).unwrap();
        assert_eq!(
            cmd,
            Command::Init {
                options: InitOptions { w: 200, h: 100 }
            }
        );
    }

    #[test]
    fn bare_commands_parse() {
        for (raw, expected) in [
            (r#"{"cmd":"play"}"#, Command::Play),
            (r#"{"cmd":"pause"}"#, Command::Pause),
            (r#"{"cmd":"restart"}"#, Command::Restart),
        ] {
            let cmd: Command = serde_json::from_str(raw).unwrap();
            assert_eq!(cmd, expected);
        }
    }

    #[test]
    fn unknown_command_is_rejected() {
        let result: Result<Command, _> = serde_json::from_str(r#"{"cmd":"teleport"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn malformed_init_is_rejected() {
        let result: Result<Command, _> = serde_json::from_str(r#"{"cmd":"init"}"#);
        assert!(result.is_err());
    }
}
