//! Shared type definitions for the Lifecast simulation service.
//!
//! This crate holds the wire-facing shapes exchanged between the
//! simulation core and its transport: inbound control commands,
//! outbound snapshot/delta events, and the strongly-typed session
//! identifier. It contains no logic and no async code so both the
//! core and the gateway can depend on it freely.

pub mod commands;
pub mod events;
pub mod ids;

pub use commands::{Command, InitOptions};
pub use events::{CellChange, OutputEvent};
pub use ids::SessionId;
