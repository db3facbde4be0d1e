//! Simulation core for the Lifecast service: Conway's Game of Life,
//! streamed.
//!
//! The core owns the grid model, the generation-advance rule and its
//! change diffing, the session lifecycle state machine, and the
//! per-session tick driver that serializes commands and timer fires
//! through one owning task.
//!
//! # Modules
//!
//! - [`grid`] -- Fixed-size boolean matrix, the B3/S23 rule, and
//!   row-major change diffing.
//! - [`session`] -- Lifecycle state machine (`Idle` -> `Initialized`
//!   -> `Running` <-> `Paused`, terminal `Stopped`).
//! - [`driver`] -- The single-writer tick actor, its command handle,
//!   and the bounded drop-oldest publish boundary.
//! - [`config`] -- Typed configuration loaded from `lifecast.yaml`.

pub mod config;
pub mod driver;
pub mod grid;
pub mod session;

pub use driver::{spawn_session, DriverConfig, SessionHandle, SessionStatus};
pub use grid::{Grid, GridError};
pub use session::{Phase, Session, SessionError, DEFAULT_SEED_PROBABILITY};
