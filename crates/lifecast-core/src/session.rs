//! Session lifecycle state machine.
//!
//! A [`Session`] owns exactly one [`Grid`] plus its pause status and
//! arbitrates every mutation: init, play, pause, restart, stop, and
//! the per-tick advance. It is a plain synchronous state machine --
//! the single-writer discipline comes from the owning
//! [`driver`](crate::driver) task, which is the only code that ever
//! touches a session. That makes a tick-vs-command race structurally
//! impossible rather than something to recover from.
//!
//! States: `Idle` (no grid) -> `Initialized` (randomized, paused) ->
//! `Running` <-> `Paused`, any non-stopped state -> `Initialized` via
//! restart, terminal `Stopped`.

use lifecast_types::{OutputEvent, SessionId};
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::grid::{Grid, GridError};

/// Seed probability used by restart, matching the original service.
pub const DEFAULT_SEED_PROBABILITY: f64 = 0.15;

/// Errors returned by session commands.
///
/// All failures are local to the requesting command: the session keeps
/// its prior state and the process never terminates.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// A command that requires a grid arrived before `init`.
    #[error("session has not been initialized")]
    NotInitialized,

    /// The session reached its terminal state and accepts no further
    /// commands.
    #[error("session is stopped")]
    Stopped,

    /// A grid operation failed.
    #[error("grid error: {source}")]
    Grid {
        /// The underlying grid error.
        #[from]
        source: GridError,
    },
}

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// No grid allocated yet.
    Idle,
    /// Grid randomized, tick driver suspended.
    Initialized,
    /// Tick driver advancing the grid.
    Running,
    /// Tick driver suspended, grid retained.
    Paused,
    /// Terminal: timer cancelled, output stream released.
    Stopped,
}

/// One independently controlled simulation instance.
#[derive(Debug)]
pub struct Session {
    /// Stable identifier, used for log correlation.
    id: SessionId,
    /// The owned grid, absent until the first successful `init`.
    grid: Option<Grid>,
    /// Current lifecycle phase. The phase is the single source of
    /// truth for whether a tick may advance the grid.
    phase: Phase,
    /// Generations advanced since the last init/restart.
    generation: u64,
    /// Seedable randomness source for grid seeding.
    rng: StdRng,
}

impl Session {
    /// Create an idle session with the given randomness source.
    pub const fn new(id: SessionId, rng: StdRng) -> Self {
        Self {
            id,
            grid: None,
            phase: Phase::Idle,
            generation: 0,
            rng,
        }
    }

    /// The session identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// The current lifecycle phase.
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether the tick driver is forbidden from advancing the grid.
    pub const fn paused(&self) -> bool {
        !matches!(self.phase, Phase::Running)
    }

    /// Generations advanced since the last init/restart.
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of alive cells, or 0 before the first init. Diagnostic
    /// reads go through the owning driver like every other access.
    pub fn alive_count(&self) -> usize {
        self.grid.as_ref().map_or(0, Grid::alive_count)
    }

    /// Grid dimensions `(width, height)`, if initialized.
    pub fn dimensions(&self) -> Option<(usize, usize)> {
        self.grid.as_ref().map(|grid| (grid.width(), grid.height()))
    }

    /// Allocate a fresh randomized grid and transition to
    /// `Initialized` (paused). Returns the snapshot event to publish.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Stopped`] after `stop`, or a wrapped
    /// [`GridError`] for invalid dimensions or seed probability; the
    /// session keeps its prior state on error.
    pub fn init(
        &mut self,
        width: usize,
        height: usize,
        seed_probability: f64,
    ) -> Result<OutputEvent, SessionError> {
        self.reject_if_stopped()?;

        // Build and seed the replacement grid before touching session
        // state, so a failed init leaves the prior grid intact.
        let mut grid = Grid::new(width, height)?;
        grid.randomize(seed_probability, &mut self.rng)?;

        info!(
            session_id = %self.id,
            width,
            height,
            seed_probability,
            alive = grid.alive_count(),
            "session initialized"
        );

        let snapshot = snapshot_event(&grid, true);
        self.grid = Some(grid);
        self.phase = Phase::Initialized;
        self.generation = 0;
        Ok(snapshot)
    }

    /// Resume ticking: `Initialized | Paused -> Running`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotInitialized`] before the first init,
    /// or [`SessionError::Stopped`] after `stop`.
    pub fn play(&mut self) -> Result<(), SessionError> {
        self.reject_if_stopped()?;
        match self.phase {
            Phase::Idle => Err(SessionError::NotInitialized),
            Phase::Initialized | Phase::Paused => {
                self.phase = Phase::Running;
                info!(session_id = %self.id, "session running");
                Ok(())
            }
            // Already running; the command is a no-op.
            Phase::Running => Ok(()),
            Phase::Stopped => Err(SessionError::Stopped),
        }
    }

    /// Suspend ticking: `Running -> Paused`. The grid is retained.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotInitialized`] before the first init,
    /// or [`SessionError::Stopped`] after `stop`.
    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.reject_if_stopped()?;
        match self.phase {
            Phase::Idle => Err(SessionError::NotInitialized),
            Phase::Running => {
                self.phase = Phase::Paused;
                info!(session_id = %self.id, generation = self.generation, "session paused");
                Ok(())
            }
            // Initialized and Paused are already suspended.
            Phase::Initialized | Phase::Paused => Ok(()),
            Phase::Stopped => Err(SessionError::Stopped),
        }
    }

    /// Pause, then re-init with the retained dimensions and the
    /// default seed probability. Returns the new snapshot event.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NotInitialized`] before the first init,
    /// or [`SessionError::Stopped`] after `stop`.
    pub fn restart(&mut self) -> Result<OutputEvent, SessionError> {
        self.reject_if_stopped()?;
        let (width, height) = self.dimensions().ok_or(SessionError::NotInitialized)?;
        info!(session_id = %self.id, "session restarting");
        self.init(width, height, DEFAULT_SEED_PROBABILITY)
    }

    /// Enter the terminal `Stopped` state. Idempotent.
    pub fn stop(&mut self) {
        if self.phase != Phase::Stopped {
            info!(session_id = %self.id, generation = self.generation, "session stopped");
            self.phase = Phase::Stopped;
        }
    }

    /// One timer fire: advance the grid and return the delta event to
    /// publish, or `None` when the session is not running.
    ///
    /// The delta is returned even when no cell changed -- an
    /// empty-changes delta signals steady state to observers.
    pub fn tick(&mut self) -> Option<OutputEvent> {
        if self.phase != Phase::Running {
            return None;
        }
        let grid = self.grid.as_mut()?;

        let changes = grid.advance();
        self.generation = self.generation.saturating_add(1);
        debug!(
            session_id = %self.id,
            generation = self.generation,
            changed = changes.len(),
            "generation advanced"
        );

        Some(OutputEvent::Delta {
            w: grid.width(),
            h: grid.height(),
            pause: false,
            changes,
        })
    }

    /// The current full-grid snapshot event, or `None` before the
    /// first init. Used to bring late subscribers up to date.
    pub fn snapshot(&self) -> Option<OutputEvent> {
        self.grid
            .as_ref()
            .map(|grid| snapshot_event(grid, self.paused()))
    }

    /// Shared stopped-state guard for every command path.
    const fn reject_if_stopped(&self) -> Result<(), SessionError> {
        if matches!(self.phase, Phase::Stopped) {
            return Err(SessionError::Stopped);
        }
        Ok(())
    }
}

/// Package a full-grid snapshot into its output event shape.
fn snapshot_event(grid: &Grid, paused: bool) -> OutputEvent {
    OutputEvent::Snapshot {
        w: grid.width(),
        h: grid.height(),
        pause: paused,
        cells: grid.rows(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn make_session() -> Session {
        Session::new(SessionId::new(), StdRng::seed_from_u64(1))
    }

    #[test]
    fn starts_idle_and_paused() {
        let session = make_session();
        assert_eq!(session.phase(), Phase::Idle);
        assert!(session.paused());
        assert_eq!(session.alive_count(), 0);
        assert!(session.snapshot().is_none());
    }

    #[test]
    fn init_produces_paused_snapshot() {
        let mut session = make_session();
        let event = session.init(10, 8, 0.5).unwrap();
        assert_eq!(session.phase(), Phase::Initialized);

        match event {
            OutputEvent::Snapshot { w, h, pause, cells } => {
                assert_eq!((w, h), (10, 8));
                assert!(pause);
                assert_eq!(cells.len(), 8);
                assert!(cells.iter().all(|row| row.len() == 10));
            }
            OutputEvent::Delta { .. } => panic!("expected snapshot"),
        }
    }

    #[test]
    fn invalid_probability_keeps_prior_state() {
        let mut session = make_session();
        let _ = session.init(10, 10, 1.0).unwrap();
        let alive_before = session.alive_count();

        let result = session.init(10, 10, 1.5);
        assert!(matches!(
            result,
            Err(SessionError::Grid {
                source: GridError::InvalidProbability { .. }
            })
        ));
        assert_eq!(session.phase(), Phase::Initialized);
        assert_eq!(session.alive_count(), alive_before);
    }

    #[test]
    fn play_requires_init() {
        let mut session = make_session();
        assert!(matches!(session.play(), Err(SessionError::NotInitialized)));
    }

    #[test]
    fn play_pause_cycle() {
        let mut session = make_session();
        let _ = session.init(5, 5, 0.2).unwrap();

        session.play().unwrap();
        assert_eq!(session.phase(), Phase::Running);
        assert!(!session.paused());

        session.pause().unwrap();
        assert_eq!(session.phase(), Phase::Paused);
        assert!(session.paused());

        session.play().unwrap();
        assert_eq!(session.phase(), Phase::Running);
    }

    #[test]
    fn tick_only_advances_while_running() {
        let mut session = make_session();
        let _ = session.init(4, 4, 0.5).unwrap();

        // Paused: the driver may keep its timer, but no advance happens.
        assert!(session.tick().is_none());
        assert_eq!(session.generation(), 0);

        session.play().unwrap();
        let delta = session.tick().unwrap();
        assert!(!delta.is_snapshot());
        assert_eq!(session.generation(), 1);

        session.pause().unwrap();
        assert!(session.tick().is_none());
        assert_eq!(session.generation(), 1);
    }

    #[test]
    fn restart_keeps_dimensions_and_resets_generation() {
        let mut session = make_session();
        let _ = session.init(7, 3, 1.0).unwrap();
        session.play().unwrap();
        let _ = session.tick();
        assert_eq!(session.generation(), 1);

        let event = session.restart().unwrap();
        assert_eq!(session.phase(), Phase::Initialized);
        assert_eq!(session.generation(), 0);
        assert_eq!(session.dimensions(), Some((7, 3)));
        match event {
            OutputEvent::Snapshot { w, h, pause, .. } => {
                assert_eq!((w, h), (7, 3));
                assert!(pause);
            }
            OutputEvent::Delta { .. } => panic!("expected snapshot"),
        }
    }

    #[test]
    fn restart_before_init_is_rejected() {
        let mut session = make_session();
        assert!(matches!(
            session.restart(),
            Err(SessionError::NotInitialized)
        ));
    }

    #[test]
    fn stop_is_terminal() {
        let mut session = make_session();
        let _ = session.init(5, 5, 0.2).unwrap();
        session.stop();
        assert_eq!(session.phase(), Phase::Stopped);

        assert!(matches!(session.play(), Err(SessionError::Stopped)));
        assert!(matches!(session.pause(), Err(SessionError::Stopped)));
        assert!(matches!(session.restart(), Err(SessionError::Stopped)));
        assert!(matches!(
            session.init(5, 5, 0.2),
            Err(SessionError::Stopped)
        ));
        assert!(session.tick().is_none());

        // Idempotent.
        session.stop();
        assert_eq!(session.phase(), Phase::Stopped);
    }

    #[test]
    fn snapshot_reflects_pause_flag() {
        let mut session = make_session();
        let _ = session.init(5, 5, 0.2).unwrap();
        assert!(session.snapshot().unwrap().paused());

        session.play().unwrap();
        assert!(!session.snapshot().unwrap().paused());
    }
}
