//! Per-session tick driver: the single owning execution context.
//!
//! Every session is driven by exactly one tokio task that owns the
//! [`Session`] outright and drains a merged stream of "command
//! arrived" (bounded mpsc) and "timer fired" (interval) events through
//! one `select!` loop. Commands and ticks are therefore serialized by
//! construction -- `cells` and the pause flag have a single logical
//! writer, and a restart can never race a play or an in-flight
//! advance.
//!
//! Published events go through a bounded [`broadcast`] channel with a
//! drop-oldest policy: a slow or disconnected observer receives
//! [`broadcast::error::RecvError::Lagged`] and resumes at the newest
//! event, and the tick loop never blocks on a consumer. Events are
//! delivered in strict tick order; the snapshot always precedes the
//! first delta of a run.

use std::time::Duration;

use lifecast_types::{OutputEvent, SessionId};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::session::{Phase, Session, SessionError};

/// Fallback tick period when the configured rate cannot be derived.
const DEFAULT_TICK_PERIOD_MS: u64 = 33;

/// Tunables for one session driver.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Timer frequency in ticks per second.
    pub tick_rate_hz: u32,
    /// Bounded capacity of the output event stream. Subscribers that
    /// fall more than this many events behind skip to the newest.
    pub broadcast_capacity: usize,
    /// Bounded depth of the inbound command queue.
    pub command_queue_depth: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 30,
            broadcast_capacity: 256,
            command_queue_depth: 32,
        }
    }
}

/// Point-in-time view of a session, published on a watch channel so
/// reporting surfaces never touch the session itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    /// The session identifier.
    pub id: SessionId,
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Generations advanced since the last init/restart.
    pub generation: u64,
    /// Number of alive cells.
    pub alive: usize,
    /// Grid dimensions `(width, height)`, if initialized.
    pub dimensions: Option<(usize, usize)>,
}

/// A subscription paired with the snapshot it is consistent with: the
/// receiver yields exactly the events published after the snapshot.
type Attachment = (broadcast::Receiver<OutputEvent>, Option<OutputEvent>);

/// A command envelope processed by the driver task.
///
/// Replies travel back over oneshot channels so a failed operation
/// (e.g. an invalid seed probability) is reported to the requester
/// without disturbing the session.
enum SessionCommand {
    /// Allocate and randomize a fresh grid.
    Init {
        /// Requested grid width.
        width: usize,
        /// Requested grid height.
        height: usize,
        /// Seed probability in `[0, 1]`.
        seed_probability: f64,
        /// Outcome of the operation.
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    /// Resume ticking.
    Play {
        /// Outcome of the operation.
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    /// Suspend ticking.
    Pause {
        /// Outcome of the operation.
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    /// Re-init with retained dimensions and the default seed.
    Restart {
        /// Outcome of the operation.
        reply: oneshot::Sender<Result<(), SessionError>>,
    },
    /// Request the current full-grid snapshot event.
    Snapshot {
        /// The snapshot, or `None` before the first init.
        reply: oneshot::Sender<Option<OutputEvent>>,
    },
    /// Atomically create a subscription plus the matching snapshot.
    Attach {
        /// The subscription and the snapshot it is consistent with.
        reply: oneshot::Sender<Attachment>,
    },
    /// Terminate the driver.
    Stop {
        /// Acknowledged once the session reached `Stopped`.
        reply: oneshot::Sender<()>,
    },
}

/// Cloneable handle to a running session driver.
///
/// All mutation goes through the command queue and is applied by the
/// single owning task; the handle itself holds no session state.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    id: SessionId,
    commands: mpsc::Sender<SessionCommand>,
    events: broadcast::Sender<OutputEvent>,
    status: watch::Receiver<SessionStatus>,
}

impl SessionHandle {
    /// The session identifier.
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Subscribe to the session's output stream.
    ///
    /// The returned receiver yields every event published after this
    /// call, in strict tick order, with the drop-oldest lag policy.
    pub fn subscribe(&self) -> broadcast::Receiver<OutputEvent> {
        self.events.subscribe()
    }

    /// The latest published session status.
    pub fn status(&self) -> SessionStatus {
        self.status.borrow().clone()
    }

    /// Initialize the session with a fresh randomized grid.
    ///
    /// # Errors
    ///
    /// Propagates the session's rejection (invalid dimensions or
    /// probability), or [`SessionError::Stopped`] when the driver is
    /// gone.
    pub async fn init(
        &self,
        width: usize,
        height: usize,
        seed_probability: f64,
    ) -> Result<(), SessionError> {
        let (reply, response) = oneshot::channel();
        self.submit(SessionCommand::Init {
            width,
            height,
            seed_probability,
            reply,
        })
        .await?;
        response.await.map_err(|_| SessionError::Stopped)?
    }

    /// Resume ticking.
    ///
    /// # Errors
    ///
    /// Propagates the session's rejection, or
    /// [`SessionError::Stopped`] when the driver is gone.
    pub async fn play(&self) -> Result<(), SessionError> {
        let (reply, response) = oneshot::channel();
        self.submit(SessionCommand::Play { reply }).await?;
        response.await.map_err(|_| SessionError::Stopped)?
    }

    /// Suspend ticking.
    ///
    /// # Errors
    ///
    /// Propagates the session's rejection, or
    /// [`SessionError::Stopped`] when the driver is gone.
    pub async fn pause(&self) -> Result<(), SessionError> {
        let (reply, response) = oneshot::channel();
        self.submit(SessionCommand::Pause { reply }).await?;
        response.await.map_err(|_| SessionError::Stopped)?
    }

    /// Re-init with the retained dimensions and default seed.
    ///
    /// # Errors
    ///
    /// Propagates the session's rejection, or
    /// [`SessionError::Stopped`] when the driver is gone.
    pub async fn restart(&self) -> Result<(), SessionError> {
        let (reply, response) = oneshot::channel();
        self.submit(SessionCommand::Restart { reply }).await?;
        response.await.map_err(|_| SessionError::Stopped)?
    }

    /// The current full-grid snapshot event, or `None` before the
    /// first init or once the driver is gone.
    pub async fn snapshot(&self) -> Option<OutputEvent> {
        let (reply, response) = oneshot::channel();
        self.submit(SessionCommand::Snapshot { reply }).await.ok()?;
        response.await.ok().flatten()
    }

    /// Subscribe and fetch the matching snapshot in one step.
    ///
    /// The subscription is created by the driver task in the same
    /// command that produces the snapshot, so the receiver carries no
    /// delta already folded into the snapshot and misses none published
    /// after it. This is how late joiners are brought up to date; a
    /// plain [`SessionHandle::subscribe`] followed by
    /// [`SessionHandle::snapshot`] would buffer pre-snapshot deltas
    /// behind the snapshot.
    ///
    /// The snapshot is `None` before the first init. When the driver is
    /// gone the receiver reports the stream as closed.
    pub async fn attach(&self) -> (broadcast::Receiver<OutputEvent>, Option<OutputEvent>) {
        let (reply, response) = oneshot::channel();
        if self.submit(SessionCommand::Attach { reply }).await.is_ok() {
            if let Ok(attachment) = response.await {
                return attachment;
            }
        }
        (self.events.subscribe(), None)
    }

    /// Stop the session and terminate its driver task.
    ///
    /// Waits until the in-flight tick (if any) has completed and the
    /// session reached its terminal state. Idempotent: stopping an
    /// already-stopped session is a no-op.
    pub async fn stop(&self) {
        let (reply, response) = oneshot::channel();
        if self.submit(SessionCommand::Stop { reply }).await.is_ok() {
            let _ = response.await;
        }
    }

    /// Enqueue a command for the driver task.
    async fn submit(&self, command: SessionCommand) -> Result<(), SessionError> {
        self.commands
            .send(command)
            .await
            .map_err(|_| SessionError::Stopped)
    }
}

/// Spawn a session driver task and return its handle.
///
/// The driver starts in the `Idle` phase with its timer armed; the
/// timer is inert until a successful `init` + `play`. The task ends
/// when a stop command arrives or every handle has been dropped.
pub fn spawn_session(config: &DriverConfig) -> SessionHandle {
    let id = SessionId::new();
    let session = Session::new(id, StdRng::from_os_rng());

    let (commands, command_queue) = mpsc::channel(config.command_queue_depth.max(1));
    let (events, _) = broadcast::channel(config.broadcast_capacity.max(1));
    let (status_writer, status) = watch::channel(status_of(&session));

    let period_ms = 1000_u64
        .checked_div(u64::from(config.tick_rate_hz))
        .map_or(DEFAULT_TICK_PERIOD_MS, |ms| ms.max(1));

    info!(
        session_id = %id,
        tick_rate_hz = config.tick_rate_hz,
        period_ms,
        broadcast_capacity = config.broadcast_capacity,
        "session driver spawned"
    );

    tokio::spawn(run(
        session,
        command_queue,
        events.clone(),
        status_writer,
        Duration::from_millis(period_ms),
    ));

    SessionHandle {
        id,
        commands,
        events,
        status,
    }
}

/// The driver loop: the only code that ever touches the session.
async fn run(
    mut session: Session,
    mut command_queue: mpsc::Receiver<SessionCommand>,
    events: broadcast::Sender<OutputEvent>,
    status: watch::Sender<SessionStatus>,
    period: Duration,
) {
    let mut timer = tokio::time::interval(period);
    // A stalled tick is skipped, not replayed in a burst.
    timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            command = command_queue.recv() => {
                match command {
                    Some(command) => {
                        let stop = apply_command(&mut session, command, &events);
                        let _ = status.send_replace(status_of(&session));
                        if stop {
                            break;
                        }
                    }
                    // Every handle dropped: tear down quietly.
                    None => {
                        debug!(session_id = %session.id(), "all session handles dropped");
                        break;
                    }
                }
            }
            _ = timer.tick() => {
                if let Some(delta) = session.tick() {
                    publish(&events, delta);
                    let _ = status.send_replace(status_of(&session));
                }
            }
        }
    }

    session.stop();
    let _ = status.send_replace(status_of(&session));
    info!(session_id = %session.id(), "session driver exited");
}

/// Apply one command to the session; returns `true` when the driver
/// should terminate.
fn apply_command(
    session: &mut Session,
    command: SessionCommand,
    events: &broadcast::Sender<OutputEvent>,
) -> bool {
    match command {
        SessionCommand::Init {
            width,
            height,
            seed_probability,
            reply,
        } => {
            let result = session
                .init(width, height, seed_probability)
                .map(|snapshot| publish(events, snapshot));
            if let Err(error) = &result {
                warn!(session_id = %session.id(), %error, "init rejected");
            }
            let _ = reply.send(result);
            false
        }
        SessionCommand::Play { reply } => {
            let _ = reply.send(session.play());
            false
        }
        SessionCommand::Pause { reply } => {
            let _ = reply.send(session.pause());
            false
        }
        SessionCommand::Restart { reply } => {
            let result = session.restart().map(|snapshot| publish(events, snapshot));
            if let Err(error) = &result {
                warn!(session_id = %session.id(), %error, "restart rejected");
            }
            let _ = reply.send(result);
            false
        }
        SessionCommand::Snapshot { reply } => {
            let _ = reply.send(session.snapshot());
            false
        }
        SessionCommand::Attach { reply } => {
            // Subscribing and snapshotting inside the command keeps the
            // two consistent: only this task publishes events.
            let _ = reply.send((events.subscribe(), session.snapshot()));
            false
        }
        SessionCommand::Stop { reply } => {
            session.stop();
            let _ = reply.send(());
            true
        }
    }
}

/// Publish an event to the output stream.
fn publish(events: &broadcast::Sender<OutputEvent>, event: OutputEvent) {
    // send fails only when no subscriber exists, which is normal for
    // a session nobody is watching yet.
    let receivers = events.send(event).unwrap_or(0);
    debug!(receivers, "event published");
}

/// Build the status projection for the watch channel.
fn status_of(session: &Session) -> SessionStatus {
    SessionStatus {
        id: session.id(),
        phase: session.phase(),
        generation: session.generation(),
        alive: session.alive_count(),
        dimensions: session.dimensions(),
    }
}
