//! `WebSocket` handler bridging observers to a session.
//!
//! Clients connect to `GET /ws`, receive the session's output events
//! as JSON text frames, and send control commands as JSON text frames
//! the other way. Unknown or malformed commands are logged and
//! discarded, never fatal.
//!
//! If a client falls behind the tick rate, lagged events are silently
//! skipped and the client resumes from the most recent event -- the
//! simulation never stalls on a slow consumer.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use lifecast_core::SessionHandle;
use lifecast_types::{Command, OutputEvent};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection and attach it
/// to a session.
///
/// # Route
///
/// `GET /ws`
pub async fn ws_session(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle for one observer.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    let (session, owned) = state.session_for_connection();
    debug!(session_id = %session.id(), owned, "WebSocket client connected");

    // Subscription and snapshot are created atomically by the driver,
    // so a late joiner to a running session never receives a delta the
    // snapshot already incorporates.
    let (mut events, snapshot) = session.attach().await;
    if let Some(snapshot) = snapshot {
        if send_event(&mut socket, &snapshot).await.is_err() {
            finish(&session, owned).await;
            return;
        }
    }

    loop {
        tokio::select! {
            // An event published by the session's tick driver.
            result = events.recv() => {
                match result {
                    Ok(event) => {
                        if send_event(&mut socket, &event).await.is_err() {
                            debug!("WebSocket client disconnected (send failed)");
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("session output stream closed, shutting down WebSocket");
                        break;
                    }
                }
            }
            // A frame from the client.
            message = socket.recv() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        handle_command(&state, &session, text.as_str()).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        break;
                    }
                    Some(Err(error)) => {
                        debug!(%error, "WebSocket error");
                        break;
                    }
                    _ => {
                        // Ignore binary and pong frames.
                    }
                }
            }
        }
    }

    finish(&session, owned).await;
}

/// Tear down the connection's session if this connection owns it.
/// Disconnects never affect the shared session or other sessions.
async fn finish(session: &SessionHandle, owned: bool) {
    if owned {
        session.stop().await;
        debug!(session_id = %session.id(), "per-client session stopped");
    }
}

/// Serialize and send one output event as a text frame.
///
/// A serialization failure is logged and skipped; only a transport
/// failure is reported to the caller.
async fn send_event(socket: &mut WebSocket, event: &OutputEvent) -> Result<(), axum::Error> {
    let json = match serde_json::to_string(event) {
        Ok(json) => json,
        Err(error) => {
            warn!(%error, "failed to serialize output event");
            return Ok(());
        }
    };
    socket.send(Message::Text(json.into())).await
}

/// Decode and apply one inbound command frame.
///
/// Command failures (e.g. play before init) are local to the request:
/// they are logged and the session keeps its prior state.
async fn handle_command(state: &Arc<AppState>, session: &SessionHandle, raw: &str) {
    match serde_json::from_str::<Command>(raw) {
        Ok(command) => {
            debug!(session_id = %session.id(), ?command, "command received");
            let result = match command {
                Command::Init { options } => {
                    session
                        .init(options.w, options.h, state.seed_probability())
                        .await
                }
                Command::Play => session.play().await,
                Command::Pause => session.pause().await,
                Command::Restart => session.restart().await,
            };
            if let Err(error) = result {
                warn!(session_id = %session.id(), %error, "command rejected");
            }
        }
        Err(error) => {
            warn!(%error, raw, "ignoring unrecognized command");
        }
    }
}
