//! HTTP endpoint handlers for the gateway.
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/ws` | `WebSocket` session stream (see [`crate::ws`]) |

use std::sync::Arc;

use axum::extract::State;
use axum::response::{Html, IntoResponse};

use crate::state::AppState;

/// Serve a minimal HTML page showing the shared session status and
/// how to connect.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let status_line = state.shared_session().map_or_else(
        || String::from("per-client sessions: one world per WebSocket connection"),
        |shared| {
            let status = shared.status();
            let dims = status
                .dimensions
                .map_or_else(|| String::from("-"), |(w, h)| format!("{w}x{h}"));
            format!(
                "shared session {} | phase {:?} | grid {} | generation {} | alive {}",
                status.id, status.phase, dims, status.generation, status.alive
            )
        },
    );

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Lifecast</title>
    <style>
        body {{
            background: #0d1117;
            color: #c9d1d9;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 720px;
            margin: 0 auto;
        }}
        h1 {{ color: #58a6ff; margin-bottom: 0.25rem; }}
        .subtitle {{ color: #8b949e; margin-top: 0; }}
        code {{
            background: #161b22;
            border: 1px solid #30363d;
            border-radius: 6px;
            padding: 0.15rem 0.4rem;
        }}
        .status {{ color: #3fb950; }}
    </style>
</head>
<body>
    <h1>Lifecast</h1>
    <p class="subtitle">Conway's Game of Life, streamed</p>
    <p class="status">{status_line}</p>
    <p>Connect to <code>/ws</code> and send
       <code>{{"cmd":"init","options":{{"w":200,"h":200}}}}</code>,
       then <code>{{"cmd":"play"}}</code>. Control with
       <code>pause</code> and <code>restart</code>.</p>
</body>
</html>"#
    ))
}
