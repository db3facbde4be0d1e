//! Outbound event shapes published on a session's output stream.
//!
//! A session emits exactly one event per logical step: a full
//! [`OutputEvent::Snapshot`] once per start/restart, then one
//! [`OutputEvent::Delta`] per tick. The JSON encoding is tagged by the
//! `type` field (`"init"` / `"change"`) so browser clients can switch
//! on it directly.

use serde::{Deserialize, Serialize};

/// One cell whose value differed between two consecutive generations.
///
/// Serialized as `{"x": .., "y": .., "state": ..}` where `state` is the
/// cell's value in the *new* generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellChange {
    /// Column index, `0 <= x < width`.
    pub x: usize,
    /// Row index, `0 <= y < height`.
    pub y: usize,
    /// The cell's value in the new generation.
    #[serde(rename = "state")]
    pub alive: bool,
}

/// An event on a session's output stream.
///
/// The tag field `type` distinguishes the full-grid snapshot sent once
/// per session start from the per-tick change list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutputEvent {
    /// Full-grid state, emitted once per session start/restart and
    /// before any delta of a run.
    #[serde(rename = "init")]
    Snapshot {
        /// Grid width in cells.
        w: usize,
        /// Grid height in cells.
        h: usize,
        /// Whether the session is paused.
        pause: bool,
        /// Complete cell matrix, indexed `[y][x]`.
        cells: Vec<Vec<bool>>,
    },

    /// Per-tick list of changed cells. An empty `changes` list signals
    /// a steady-state generation to observers.
    #[serde(rename = "change")]
    Delta {
        /// Grid width in cells.
        w: usize,
        /// Grid height in cells.
        h: usize,
        /// Whether the session is paused.
        pause: bool,
        /// Cells that changed, in row-major order (y, then x ascending).
        changes: Vec<CellChange>,
    },
}

impl OutputEvent {
    /// Whether this event is a full-grid snapshot.
    pub const fn is_snapshot(&self) -> bool {
        matches!(self, Self::Snapshot { .. })
    }

    /// The pause flag carried by the event.
    pub const fn paused(&self) -> bool {
        match self {
            Self::Snapshot { pause, .. } | Self::Delta { pause, .. } => *pause,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_wire_shape() {
        let event = OutputEvent::Snapshot {
            w: 2,
            h: 1,
            pause: true,
            cells: vec![vec![true, false]],
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "init",
                "w": 2,
                "h": 1,
                "pause": true,
                "cells": [[true, false]],
            })
        );
    }

    #[test]
    fn delta_wire_shape() {
        let event = OutputEvent::Delta {
            w: 3,
            h: 3,
            pause: false,
            changes: vec![CellChange {
                x: 1,
                y: 2,
                alive: true,
            }],
        };
        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "change",
                "w": 3,
                "h": 3,
                "pause": false,
                "changes": [{"x": 1, "y": 2, "state": true}],
            })
        );
    }

    #[test]
    fn delta_with_empty_changes_roundtrips() {
        let event = OutputEvent::Delta {
            w: 4,
            h: 4,
            pause: false,
            changes: Vec::new(),
        };
        let json = serde_json::to_string(&event).unwrap();
        let back: OutputEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert!(!back.is_snapshot());
        assert!(!back.paused());
    }
}
