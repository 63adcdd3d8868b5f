//! The optional caller-facing debug log seam (SPEC_FULL.md §10.3).
//!
//! Deliberately separate from this crate's internal `tracing` events: a
//! `LogSink` is for a caller building a user-facing debug transcript (e.g.
//! a desktop app's log panel); `tracing` is for the crate's own operators.

use serde::{Deserialize, Serialize};

/// A caller-supplied sink for human-readable per-line debug text.
pub trait LogSink {
    fn log(&mut self, entry: &str);
}

impl LogSink for Vec<String> {
    fn log(&mut self, entry: &str) {
        self.push(entry.to_string());
    }
}

/// Resolved X/Y (and, for arcs, I/J) values actually used for a line,
/// after filling in any implicit axis from the position tracker.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedCoords {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub i: Option<f64>,
    pub j: Option<f64>,
}

/// A per-line record of what the rotation transformer did, suitable for a
/// structured debug transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugLogEntry {
    pub line_index: usize,
    pub original_text: String,
    pub rewritten_text: String,
    pub modal_before: crate::modal::ModalState,
    pub modal_after: crate::modal::ModalState,
    pub is_arc: bool,
    pub source_coords: ResolvedCoords,
    pub rewritten_coords: ResolvedCoords,
    pub warnings: Vec<String>,
}

// `ModalState` needs to be (de)serializable for `DebugLogEntry` to derive
// Serialize/Deserialize; implemented alongside its definition in modal.rs
// would create a dependency cycle in module ordering only, not in the type
// graph, so it's implemented there directly.
