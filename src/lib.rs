//! Pivot-based rotation and renormalization of G-code programs.
//!
//! Module map:
//! - [`line`] — splits a raw line into code and comment parts.
//! - [`token`] — scans a code part into `(letter, value)` words.
//! - [`modal`] — tracks linear/arc-center positioning mode across lines.
//! - [`geometry`] — pure quarter-turn and arbitrary-angle point rotation.
//! - [`format`] — numeric formatting with a trimmed decimal budget.
//! - [`bbox`] — the bounding-box scanner.
//! - [`pivot`] — pivot selection and resolution against a bbox.
//! - [`log_sink`] — the caller-facing debug-log seam.
//! - `engine` / `normalize` / `outcome` — the rotation pipeline's internals,
//!   not part of the public surface.
//! - [`api`] — the public operations built from the above.
//!
//! Callers only need [`api`]'s functions and the public types re-exported
//! at the crate root below; the module breakdown exists for testability,
//! not as part of the contract.

mod api;
mod bbox;
mod engine;
mod format;
mod geometry;
mod line;
mod log_sink;
mod modal;
mod normalize;
mod outcome;
mod pivot;
mod token;

pub use api::{
    compute_bounding_box, rotate_arbitrary_angle, rotate_arbitrary_with_outcome,
    rotate_quarter_turns, rotate_with_outcome,
};
pub use bbox::BoundingBox;
pub use log_sink::{DebugLogEntry, LogSink, ResolvedCoords};
pub use modal::ModalState;
pub use outcome::Outcome;
pub use pivot::PivotSpec;
