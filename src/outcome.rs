//! `Outcome`: the record returned by the rotation driver, plus the two-pass
//! fit orchestration that produces it.
//!
//! The two-step "compute once, then compute again with different options"
//! shape mirrors the teacher's `commands::toolpath` pattern of an `_inner`
//! function called twice with different flags to produce before/after
//! comparisons.

use serde::{Deserialize, Serialize};

use crate::bbox::{compute_bounding_box, BoundingBox};
use crate::engine::{run_pass, RotationOp};
use crate::format::format_number;
use crate::log_sink::{DebugLogEntry, LogSink};
use crate::normalize::normalize;
use crate::pivot::PivotSpec;

/// The full result of a rotation: rewritten lines plus bounding-box and
/// translation metadata a caller can compose into further output (e.g. a
/// work-offset header) without re-deriving it from the text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Outcome {
    pub lines: Vec<String>,
    pub source_bbox: BoundingBox,
    pub rotated_before_fit_bbox: BoundingBox,
    pub rotated_after_fit_bbox: BoundingBox,
    pub applied_shift_x: f64,
    pub applied_shift_y: f64,
    pub pivot: PivotSpec,
    pub resolved_pivot_x: f64,
    pub resolved_pivot_y: f64,
    /// Only meaningful for the quarter-turn API; `None` for arbitrary-angle
    /// rotations, which have no notion of "the other direction" distinct
    /// from a negated angle.
    pub clockwise: Option<bool>,
    pub debug_log: Option<Vec<DebugLogEntry>>,
}

impl Outcome {
    /// Builds a caller-facing comment header documenting the rotation's
    /// applied shift (when nonzero), the machine's current position, and a
    /// `G92 X0 Y0` re-zero line. Purely string construction; no state.
    pub fn build_header(&self, current_x: f64, current_y: f64, decimals: u32) -> String {
        let mut out = vec!["(ROTATION HEADER)".to_string()];
        if self.applied_shift_x != 0.0 || self.applied_shift_y != 0.0 {
            out.push(format!(
                "(SHIFT APPLIED: X{} Y{})",
                format_number(self.applied_shift_x, decimals),
                format_number(self.applied_shift_y, decimals)
            ));
        }
        out.push(format!(
            "(MACHINE POSITION: X{} Y{})",
            format_number(current_x, decimals),
            format_number(current_y, decimals)
        ));
        out.push("G92 X0 Y0".to_string());
        out.push("(END ROTATION HEADER)".to_string());
        out.join("\n")
    }
}

/// Runs the rotation pipeline end to end and assembles an [`Outcome`].
///
/// When `fit` is set this runs the transform pass twice: once unnormalized
/// to capture the rotated-before-fit bbox, once normalized to produce the
/// final lines and the rotated-after-fit bbox (SPEC_FULL.md §4.8). The log
/// sink, if supplied, only observes the second (final) pass so a caller
/// doesn't see duplicate diagnostics for the discarded first pass.
pub(crate) fn build_outcome(
    lines: &[String],
    rotation: RotationOp,
    pivot_spec: PivotSpec,
    fit: bool,
    decimals: u32,
    clockwise: Option<bool>,
    mut log_sink: Option<&mut dyn LogSink>,
) -> Outcome {
    let source_bbox = compute_bounding_box(lines);
    let resolved_pivot = pivot_spec.resolve(&source_bbox);
    let want_debug_log = log_sink.is_some();

    let rotated_before_fit_bbox = if fit {
        let (rendered, _) = run_pass(lines, resolved_pivot, rotation, decimals, None);
        let rendered_lines: Vec<String> = rendered.iter().map(|l| l.render()).collect();
        compute_bounding_box(&rendered_lines)
    } else {
        BoundingBox::zero()
    };

    let (mut rendered, debug_log) = run_pass(
        lines,
        resolved_pivot,
        rotation,
        decimals,
        log_sink.as_deref_mut(),
    );

    if fit {
        normalize(&mut rendered, decimals);
    }

    let final_lines: Vec<String> = rendered.iter().map(|l| l.render()).collect();
    let rotated_after_fit_bbox = compute_bounding_box(&final_lines);

    let (rotated_before_fit_bbox, applied_shift_x, applied_shift_y) = if fit {
        (
            rotated_before_fit_bbox,
            rotated_after_fit_bbox.min_x - rotated_before_fit_bbox.min_x,
            rotated_after_fit_bbox.min_y - rotated_before_fit_bbox.min_y,
        )
    } else {
        (rotated_after_fit_bbox, 0.0, 0.0)
    };

    Outcome {
        lines: final_lines,
        source_bbox,
        rotated_before_fit_bbox,
        rotated_after_fit_bbox,
        applied_shift_x,
        applied_shift_y,
        pivot: pivot_spec,
        resolved_pivot_x: resolved_pivot.0,
        resolved_pivot_y: resolved_pivot.1,
        clockwise,
        debug_log: want_debug_log.then_some(debug_log),
    }
}
