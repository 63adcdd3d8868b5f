//! Public operations (SPEC_FULL.md §6). Every entry point here is
//! infallible: none returns a `Result` (see SPEC_FULL.md §7 for why no
//! bespoke error type exists in this crate).

use crate::bbox::BoundingBox;
use crate::engine::{run_pass, RotationOp};
use crate::geometry::{cw_to_ccw_quarter_turns, normalize_quarter_turns, AngleRotation};
use crate::log_sink::LogSink;
use crate::normalize::normalize as shift_to_nonnegative;
use crate::outcome::{build_outcome, Outcome};
use crate::pivot::PivotSpec;

fn resolve_quarter_turns(quarter_turns: i64, clockwise: bool) -> u8 {
    let k = normalize_quarter_turns(quarter_turns);
    if clockwise {
        cw_to_ccw_quarter_turns(k)
    } else {
        k
    }
}

/// Rotates `lines` by `quarter_turns` (reduced mod 4, then inverted to CCW
/// if `clockwise`) about `pivot`, optionally normalizing the result to a
/// non-negative coordinate region.
pub fn rotate_quarter_turns(
    lines: &[String],
    quarter_turns: i64,
    normalize: bool,
    decimals: u32,
    pivot: PivotSpec,
    clockwise: bool,
    log_sink: Option<&mut dyn LogSink>,
) -> Vec<String> {
    let k = resolve_quarter_turns(quarter_turns, clockwise);
    let source_bbox = crate::bbox::compute_bounding_box(lines);
    let resolved_pivot = pivot.resolve(&source_bbox);

    let (mut rendered, _debug_log) = run_pass(
        lines,
        resolved_pivot,
        RotationOp::Quarter(k),
        decimals,
        log_sink,
    );
    if normalize {
        shift_to_nonnegative(&mut rendered, decimals);
    }
    rendered.iter().map(|l| l.render()).collect()
}

/// Rotates `lines` by a single 90° turn in the given direction and returns
/// the full [`Outcome`], optionally fitting the result to non-negative
/// coordinates. `clockwise` is the only directional input: this entry
/// point models the "rotate 90° CW / rotate 90° CCW" pair of a machine
/// operator's control, not an arbitrary turn count.
pub fn rotate_with_outcome(
    lines: &[String],
    clockwise: bool,
    fit: bool,
    pivot: PivotSpec,
    decimals: u32,
    log_sink: Option<&mut dyn LogSink>,
) -> Outcome {
    let k = resolve_quarter_turns(1, clockwise);
    build_outcome(
        lines,
        RotationOp::Quarter(k),
        pivot,
        fit,
        decimals,
        Some(clockwise),
        log_sink,
    )
}

/// Rotates `lines` by `angle_degrees` about `pivot`, optionally normalizing
/// the result to a non-negative coordinate region.
pub fn rotate_arbitrary_angle(
    lines: &[String],
    angle_degrees: f64,
    pivot: PivotSpec,
    normalize: bool,
    decimals: u32,
) -> Vec<String> {
    let rotation = RotationOp::Angle(AngleRotation::from_degrees(angle_degrees));
    let source_bbox = crate::bbox::compute_bounding_box(lines);
    let resolved_pivot = pivot.resolve(&source_bbox);

    let (mut rendered, _debug_log) = run_pass(lines, resolved_pivot, rotation, decimals, None);
    if normalize {
        shift_to_nonnegative(&mut rendered, decimals);
    }
    rendered.iter().map(|l| l.render()).collect()
}

/// As [`rotate_arbitrary_angle`], but returns the full [`Outcome`].
pub fn rotate_arbitrary_with_outcome(
    lines: &[String],
    angle_degrees: f64,
    pivot: PivotSpec,
    fit: bool,
    decimals: u32,
    log_sink: Option<&mut dyn LogSink>,
) -> Outcome {
    let rotation = RotationOp::Angle(AngleRotation::from_degrees(angle_degrees));
    build_outcome(lines, rotation, pivot, fit, decimals, None, log_sink)
}

/// Computes the program-wide bounding box over `lines` without rotating
/// anything.
pub fn compute_bounding_box(lines: &[String]) -> BoundingBox {
    crate::bbox::compute_bounding_box(lines)
}
