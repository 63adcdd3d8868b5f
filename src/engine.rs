//! The single-pass per-line transform: Line Splitter → Token Scanner →
//! Modal State Tracker → Rotation Transformer → Line Rebuilder.
//!
//! Kept as one pass (rather than the teacher's generate-from-scratch
//! `BlockBuilder`) because the pipeline here must preserve unrecognized
//! text byte-for-byte while only the recognized coordinate words are
//! substituted — see SPEC_FULL.md §9.

use tracing::{debug, trace, warn};

use crate::format::format_number;
use crate::geometry::{self, AngleRotation};
use crate::line::split_line;
use crate::log_sink::{DebugLogEntry, LogSink, ResolvedCoords};
use crate::modal::ModalState;
use crate::token::{scan_words, unknown_letters, Word};

const KEEP_MAGNITUDE_THRESHOLD: f64 = 1e-12;

/// The rotation to apply, resolved to a concrete operation before the main
/// pass runs.
#[derive(Debug, Clone, Copy)]
pub enum RotationOp {
    /// `k` counter-clockwise quarter turns, already reduced to `0..4`.
    Quarter(u8),
    /// An arbitrary-angle rotation.
    Angle(AngleRotation),
}

impl RotationOp {
    fn about_pivot(self, x: f64, y: f64, pivot: (f64, f64)) -> (f64, f64) {
        match self {
            RotationOp::Quarter(k) => geometry::quarter_turn_pivot(x, y, pivot, k),
            RotationOp::Angle(r) => r.rotate_pivot(x, y, pivot),
        }
    }

    fn about_origin(self, x: f64, y: f64) -> (f64, f64) {
        match self {
            RotationOp::Quarter(k) => geometry::quarter_turn_origin(x, y, k),
            RotationOp::Angle(r) => r.rotate_origin(x, y),
        }
    }
}

/// One transformed output line, kept in a structured form (rather than a
/// flattened string) so the [`crate::normalize`] pass can rewrite a
/// recorded line's X/Y tokens in place without re-parsing text.
#[derive(Debug, Clone)]
pub(crate) struct RenderedLine {
    pub original: String,
    pub comment_only: bool,
    pub tokens: Vec<String>,
    pub comment: String,
    /// Index into `tokens` of the X and Y words, when this line is a
    /// recorded absolute-mode motion line.
    pub xy_positions: Option<(usize, usize)>,
    /// The rotated (pre-normalization) absolute `(x, y)` this line carries,
    /// when it is a recorded absolute-mode motion line.
    pub recorded_xy: Option<(f64, f64)>,
}

impl RenderedLine {
    fn passthrough(original: String) -> Self {
        RenderedLine {
            original,
            comment_only: true,
            tokens: Vec::new(),
            comment: String::new(),
            xy_positions: None,
            recorded_xy: None,
        }
    }

    pub fn render(&self) -> String {
        if self.comment_only {
            return self.original.clone();
        }
        let code = self.tokens.join(" ");
        let code = code.trim_end();
        if !self.comment.is_empty() {
            if code.is_empty() {
                self.comment.clone()
            } else {
                format!("{code} {}", self.comment)
            }
        } else {
            code.to_string()
        }
    }

    /// Rewrites this line's recorded X/Y tokens to `(x, y)` in place. Only
    /// valid to call when `recorded_xy` / `xy_positions` are both `Some`.
    pub fn rewrite_xy(&mut self, x: f64, y: f64, decimals: u32) {
        if let Some((xi, yi)) = self.xy_positions {
            self.tokens[xi] = format!("X{}", format_number(x, decimals));
            self.tokens[yi] = format!("Y{}", format_number(y, decimals));
            self.recorded_xy = Some((x, y));
        }
    }
}

/// Per-line coordinate values parsed from the line's words, with presence
/// tracked independently of value (a present-but-unparseable word still
/// counts as "present" for modal/paired-emission purposes, per §7).
struct CoordInputs {
    x: Option<f64>,
    y: Option<f64>,
    i: Option<f64>,
    j: Option<f64>,
}

fn last_value(words: &[Word], letter: char) -> Option<f64> {
    words
        .iter()
        .rev()
        .find(|w| w.letter == letter)
        .and_then(|w| w.parsed_value())
}

fn gather_coords(words: &[Word]) -> CoordInputs {
    CoordInputs {
        x: last_value(words, 'X'),
        y: last_value(words, 'Y'),
        i: last_value(words, 'I'),
        j: last_value(words, 'J'),
    }
}

fn present(words: &[Word], letter: char) -> bool {
    words.iter().any(|w| w.letter == letter)
}

fn line_warnings(words: &[Word]) -> Vec<String> {
    let mut warnings = Vec::new();
    let unknown = unknown_letters(words);
    if !unknown.is_empty() {
        let letters: String = unknown.iter().collect();
        warnings.push(format!("unknown letter(s): {letters}"));
    }
    for letter in ['X', 'Y', 'I', 'J'] {
        if present(words, letter) && last_value(words, letter).is_none() {
            warnings.push(format!("unparseable value for {letter}"));
        }
    }
    warnings
}

/// Runs the full per-line transform over `lines` and returns the rendered
/// lines plus a debug-log entry for every line (the caller decides whether
/// to keep them, per SPEC_FULL.md §10.3).
pub(crate) fn run_pass(
    lines: &[String],
    pivot: (f64, f64),
    rotation: RotationOp,
    decimals: u32,
    mut log_sink: Option<&mut dyn LogSink>,
) -> (Vec<RenderedLine>, Vec<DebugLogEntry>) {
    let mut modal = ModalState::new();
    let mut pos = (0.0_f64, 0.0_f64);
    let mut rendered = Vec::with_capacity(lines.len());
    let mut debug_log = Vec::with_capacity(lines.len());

    for (line_index, raw) in lines.iter().enumerate() {
        trace!(line = line_index, original = %raw, "transforming line");

        let split = split_line(raw);
        if split.comment_only {
            rendered.push(RenderedLine::passthrough(split.original));
            continue;
        }

        let words = scan_words(&split.code_part);
        let modal_before = modal;
        let flags = modal.update(&words);
        let modal_after = modal;

        if modal_before != modal_after {
            debug!(
                line = line_index,
                linear_absolute = modal_after.linear_absolute,
                arc_center_absolute = modal_after.arc_center_absolute,
                "modal state transition"
            );
        }

        let coords = gather_coords(&words);
        let warnings = line_warnings(&words);
        for w in &warnings {
            warn!(line = line_index, warning = %w, "gcode diagnostic");
            if let Some(sink) = log_sink.as_deref_mut() {
                sink.log(&format!("line {line_index}: {w}"));
            }
        }

        // ── linear X/Y ──────────────────────────────────────────────────
        let mut new_x: Option<f64> = None;
        let mut new_y: Option<f64> = None;
        let mut source_x = None;
        let mut source_y = None;
        if coords.x.is_some() || coords.y.is_some() {
            if modal_after.linear_absolute {
                let src_x = coords.x.unwrap_or(pos.0);
                let src_y = coords.y.unwrap_or(pos.1);
                source_x = Some(src_x);
                source_y = Some(src_y);
                let (rx, ry) = rotation.about_pivot(src_x, src_y, pivot);
                new_x = Some(geometry::canonicalize_zero(rx));
                new_y = Some(geometry::canonicalize_zero(ry));
                pos = (src_x, src_y);
            } else {
                let dx = coords.x.unwrap_or(0.0);
                let dy = coords.y.unwrap_or(0.0);
                source_x = coords.x;
                source_y = coords.y;
                let (rx, ry) = rotation.about_origin(dx, dy);
                let rx = geometry::canonicalize_zero(rx);
                let ry = geometry::canonicalize_zero(ry);
                new_x = (coords.x.is_some() || rx.abs() > KEEP_MAGNITUDE_THRESHOLD).then_some(rx);
                new_y = (coords.y.is_some() || ry.abs() > KEEP_MAGNITUDE_THRESHOLD).then_some(ry);
            }
        }

        // ── arc center I/J ──────────────────────────────────────────────
        let mut new_i: Option<f64> = None;
        let mut new_j: Option<f64> = None;
        if flags.is_arc && (coords.i.is_some() || coords.j.is_some()) {
            let ri = coords.i.unwrap_or(0.0);
            let rj = coords.j.unwrap_or(0.0);
            let (rx, ry) = if modal_after.arc_center_absolute {
                rotation.about_pivot(ri, rj, pivot)
            } else {
                rotation.about_origin(ri, rj)
            };
            let rx = geometry::canonicalize_zero(rx);
            let ry = geometry::canonicalize_zero(ry);
            new_i = (coords.i.is_some() || rx.abs() > KEEP_MAGNITUDE_THRESHOLD).then_some(rx);
            new_j = (coords.j.is_some() || ry.abs() > KEEP_MAGNITUDE_THRESHOLD).then_some(ry);
        }

        // ── rebuild tokens in source order ──────────────────────────────
        let mut tokens = Vec::with_capacity(words.len() + 2);
        let mut x_idx = None;
        let mut y_idx = None;
        let mut x_in_source = false;
        let mut y_in_source = false;
        let mut i_in_source = false;
        let mut j_in_source = false;
        for w in &words {
            match w.letter {
                'X' => {
                    x_in_source = true;
                    x_idx = Some(tokens.len());
                    match new_x {
                        Some(v) => tokens.push(format!("X{}", format_number(v, decimals))),
                        None => tokens.push(w.raw.clone()),
                    }
                }
                'Y' => {
                    y_in_source = true;
                    y_idx = Some(tokens.len());
                    match new_y {
                        Some(v) => tokens.push(format!("Y{}", format_number(v, decimals))),
                        None => tokens.push(w.raw.clone()),
                    }
                }
                'I' => {
                    i_in_source = true;
                    match new_i {
                        Some(v) => tokens.push(format!("I{}", format_number(v, decimals))),
                        None => tokens.push(w.raw.clone()),
                    }
                }
                'J' => {
                    j_in_source = true;
                    match new_j {
                        Some(v) => tokens.push(format!("J{}", format_number(v, decimals))),
                        None => tokens.push(w.raw.clone()),
                    }
                }
                _ => tokens.push(w.raw.clone()),
            }
        }

        // ── paired-emission rule (absolute linear mode only) ────────────
        let is_recorded_absolute_motion = modal_after.linear_absolute
            && new_x.is_some()
            && new_y.is_some();
        if is_recorded_absolute_motion {
            if !x_in_source {
                x_idx = Some(tokens.len());
                tokens.push(format!("X{}", format_number(new_x.unwrap(), decimals)));
            }
            if !y_in_source {
                y_idx = Some(tokens.len());
                tokens.push(format!("Y{}", format_number(new_y.unwrap(), decimals)));
            }
        } else {
            // Incremental mode has no paired-emission requirement, but an
            // axis absent from the source that rotates to a significant
            // magnitude must still be appended — otherwise a real motion
            // is silently dropped (SPEC_FULL.md §4.5 steps 3-4).
            if let Some(v) = new_x {
                if !x_in_source {
                    x_idx = Some(tokens.len());
                    tokens.push(format!("X{}", format_number(v, decimals)));
                }
            }
            if let Some(v) = new_y {
                if !y_in_source {
                    y_idx = Some(tokens.len());
                    tokens.push(format!("Y{}", format_number(v, decimals)));
                }
            }
        }

        // Arc-center I/J never get the paired-emission treatment (only X/Y
        // do, per §4.6), but the same "newly-significant axis" append still
        // applies in both arc-center modes.
        if let Some(v) = new_i {
            if !i_in_source {
                tokens.push(format!("I{}", format_number(v, decimals)));
            }
        }
        if let Some(v) = new_j {
            if !j_in_source {
                tokens.push(format!("J{}", format_number(v, decimals)));
            }
        }

        let recorded_xy = if is_recorded_absolute_motion {
            Some((new_x.unwrap(), new_y.unwrap()))
        } else {
            None
        };
        let xy_positions = if is_recorded_absolute_motion {
            Some((x_idx.unwrap(), y_idx.unwrap()))
        } else {
            None
        };

        debug_log.push(DebugLogEntry {
            line_index,
            original_text: split.original.clone(),
            rewritten_text: String::new(), // filled in by the caller after render()
            modal_before,
            modal_after,
            is_arc: flags.is_arc,
            source_coords: ResolvedCoords {
                x: source_x,
                y: source_y,
                i: coords.i,
                j: coords.j,
            },
            rewritten_coords: ResolvedCoords {
                x: new_x,
                y: new_y,
                i: new_i,
                j: new_j,
            },
            warnings,
        });

        rendered.push(RenderedLine {
            original: split.original,
            comment_only: false,
            tokens,
            comment: split.comment_part,
            xy_positions,
            recorded_xy,
        });
    }

    for (entry, line) in debug_log.iter_mut().zip(rendered.iter()) {
        entry.rewritten_text = line.render();
        if let Some(sink) = log_sink.as_deref_mut() {
            sink.log(&format!(
                "line {}: {} -> {}",
                entry.line_index, entry.original_text, entry.rewritten_text
            ));
        }
    }

    (rendered, debug_log)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    fn render_all(rendered: &[RenderedLine]) -> Vec<String> {
        rendered.iter().map(|l| l.render()).collect()
    }

    #[test]
    fn comment_only_line_passes_through_byte_identical() {
        let (rendered, _) = run_pass(
            &lines(&["(just a comment)"]),
            (0.0, 0.0),
            RotationOp::Quarter(1),
            3,
            None,
        );
        assert_eq!(rendered[0].render(), "(just a comment)");
    }

    #[test]
    fn quarter_turn_about_origin() {
        let (rendered, _) = run_pass(
            &lines(&["G90", "G0 X10 Y0"]),
            (0.0, 0.0),
            RotationOp::Quarter(1),
            3,
            None,
        );
        assert_eq!(render_all(&rendered), vec!["G90", "G0 X0 Y10"]);
    }

    #[test]
    fn implicit_axis_is_paired_in_absolute_mode() {
        let (rendered, _) = run_pass(
            &lines(&["G90", "G0 X0 Y0", "G1 X10"]),
            (0.0, 0.0),
            RotationOp::Quarter(1),
            3,
            None,
        );
        let last = rendered.last().unwrap().render();
        assert!(last.contains("X0"), "got: {last}");
        assert!(last.contains("Y10"), "got: {last}");
    }

    #[test]
    fn incremental_move_rotates_about_origin_not_pivot() {
        let (rendered, _) = run_pass(
            &lines(&["G91", "G1 X10 Y0"]),
            (100.0, 100.0), // pivot should be irrelevant for incremental deltas
            RotationOp::Quarter(1),
            3,
            None,
        );
        let line = rendered[0].render();
        assert!(line.contains("X0"));
        assert!(line.contains("Y10"));
    }

    #[test]
    fn incremental_single_axis_source_appends_newly_significant_other_axis() {
        // Source carries only X; rotating 90 CCW turns that delta entirely
        // into Y, which must be appended even though no Y token existed.
        let (rendered, _) = run_pass(
            &lines(&["G91", "G1 X10"]),
            (0.0, 0.0),
            RotationOp::Quarter(1),
            3,
            None,
        );
        assert_eq!(rendered[1].render(), "G1 X0 Y10");
    }

    #[test]
    fn arc_relative_single_axis_source_appends_newly_significant_other_axis() {
        let (rendered, _) = run_pass(
            &lines(&["G91.1", "G2 X10 Y0 I5"]),
            (0.0, 0.0),
            RotationOp::Quarter(1),
            3,
            None,
        );
        let line = rendered[1].render();
        assert!(line.contains("I0"), "got: {line}");
        assert!(line.contains("J5"), "got: {line}");
    }

    #[test]
    fn arc_relative_ij_rotates_about_origin() {
        let (rendered, _) = run_pass(
            &lines(&["G91.1", "G2 X10 Y0 I5 J0"]),
            (0.0, 0.0),
            RotationOp::Quarter(1),
            3,
            None,
        );
        let line = rendered[0].render();
        assert!(line.contains("I0"), "got: {line}");
        assert!(line.contains("J5"), "got: {line}");
    }

    #[test]
    fn comments_are_preserved_and_appended() {
        let (rendered, _) = run_pass(
            &lines(&["(header) G0 X1 Y2 ; tail"]),
            (0.0, 0.0),
            RotationOp::Quarter(1),
            3,
            None,
        );
        let line = rendered[0].render();
        assert!(line.contains("(header)"), "got: {line}");
        assert!(line.contains("; tail"), "got: {line}");
    }

    #[test]
    fn r_form_arc_passes_through_unchanged() {
        let (rendered, _) = run_pass(
            &lines(&["G90", "G2 X10 Y0 R10"]),
            (0.0, 0.0),
            RotationOp::Quarter(1),
            3,
            None,
        );
        let line = rendered[1].render();
        assert!(line.contains("R10"), "got: {line}");
    }

    #[test]
    fn zero_rotation_is_textually_stable() {
        let (rendered, _) = run_pass(
            &lines(&["G90", "G0 X1.5 Y2"]),
            (0.0, 0.0),
            RotationOp::Quarter(0),
            3,
            None,
        );
        assert_eq!(render_all(&rendered), vec!["G90", "G0 X1.5 Y2"]);
    }

    #[test]
    fn unknown_letter_generates_log_sink_entry() {
        let mut sink: Vec<String> = Vec::new();
        let (_rendered, debug_log) = run_pass(
            &lines(&["G90 Q5 X1 Y1"]),
            (0.0, 0.0),
            RotationOp::Quarter(0),
            3,
            Some(&mut sink),
        );
        assert!(sink.iter().any(|s| s.contains("unknown letter")));
        assert!(debug_log[0].warnings.iter().any(|w| w.contains('Q')));
    }

    #[test]
    fn unknown_letter_emits_a_tracing_warn_event() {
        use std::fmt;
        use std::sync::{Arc, Mutex};
        use tracing::dispatcher::Dispatch;
        use tracing::field::{Field, Visit};
        use tracing::Subscriber;
        use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
        use tracing_subscriber::registry::Registry;

        #[derive(Clone, Default)]
        struct Capture {
            events: Arc<Mutex<Vec<(String, Vec<(String, String)>)>>>,
        }

        #[derive(Default)]
        struct FieldCollector {
            fields: Vec<(String, String)>,
        }

        impl Visit for FieldCollector {
            fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
                self.fields
                    .push((field.name().to_string(), format!("{value:?}")));
            }
        }

        impl<S: Subscriber> Layer<S> for Capture {
            fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
                let mut collector = FieldCollector::default();
                event.record(&mut collector);
                self.events
                    .lock()
                    .unwrap()
                    .push((event.metadata().level().to_string(), collector.fields));
            }
        }

        let capture = Capture::default();
        let events = capture.events.clone();
        let dispatch = Dispatch::new(Registry::default().with(capture));

        tracing::dispatcher::with_default(&dispatch, || {
            run_pass(
                &lines(&["G90 Q5 X1 Y1"]),
                (0.0, 0.0),
                RotationOp::Quarter(0),
                3,
                None,
            );
        });

        let events = events.lock().unwrap();
        let warning = events
            .iter()
            .find(|(level, fields)| {
                level == "WARN" && fields.iter().any(|(k, v)| k == "warning" && v.contains('Q'))
            });
        assert!(warning.is_some(), "expected a WARN event about letter Q, got {events:?}");
    }

    #[test]
    fn recorded_absolute_line_tracks_rotated_xy() {
        let (rendered, _) = run_pass(
            &lines(&["G90", "G0 X10 Y20"]),
            (0.0, 0.0),
            RotationOp::Quarter(1),
            3,
            None,
        );
        assert_eq!(rendered[1].recorded_xy, Some((-20.0, 10.0)));
    }

    #[test]
    fn non_motion_absolute_line_is_not_recorded() {
        let (rendered, _) = run_pass(
            &lines(&["G90", "M03 S1000"]),
            (0.0, 0.0),
            RotationOp::Quarter(1),
            3,
            None,
        );
        assert!(rendered[1].recorded_xy.is_none());
    }
}
