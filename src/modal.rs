//! Modal State Tracker: interprets `G` words to track linear positioning
//! mode (absolute/incremental) and arc-center mode (absolute/incremental),
//! and flags whether a line is an arc move.
//!
//! Driven off the already-tokenized `G` words from [`crate::token`] rather
//! than re-scanning raw text — see SPEC_FULL.md §4.3 and §9: the `regex`
//! crate has no lookaround, so a literal `G90(?!\.1)` pattern cannot be
//! expressed, and reusing one token pass for both the bounding-box scanner
//! and the rotation transformer avoids the two passes ever disagreeing.

use serde::{Deserialize, Serialize};

use crate::token::Word;

/// Floating-point tolerance used when matching a `G` word's parsed value
/// against a known modal code (90, 91, 90.1, 91.1, 2, 3).
const CODE_TOLERANCE: f64 = 1e-9;

/// Tracks linear positioning mode and arc-center mode across a program.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModalState {
    /// `true` = absolute (G90), `false` = incremental (G91). Initial: true.
    pub linear_absolute: bool,
    /// `true` = absolute (G90.1), `false` = incremental (G91.1). Initial: false.
    pub arc_center_absolute: bool,
}

impl Default for ModalState {
    fn default() -> Self {
        ModalState {
            linear_absolute: true,
            arc_center_absolute: false,
        }
    }
}

/// Per-line modal facts derived from a single call to [`ModalState::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LineModalFlags {
    /// The line carries a `G2`/`G3` (any leading-zero form) motion word.
    pub is_arc: bool,
}

impl ModalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies every `G` word in `words` to this state, in order, and
    /// returns whether the line was an arc move. Must be called before the
    /// line's coordinates are rotated (invariant 4).
    pub fn update(&mut self, words: &[Word]) -> LineModalFlags {
        let mut flags = LineModalFlags::default();
        for w in words {
            if w.letter != 'G' {
                continue;
            }
            let Some(v) = w.parsed_value() else {
                continue;
            };
            if close(v, 90.0) {
                self.linear_absolute = true;
            } else if close(v, 91.0) {
                self.linear_absolute = false;
            } else if close(v, 90.1) {
                self.arc_center_absolute = true;
            } else if close(v, 91.1) {
                self.arc_center_absolute = false;
            } else if close(v, 2.0) || close(v, 3.0) {
                flags.is_arc = true;
            }
        }
        flags
    }
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < CODE_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::scan_words;

    fn g(words: &str) -> Vec<Word> {
        scan_words(words)
    }

    #[test]
    fn initial_state_is_absolute_linear_relative_arc() {
        let m = ModalState::new();
        assert!(m.linear_absolute);
        assert!(!m.arc_center_absolute);
    }

    #[test]
    fn g90_sets_linear_absolute() {
        let mut m = ModalState::new();
        m.linear_absolute = false;
        m.update(&g("G90"));
        assert!(m.linear_absolute);
    }

    #[test]
    fn g91_sets_linear_incremental() {
        let mut m = ModalState::new();
        m.update(&g("G91"));
        assert!(!m.linear_absolute);
    }

    #[test]
    fn g90_1_sets_arc_center_absolute_without_touching_linear_mode() {
        let mut m = ModalState::new();
        m.update(&g("G91")); // linear incremental
        m.update(&g("G90.1"));
        assert!(m.arc_center_absolute);
        assert!(!m.linear_absolute, "G90.1 must not affect linear mode");
    }

    #[test]
    fn g91_1_sets_arc_center_incremental() {
        let mut m = ModalState::new();
        m.update(&g("G90.1"));
        m.update(&g("G91.1"));
        assert!(!m.arc_center_absolute);
    }

    #[test]
    fn g90_and_g90_1_distinct_codes() {
        let mut m = ModalState::new();
        m.update(&g("G91"));
        m.update(&g("G91.1"));
        assert!(!m.linear_absolute);
        assert!(!m.arc_center_absolute);
        m.update(&g("G90"));
        assert!(m.linear_absolute);
        assert!(!m.arc_center_absolute, "G90 alone must not flip arc mode");
    }

    #[test]
    fn g2_flags_arc() {
        let mut m = ModalState::new();
        let flags = m.update(&g("G2 X10 Y0 I5 J0"));
        assert!(flags.is_arc);
    }

    #[test]
    fn g3_flags_arc() {
        let mut m = ModalState::new();
        let flags = m.update(&g("G3 X10 Y0 I5 J0"));
        assert!(flags.is_arc);
    }

    #[test]
    fn leading_zeros_on_arc_code_still_flag() {
        let mut m = ModalState::new();
        assert!(m.update(&g("G02 X1 Y1")).is_arc);
        assert!(m.update(&g("G002")).is_arc);
        assert!(m.update(&g("G003")).is_arc);
    }

    #[test]
    fn non_arc_motion_does_not_flag() {
        let mut m = ModalState::new();
        assert!(!m.update(&g("G0 X1 Y1")).is_arc);
        assert!(!m.update(&g("G1 X1 Y1")).is_arc);
    }

    #[test]
    fn line_with_no_g_word_leaves_state_unchanged() {
        let mut m = ModalState::new();
        m.update(&g("G91"));
        let before = m;
        m.update(&g("X10 Y20 F500"));
        assert_eq!(before, m);
    }

    #[test]
    fn combined_mode_and_arc_on_one_line() {
        let mut m = ModalState::new();
        m.update(&g("G91"));
        let flags = m.update(&g("G90.1 G2 X10 Y0 I5 J0"));
        assert!(flags.is_arc);
        assert!(m.arc_center_absolute);
        assert!(!m.linear_absolute);
    }

    #[test]
    fn state_persists_across_lines_until_changed() {
        let mut m = ModalState::new();
        m.update(&g("G91"));
        m.update(&g("X10 Y20"));
        assert!(!m.linear_absolute, "mode must persist across a motion-only line");
    }
}
