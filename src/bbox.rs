//! Bounding-Box Scanner: a read-only pass that replays modal state and
//! accumulates a running absolute position to compute the program-wide
//! axis-aligned bounding box over X/Y.

use serde::{Deserialize, Serialize};

use crate::line::split_line;
use crate::modal::ModalState;
use crate::token::scan_words;

/// An axis-aligned bounding box over X/Y, in program units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    /// The all-zero bounding box returned when no X/Y was ever observed.
    pub const fn zero() -> Self {
        BoundingBox {
            min_x: 0.0,
            min_y: 0.0,
            max_x: 0.0,
            max_y: 0.0,
        }
    }

    fn observe(&mut self, seen_any: &mut bool, x: f64, y: f64) {
        if !*seen_any {
            *self = BoundingBox {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
            };
            *seen_any = true;
        } else {
            self.min_x = self.min_x.min(x);
            self.min_y = self.min_y.min(y);
            self.max_x = self.max_x.max(x);
            self.max_y = self.max_y.max(y);
        }
    }
}

/// Computes the bounding box of `lines`, replaying modal state exactly the
/// way the rotation transformer does (invariant 6).
pub fn compute_bounding_box(lines: &[String]) -> BoundingBox {
    let mut modal = ModalState::new();
    let mut bbox = BoundingBox::zero();
    let mut seen_any = false;
    let (mut cx, mut cy) = (0.0_f64, 0.0_f64);

    for raw in lines {
        let split = split_line(raw);
        if split.comment_only {
            continue;
        }
        let words = scan_words(&split.code_part);
        modal.update(&words);

        let x = words.iter().find(|w| w.letter == 'X').and_then(|w| w.parsed_value());
        let y = words.iter().find(|w| w.letter == 'Y').and_then(|w| w.parsed_value());
        if x.is_none() && y.is_none() {
            continue;
        }

        if modal.linear_absolute {
            if let Some(v) = x {
                cx = v;
            }
            if let Some(v) = y {
                cy = v;
            }
        } else {
            cx += x.unwrap_or(0.0);
            cy += y.unwrap_or(0.0);
        }
        bbox.observe(&mut seen_any, cx, cy);
    }

    bbox
}
