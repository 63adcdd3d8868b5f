//! Pivot selection: the fixed point a rotation is performed about.

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;

/// A caller-chosen pivot. Bounding-box-based variants are always resolved
/// against the *source* program's bbox (SPEC_FULL.md §9 — "pivot resolution
/// timing"), never the rotated one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PivotSpec {
    Origin,
    BoundingBoxMin,
    BoundingBoxCenter,
    Custom { x: f64, y: f64 },
}

impl PivotSpec {
    /// Resolves this spec to a concrete `(x, y)` pair against `source_bbox`.
    pub fn resolve(self, source_bbox: &BoundingBox) -> (f64, f64) {
        match self {
            PivotSpec::Origin => (0.0, 0.0),
            PivotSpec::BoundingBoxMin => (source_bbox.min_x, source_bbox.min_y),
            PivotSpec::BoundingBoxCenter => (
                (source_bbox.min_x + source_bbox.max_x) / 2.0,
                (source_bbox.min_y + source_bbox.max_y) / 2.0,
            ),
            PivotSpec::Custom { x, y } => (x, y),
        }
    }
}
