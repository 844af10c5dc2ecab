//! Fixed-point geometry primitives.
//!
//! X and Y are integers in fixed-point units ([`FIXED_POINT_SCALE`] units per
//! millimetre) so the polygon algebra works on exact integers. Z stays in
//! floating point millimetres relative to the material top.

mod path;
mod path_set;
mod point;

pub use path::{Bounds, Bounds3, Path, ZRange};
pub use path_set::{FillRule, PathSet};
pub use point::Point;

/// Fixed-point units per millimetre.
pub const FIXED_POINT_SCALE: f64 = 100_000.0;

/// Convert millimetres to fixed-point units, rounding to the nearest unit.
pub fn to_fixed(value_mm: f64) -> i64 {
    (value_mm * FIXED_POINT_SCALE).round() as i64
}

/// Convert a fixed-point length or coordinate to millimetres.
pub fn from_fixed(value: i64) -> f64 {
    value as f64 / FIXED_POINT_SCALE
}

/// Convert a floating fixed-point distance to millimetres.
pub fn distance_to_mm(value: f64) -> f64 {
    value / FIXED_POINT_SCALE
}
