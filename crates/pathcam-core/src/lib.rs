//! # PathCAM Core
//!
//! Core types shared by every PathCAM crate: fixed-point geometry, output
//! units and number formatting, machine state, and error types.

pub mod error;
pub mod geometry;
pub mod machine;
pub mod units;

pub use error::{Error, GcodeError, GeometryError, ParameterError, Result};
pub use geometry::{
    distance_to_mm, from_fixed, to_fixed, Bounds, Bounds3, FillRule, Path, PathSet, Point, ZRange,
    FIXED_POINT_SCALE,
};
pub use machine::{MachineState, SpindleState};
pub use units::{format_number, Units};
