//! Machining operations and their parameters.
//!
//! An [`Operation`] pairs operand geometry with the tool and cutting
//! parameters for one operation kind. Parameters are validated when the
//! operation is built; invalid values are reported, never clamped.

use pathcam_core::{to_fixed, ParameterError, PathSet};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of machining operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    /// One plunge per operand vertex
    Drill,
    /// Follow the operand lines with the tool centre
    Engrave,
    /// Cut along the inside of closed shapes
    Inside,
    /// Cut along the outside of closed shapes
    Outside,
    /// Engrave in alternating cut and gap runs
    Perforate,
    /// Clear a region with concentric rings
    AnnularPocket,
    /// Clear a region with parallel scan lines
    RasterPocket,
}

impl OperationKind {
    /// Returns the display name of the operation kind.
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::Drill => "Drill",
            OperationKind::Engrave => "Engrave",
            OperationKind::Inside => "Inside",
            OperationKind::Outside => "Outside",
            OperationKind::Perforate => "Perforate",
            OperationKind::AnnularPocket => "Annular Pocket",
            OperationKind::RasterPocket => "Raster Pocket",
        }
    }

    /// Pocket kinds clear an area rather than follow a line.
    pub fn is_pocket(&self) -> bool {
        matches!(self, OperationKind::AnnularPocket | OperationKind::RasterPocket)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Cutting direction relative to tool rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutDirection {
    #[default]
    Conventional,
    Climb,
}

/// Order in which annular pocket rings are cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RingOrder {
    /// Innermost ring first, finishing on the wall
    #[default]
    InsideOut,
    /// Wall ring first, working inward
    OutsideIn,
}

/// Tool and cutting parameters for one operation.
///
/// Lengths are millimetres; feeds are output units per minute and are
/// written to the program unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationParams {
    /// Tool diameter
    pub tool_diameter: f64,
    /// Distance between adjacent pocket passes, as a fraction of the diameter
    pub step_over: f64,
    /// Maximum depth removed per pass
    pub pass_depth: f64,
    /// Target depth below the material top, as a positive number
    pub cut_depth: f64,
    pub direction: CutDirection,
    /// Ramp into each pass along the path instead of plunging
    pub ramp: bool,
    /// Extra material left beside Inside/Outside profiles and pocket walls
    pub margin: f64,
    /// Split profile cuts into cut and gap runs
    pub perforate: bool,
    /// Period of the cut/gap pattern along the path
    pub perforation_spacing: f64,
    /// Length of each cut run; less than the spacing
    pub perforation_width: f64,
    pub ring_order: RingOrder,
    pub cut_feed: f64,
    pub plunge_feed: f64,
}

impl Default for OperationParams {
    fn default() -> Self {
        Self {
            tool_diameter: 3.175,
            step_over: 0.4,
            pass_depth: 1.0,
            cut_depth: 1.0,
            direction: CutDirection::Conventional,
            ramp: false,
            margin: 0.0,
            perforate: false,
            perforation_spacing: 5.0,
            perforation_width: 2.5,
            ring_order: RingOrder::InsideOut,
            cut_feed: 500.0,
            plunge_feed: 100.0,
        }
    }
}

fn require_positive(name: &str, value: f64) -> Result<(), ParameterError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ParameterError::invalid(
            name,
            format!("must be positive and finite, got {}", value),
        ))
    }
}

fn require_non_negative(name: &str, value: f64) -> Result<(), ParameterError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ParameterError::invalid(
            name,
            format!("must be zero or positive, got {}", value),
        ))
    }
}

impl OperationParams {
    /// Check every parameter `kind` relies on.
    pub fn validate(&self, kind: OperationKind) -> Result<(), ParameterError> {
        require_positive("tool_diameter", self.tool_diameter)?;
        require_positive("pass_depth", self.pass_depth)?;
        require_non_negative("cut_depth", self.cut_depth)?;
        require_non_negative("margin", self.margin)?;
        require_positive("cut_feed", self.cut_feed)?;
        require_positive("plunge_feed", self.plunge_feed)?;

        if kind.is_pocket() {
            require_positive("step_over", self.step_over)?;
            if self.step_over > 1.0 {
                return Err(ParameterError::invalid(
                    "step_over",
                    format!("must not exceed 1.0, got {}", self.step_over),
                ));
            }
        }

        if self.perforates(kind) {
            require_positive("perforation_spacing", self.perforation_spacing)?;
            require_positive("perforation_width", self.perforation_width)?;
            if self.perforation_width >= self.perforation_spacing {
                return Err(ParameterError::invalid(
                    "perforation_width",
                    format!(
                        "must be less than perforation_spacing ({}), got {}",
                        self.perforation_spacing, self.perforation_width
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Whether the profile output of `kind` is cut into runs.
    pub fn perforates(&self, kind: OperationKind) -> bool {
        match kind {
            OperationKind::Perforate => true,
            OperationKind::Engrave | OperationKind::Inside | OperationKind::Outside => {
                self.perforate
            }
            _ => false,
        }
    }

    /// Tool radius in fixed-point units.
    pub fn tool_radius_fixed(&self) -> f64 {
        to_fixed(self.tool_diameter) as f64 / 2.0
    }

    /// Margin in fixed-point units.
    pub fn margin_fixed(&self) -> f64 {
        to_fixed(self.margin) as f64
    }

    /// Pocket pass spacing in fixed-point units.
    pub fn step_fixed(&self) -> f64 {
        to_fixed(self.tool_diameter * self.step_over) as f64
    }
}

/// A machining operation: kind, operand geometry and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub name: String,
    pub kind: OperationKind,
    pub operand: PathSet,
    pub params: OperationParams,
}

impl Operation {
    /// Creates an operation, rejecting invalid parameters.
    pub fn new(
        name: impl Into<String>,
        kind: OperationKind,
        operand: PathSet,
        params: OperationParams,
    ) -> Result<Self, ParameterError> {
        params.validate(kind)?;
        Ok(Self {
            name: name.into(),
            kind,
            operand,
            params,
        })
    }
}
