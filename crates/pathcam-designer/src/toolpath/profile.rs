//! Profile strategies: Engrave, Inside, Outside and Perforate.
//!
//! All four are a single offset of the operand, followed by orientation for
//! the cut direction and optional perforation.

use pathcam_core::{to_fixed, Path, PathSet};

use super::perforate::perforate;
use super::{as_polylines, orient, Toolpath, ToolpathStrategy, CLEAN_TOLERANCE};
use crate::algebra::{
    boolean_op, clean, features, offset, BooleanOp, JoinType, DEFAULT_MITER_LIMIT,
};
use crate::operation::{CutDirection, OperationKind, OperationParams};

/// Which side of the operand boundary the tool centre follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    On,
    Inside,
    Outside,
}

fn grow(paths: &PathSet, distance: f64) -> PathSet {
    offset(paths, distance, JoinType::Round, DEFAULT_MITER_LIMIT)
}

fn profile(kind: OperationKind, side: Side, operand: &PathSet, params: &OperationParams) -> Toolpath {
    let operand = clean(operand, CLEAN_TOLERANCE);
    let distance = params.tool_radius_fixed() + params.margin_fixed();
    let open = operand.open_paths().len();
    if side != Side::On && open > 0 {
        tracing::warn!("{}: skipped {} open paths", kind, open);
    }
    let mut skipped = if side == Side::On { 0 } else { open };

    let paths: Vec<Path> = match side {
        Side::On => operand.paths.clone(),
        Side::Inside => {
            let mut paths = Vec::new();
            for island in features(&operand) {
                let inset = grow(&island, -distance);
                if inset.is_empty() {
                    tracing::warn!(
                        "{}: feature too small for a {} mm tool, skipped",
                        kind,
                        params.tool_diameter
                    );
                    skipped += 1;
                }
                paths.extend(inset.paths);
            }
            paths
        }
        Side::Outside => grow(&operand.closed_paths(), distance).paths,
    };

    let climb = params.direction == CutDirection::Climb;
    let reverse = match side {
        Side::On | Side::Outside => climb,
        Side::Inside => !climb,
    };
    let mut paths = orient(paths, reverse);

    if params.perforates(kind) {
        let spacing = to_fixed(params.perforation_spacing) as f64;
        let width = to_fixed(params.perforation_width) as f64;
        paths = paths
            .iter()
            .flat_map(|path| perforate(path, spacing, width))
            .collect();
    }

    let mut toolpath = Toolpath::new(paths);
    toolpath.generates_z = !toolpath.is_empty() && toolpath.paths.iter().all(Path::has_full_z);
    toolpath.skipped_features = skipped;
    toolpath
}

/// Swept area of a tool following `toolpath` exactly.
fn stroke_preview(toolpath: &Toolpath, params: &OperationParams) -> PathSet {
    grow(&as_polylines(&toolpath.paths), params.tool_radius_fixed())
}

/// Follow the operand lines with the tool centre.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngraveStrategy;

impl ToolpathStrategy for EngraveStrategy {
    fn generate(&self, operand: &PathSet, params: &OperationParams) -> Toolpath {
        profile(OperationKind::Engrave, Side::On, operand, params)
    }

    fn preview_bloat(&self, tool_diameter: f64) -> f64 {
        tool_diameter / 2.0
    }

    fn preview_geometry(&self, operand: &PathSet, params: &OperationParams) -> PathSet {
        stroke_preview(&self.generate(operand, params), params)
    }
}

/// Engrave in alternating cut and gap runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PerforateStrategy;

impl ToolpathStrategy for PerforateStrategy {
    fn generate(&self, operand: &PathSet, params: &OperationParams) -> Toolpath {
        profile(OperationKind::Perforate, Side::On, operand, params)
    }

    fn preview_bloat(&self, tool_diameter: f64) -> f64 {
        tool_diameter / 2.0
    }

    fn preview_geometry(&self, operand: &PathSet, params: &OperationParams) -> PathSet {
        stroke_preview(&self.generate(operand, params), params)
    }
}

/// Cut along the inside of closed shapes, leaving the shape's edge on the
/// tool's outer edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InsideStrategy;

impl ToolpathStrategy for InsideStrategy {
    fn generate(&self, operand: &PathSet, params: &OperationParams) -> Toolpath {
        profile(OperationKind::Inside, Side::Inside, operand, params)
    }

    fn preview_bloat(&self, _tool_diameter: f64) -> f64 {
        0.0
    }

    fn preview_geometry(&self, operand: &PathSet, params: &OperationParams) -> PathSet {
        let closed = operand.closed_paths();
        let margin = params.margin_fixed();
        let diameter = 2.0 * params.tool_radius_fixed();
        boolean_op(
            BooleanOp::Difference,
            &grow(&closed, -margin),
            &grow(&closed, -(diameter + margin)),
        )
    }
}

/// Cut along the outside of closed shapes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutsideStrategy;

impl ToolpathStrategy for OutsideStrategy {
    fn generate(&self, operand: &PathSet, params: &OperationParams) -> Toolpath {
        profile(OperationKind::Outside, Side::Outside, operand, params)
    }

    fn preview_bloat(&self, tool_diameter: f64) -> f64 {
        tool_diameter
    }

    fn preview_geometry(&self, operand: &PathSet, params: &OperationParams) -> PathSet {
        let closed = operand.closed_paths();
        let margin = params.margin_fixed();
        let diameter = 2.0 * params.tool_radius_fixed();
        boolean_op(
            BooleanOp::Difference,
            &grow(&closed, diameter + margin),
            &grow(&closed, margin),
        )
    }
}
