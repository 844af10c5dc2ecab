//! Pocket strategies: clearing a region with concentric rings or with
//! parallel scan lines.

use pathcam_core::{Path, PathSet, Point};

use super::{link_paths, orient, Toolpath, ToolpathStrategy, CLEAN_TOLERANCE};
use crate::algebra::{
    boolean_op, clean, features, offset, region_rings, BooleanOp, JoinType, DEFAULT_MITER_LIMIT,
};
use crate::operation::{CutDirection, OperationKind, OperationParams, RingOrder};

/// Upper bound on ring levels for one island.
const MAX_LEVELS: usize = 10_000;

fn grow(paths: &PathSet, distance: f64) -> PathSet {
    offset(paths, distance, JoinType::Round, DEFAULT_MITER_LIMIT)
}

/// Per-island pocket regions: each island shrunk so the tool edge stops at
/// the wall plus margin. Islands too small for the tool are counted.
fn pocket_regions(kind: OperationKind, operand: &PathSet, params: &OperationParams) -> (Vec<PathSet>, usize) {
    let operand = clean(operand, CLEAN_TOLERANCE);
    let open = operand.open_paths().len();
    if open > 0 {
        tracing::warn!("{}: skipped {} open paths", kind, open);
    }
    let inset = params.tool_radius_fixed() + params.margin_fixed();

    let mut skipped = open;
    let mut regions = Vec::new();
    for island in features(&operand) {
        let region = grow(&island, -inset);
        if region.is_empty() {
            tracing::warn!(
                "{}: feature too small for a {} mm tool, skipped",
                kind,
                params.tool_diameter
            );
            skipped += 1;
        } else {
            regions.push(region);
        }
    }
    (regions, skipped)
}

fn pocket_preview(operand: &PathSet, params: &OperationParams) -> PathSet {
    let radius = params.tool_radius_fixed();
    let reach = grow(&operand.closed_paths(), -(radius + params.margin_fixed()));
    grow(&reach, radius)
}

/// Clear a region with concentric rings, each `step_over * diameter`
/// inside the last.
///
/// Rings of one island are linked into a single path wherever the move
/// between them stays inside the pocket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnularPocketStrategy;

impl ToolpathStrategy for AnnularPocketStrategy {
    fn generate(&self, operand: &PathSet, params: &OperationParams) -> Toolpath {
        let (regions, skipped) = pocket_regions(OperationKind::AnnularPocket, operand, params);
        let step = params.step_fixed().max(1.0);
        let reverse = params.direction == CutDirection::Conventional;

        let mut paths = Vec::new();
        for region in regions {
            let mut levels: Vec<PathSet> = Vec::new();
            let mut level = region.clone();
            while !level.is_empty() {
                if levels.len() >= MAX_LEVELS {
                    tracing::warn!("Annular pocket stopped after {} rings", MAX_LEVELS);
                    break;
                }
                let next = grow(&level, -step);
                levels.push(level);
                level = next;
            }
            if params.ring_order == RingOrder::InsideOut {
                levels.reverse();
            }

            let rings: Vec<Path> = levels.into_iter().flat_map(|l| l.paths).collect();
            let rings = orient(rings, reverse);
            paths.extend(link_paths(rings, &region_rings(&region), true));
        }

        let mut toolpath = Toolpath::new(paths);
        toolpath.skipped_features = skipped;
        toolpath
    }

    fn preview_bloat(&self, _tool_diameter: f64) -> f64 {
        0.0
    }

    fn preview_geometry(&self, operand: &PathSet, params: &OperationParams) -> PathSet {
        pocket_preview(operand, params)
    }
}

/// Clear a region with horizontal scan lines no more than
/// `step_over * diameter` apart, cut back and forth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RasterPocketStrategy;

fn scan_lines(region: &PathSet, step: f64, climb: bool) -> PathSet {
    let Some(bounds) = region.bounds() else {
        return PathSet::new();
    };
    let height = bounds.height() as f64;
    let count = ((height / step).ceil() as usize).max(1);
    let spacing = height / count as f64;

    (0..count)
        .map(|i| {
            let y = bounds.min_y + ((i as f64 + 0.5) * spacing).round() as i64;
            let line = Path::open(vec![
                Point::new(bounds.min_x - 1, y),
                Point::new(bounds.max_x + 1, y),
            ]);
            if (i % 2 == 1) != climb {
                line.reversed()
            } else {
                line
            }
        })
        .collect()
}

impl ToolpathStrategy for RasterPocketStrategy {
    fn generate(&self, operand: &PathSet, params: &OperationParams) -> Toolpath {
        let (regions, skipped) = pocket_regions(OperationKind::RasterPocket, operand, params);
        let step = params.step_fixed().max(1.0);
        let climb = params.direction == CutDirection::Climb;

        let mut paths = Vec::new();
        for region in regions {
            let lines = scan_lines(&region, step, climb);
            let runs = boolean_op(BooleanOp::Intersection, &lines, &region);
            paths.extend(link_paths(runs.paths, &region_rings(&region), false));
        }

        let mut toolpath = Toolpath::new(paths);
        toolpath.skipped_features = skipped;
        toolpath
    }

    fn preview_bloat(&self, _tool_diameter: f64) -> f64 {
        0.0
    }

    fn preview_geometry(&self, operand: &PathSet, params: &OperationParams) -> PathSet {
        pocket_preview(operand, params)
    }
}
