use pathcam_core::{Path, PathSet};

use super::{Toolpath, ToolpathStrategy};
use crate::algebra::{circle, circle_segments};
use crate::operation::OperationParams;

/// One plunge at every operand vertex, in path-then-vertex order.
///
/// Sites carry no Z; the depth comes from the operation's cut depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrillStrategy;

impl ToolpathStrategy for DrillStrategy {
    fn generate(&self, operand: &PathSet, _params: &OperationParams) -> Toolpath {
        let sites = operand
            .points()
            .map(|p| Path::open(vec![p.at_z(None)]))
            .collect();
        Toolpath::new(sites)
    }

    fn preview_bloat(&self, tool_diameter: f64) -> f64 {
        tool_diameter / 2.0
    }

    fn preview_geometry(&self, operand: &PathSet, params: &OperationParams) -> PathSet {
        let radius = params.tool_radius_fixed();
        let segments = circle_segments(radius);
        operand
            .points()
            .map(|p| circle(&p.at_z(None), radius, segments))
            .collect()
    }
}
