//! Toolpath generation.
//!
//! Each operation kind has a strategy type implementing [`ToolpathStrategy`].
//! [`Strategy`] wraps them in one enum so callers can dispatch on an
//! [`OperationKind`] without boxing. Strategies are pure: the same operand
//! and parameters always give the same toolpath.

mod drill;
mod perforate;
mod pocket;
mod profile;

pub use drill::DrillStrategy;
pub use pocket::{AnnularPocketStrategy, RasterPocketStrategy};
pub use profile::{EngraveStrategy, InsideStrategy, OutsideStrategy, PerforateStrategy};

use crate::algebra::segment_inside;
use crate::operation::{OperationKind, OperationParams};
use pathcam_core::{FillRule, Path, PathSet, Point};

/// Vertices closer than this many fixed-point units are merged before
/// generating toolpaths.
pub const CLEAN_TOLERANCE: f64 = 100.0;

/// Tool-centre paths for one operation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Toolpath {
    /// Paths in cutting order
    pub paths: PathSet,
    /// Every vertex already carries its final Z
    pub generates_z: bool,
    /// Operand features too small for the tool that produced no path
    pub skipped_features: usize,
}

impl Toolpath {
    pub fn new(paths: Vec<Path>) -> Self {
        Self {
            paths: PathSet::from_paths(paths),
            generates_z: false,
            skipped_features: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Total travel length along the paths, in fixed-point units.
    pub fn length(&self) -> f64 {
        self.paths.iter().map(Path::length).sum()
    }
}

/// Shared contract of every toolpath strategy.
pub trait ToolpathStrategy {
    /// Tool-centre paths for `operand`.
    fn generate(&self, operand: &PathSet, params: &OperationParams) -> Toolpath;

    /// How far, in millimetres, cut material reaches beyond the operand
    /// geometry for a tool of `tool_diameter`.
    fn preview_bloat(&self, tool_diameter: f64) -> f64;

    /// Approximate area swept by the tool.
    fn preview_geometry(&self, operand: &PathSet, params: &OperationParams) -> PathSet;
}

/// Strategy for any operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Drill(DrillStrategy),
    Engrave(EngraveStrategy),
    Inside(InsideStrategy),
    Outside(OutsideStrategy),
    Perforate(PerforateStrategy),
    AnnularPocket(AnnularPocketStrategy),
    RasterPocket(RasterPocketStrategy),
}

impl Strategy {
    pub fn for_kind(kind: OperationKind) -> Self {
        match kind {
            OperationKind::Drill => Strategy::Drill(DrillStrategy),
            OperationKind::Engrave => Strategy::Engrave(EngraveStrategy),
            OperationKind::Inside => Strategy::Inside(InsideStrategy),
            OperationKind::Outside => Strategy::Outside(OutsideStrategy),
            OperationKind::Perforate => Strategy::Perforate(PerforateStrategy),
            OperationKind::AnnularPocket => Strategy::AnnularPocket(AnnularPocketStrategy),
            OperationKind::RasterPocket => Strategy::RasterPocket(RasterPocketStrategy),
        }
    }

    fn inner(&self) -> &dyn ToolpathStrategy {
        match self {
            Strategy::Drill(s) => s,
            Strategy::Engrave(s) => s,
            Strategy::Inside(s) => s,
            Strategy::Outside(s) => s,
            Strategy::Perforate(s) => s,
            Strategy::AnnularPocket(s) => s,
            Strategy::RasterPocket(s) => s,
        }
    }
}

impl ToolpathStrategy for Strategy {
    fn generate(&self, operand: &PathSet, params: &OperationParams) -> Toolpath {
        self.inner().generate(operand, params)
    }

    fn preview_bloat(&self, tool_diameter: f64) -> f64 {
        self.inner().preview_bloat(tool_diameter)
    }

    fn preview_geometry(&self, operand: &PathSet, params: &OperationParams) -> PathSet {
        self.inner().preview_geometry(operand, params)
    }
}

/// Generate the toolpath for `kind` over `operand`.
pub fn generate_toolpath(
    kind: OperationKind,
    operand: &PathSet,
    params: &OperationParams,
) -> Toolpath {
    let toolpath = Strategy::for_kind(kind).generate(operand, params);
    tracing::debug!(
        "{} toolpath: {} paths, {} skipped features",
        kind,
        toolpath.paths.len(),
        toolpath.skipped_features
    );
    toolpath
}

/// Reverse every path when `reverse` is set.
pub(crate) fn orient(paths: Vec<Path>, reverse: bool) -> Vec<Path> {
    if reverse {
        paths.iter().map(Path::reversed).collect()
    } else {
        paths
    }
}

/// Closed paths as explicitly closed open polylines.
pub(crate) fn as_polylines(paths: &PathSet) -> PathSet {
    paths
        .iter()
        .map(|path| {
            let mut points = path.points.clone();
            if path.closed {
                if let Some(first) = points.first().copied() {
                    points.push(first);
                }
            }
            Path::open(points)
        })
        .collect()
}

fn nearest_index(points: &[Point], target: &Point) -> usize {
    points
        .iter()
        .enumerate()
        .min_by_key(|(_, p)| p.distance_squared(target))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

struct Chain {
    points: Vec<Point>,
    single_ring: bool,
}

impl Chain {
    fn into_path(mut self) -> Path {
        if self.single_ring {
            self.points.pop();
            Path::closed(self.points)
        } else {
            Path::open(self.points)
        }
    }
}

/// Join consecutive paths where the straight move between them stays inside
/// `region`, so the tool keeps cutting instead of retracting.
///
/// With `rotate_rings`, each closed path after the first starts at its
/// vertex nearest the current tool position. Closed paths are traversed back
/// to their start before moving on. A closed path that ends up alone stays
/// closed; joined chains are open.
pub(crate) fn link_paths(paths: Vec<Path>, region: &[Path], rotate_rings: bool) -> Vec<Path> {
    let mut linked = Vec::new();
    let mut current: Option<Chain> = None;

    for path in paths {
        if path.is_empty() {
            continue;
        }
        let mut points = path.points;
        if path.closed {
            if let (true, Some(chain)) = (rotate_rings, current.as_ref()) {
                if let Some(end) = chain.points.last() {
                    let start = nearest_index(&points, end);
                    points.rotate_left(start);
                }
            }
            points.push(points[0]);
        }

        if let Some(chain) = current.as_mut() {
            let (Some(end), Some(start)) = (chain.points.last().copied(), points.first().copied())
            else {
                continue;
            };
            if segment_inside(&end, &start, region, FillRule::NonZero) {
                let skip = usize::from(end == start);
                chain.points.extend(points.into_iter().skip(skip));
                chain.single_ring = false;
                continue;
            }
        }
        if let Some(chain) = current.take() {
            linked.push(chain.into_path());
        }
        current = Some(Chain {
            points,
            single_ring: path.closed,
        });
    }
    if let Some(chain) = current {
        linked.push(chain.into_path());
    }
    linked
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(x: i64, y: i64, size: i64) -> Path {
        Path::closed(vec![
            Point::new(x, y),
            Point::new(x + size, y),
            Point::new(x + size, y + size),
            Point::new(x, y + size),
        ])
    }

    #[test]
    fn test_strategy_dispatch_bloat() {
        let d = 4.0;
        assert_eq!(Strategy::for_kind(OperationKind::Drill).preview_bloat(d), 2.0);
        assert_eq!(Strategy::for_kind(OperationKind::Engrave).preview_bloat(d), 2.0);
        assert_eq!(Strategy::for_kind(OperationKind::Perforate).preview_bloat(d), 2.0);
        assert_eq!(Strategy::for_kind(OperationKind::Outside).preview_bloat(d), 4.0);
        assert_eq!(Strategy::for_kind(OperationKind::Inside).preview_bloat(d), 0.0);
        assert_eq!(Strategy::for_kind(OperationKind::AnnularPocket).preview_bloat(d), 0.0);
        assert_eq!(Strategy::for_kind(OperationKind::RasterPocket).preview_bloat(d), 0.0);
    }

    #[test]
    fn test_link_nested_rings() {
        let region = vec![square(0, 0, 1000)];
        let rings = vec![square(400, 400, 200), square(0, 0, 1000)];
        let linked = link_paths(rings, &region, true);
        assert_eq!(linked.len(), 1);
        let path = &linked[0];
        assert!(!path.closed);
        // Inner ring closed explicitly, then the outer ring from its nearest
        // vertex back round to it
        assert_eq!(path.points[0], Point::new(400, 400));
        assert_eq!(path.points[4], Point::new(400, 400));
        assert_eq!(path.points[5], Point::new(0, 0));
        assert_eq!(path.last(), Some(&Point::new(0, 0)));
        assert_eq!(path.len(), 10);
    }

    #[test]
    fn test_link_keeps_lone_ring_closed() {
        let region = vec![square(0, 0, 100), square(200, 0, 100)];
        let rings = vec![square(10, 10, 80), square(210, 10, 80)];
        let linked = link_paths(rings.clone(), &region, true);
        assert_eq!(linked, rings);
    }

    #[test]
    fn test_as_polylines_closes() {
        let set = PathSet::from_paths(vec![square(0, 0, 10)]);
        let lines = as_polylines(&set);
        assert!(!lines.paths[0].closed);
        assert_eq!(lines.paths[0].len(), 5);
        assert_eq!(lines.paths[0].first(), lines.paths[0].last());
    }
}
