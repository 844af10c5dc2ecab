//! Fixed-point path algebra.
//!
//! Offset, boolean operations and vertex cleaning on [`PathSet`]s. Closed
//! paths are treated as regions under the set's fill rule; open paths are
//! treated as polylines. Region arithmetic is delegated to the clipper on
//! integral coordinates, so every result lands exactly on the fixed-point
//! grid.
//!
//! Every function here is total. Degenerate input, or input that cancels
//! itself out, produces an empty set rather than an error. Output rings are
//! counter-clockwise for exteriors and clockwise for holes, and vertices the
//! algebra creates get a Z interpolated from the input when the input had Z.

mod clip;
mod interpolate;
mod region;

use geo::MultiPolygon;
use geo_clipper::{Clipper, EndType};
use pathcam_core::{FillRule, Path, PathSet, Point};

pub(crate) use clip::segment_inside;

use interpolate::restore_z;
use region::{
    build_islands, check_range, counter_clockwise, geo_to_rings, islands_to_paths, rings_to_geo,
    Island,
};

/// Maximum deviation, in fixed-point units, of round joins and stroked caps
/// from the true arc.
pub const ARC_TOLERANCE: f64 = 250.0;

/// Default miter limit, as a multiple of the offset distance.
pub const DEFAULT_MITER_LIMIT: f64 = 2.0;

/// Corner treatment for [`offset`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    /// Sharp corners, clipped at the miter limit
    Miter,
    /// Arcs around the corner
    #[default]
    Round,
    /// Corners squared off at the offset distance
    Square,
}

impl JoinType {
    fn to_clipper(self, miter_limit: f64) -> geo_clipper::JoinType {
        match self {
            JoinType::Miter => geo_clipper::JoinType::Miter(miter_limit.max(1.0)),
            JoinType::Round => geo_clipper::JoinType::Round(ARC_TOLERANCE),
            JoinType::Square => geo_clipper::JoinType::Square,
        }
    }
}

/// Boolean operation kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BooleanOp {
    Union,
    Intersection,
    Difference,
    Xor,
}

fn is_ring(path: &Path) -> bool {
    path.closed && path.len() >= 3 && path.signed_area() != 0.0
}

/// The region of the closed paths of `set` under its fill rule, as
/// non-overlapping clipper polygons.
fn resolved(set: &PathSet) -> MultiPolygon<f64> {
    let rings = set.iter().filter(|p| is_ring(p));
    let empty = MultiPolygon::new(Vec::new());
    match set.fill_rule {
        FillRule::NonZero => rings_to_geo(rings).union(&empty, 1.0),
        // Parity across rings: fold each ring in with xor
        FillRule::EvenOdd => rings.fold(empty, |acc, ring| {
            acc.xor(&rings_to_geo([&counter_clockwise(ring)]), 1.0)
        }),
    }
}

/// Turn clipper output into islands with Z restored from `sources`.
fn finish_islands(multi: &MultiPolygon<f64>, sources: &[&PathSet]) -> Vec<Island> {
    let rings = geo_to_rings(multi);
    // Clipper output never overlaps, so even-odd nesting is exact
    let mut islands = build_islands(&rings, FillRule::EvenOdd);
    for island in &mut islands {
        restore_z(std::slice::from_mut(&mut island.exterior), sources);
        restore_z(&mut island.holes, sources);
    }
    islands
}

fn finish(multi: &MultiPolygon<f64>, sources: &[&PathSet]) -> Vec<Path> {
    islands_to_paths(finish_islands(multi, sources))
}

/// Regular polygon approximating a circle, counter-clockwise, with every
/// vertex on the circle.
pub fn circle(center: &Point, radius: f64, segments: usize) -> Path {
    let segments = segments.max(3);
    let points = (0..segments)
        .map(|i| {
            let angle = std::f64::consts::TAU * i as f64 / segments as f64;
            Point {
                x: (center.x as f64 + radius * angle.cos()).round() as i64,
                y: (center.y as f64 + radius * angle.sin()).round() as i64,
                z: center.z,
            }
        })
        .collect();
    Path::closed(points)
}

/// Segment count keeping a circle of `radius` within [`ARC_TOLERANCE`].
pub fn circle_segments(radius: f64) -> usize {
    if radius <= ARC_TOLERANCE {
        return 8;
    }
    let step = 2.0 * (1.0 - ARC_TOLERANCE / radius).acos();
    ((std::f64::consts::TAU / step).ceil() as usize).clamp(8, 720)
}

/// Closed outline of open polylines swept by a disc of `radius`.
fn stroke(paths: &[Path], radius: f64) -> MultiPolygon<f64> {
    let segments = circle_segments(radius);
    let mut pieces: Vec<Path> = Vec::new();
    for path in paths {
        for p in &path.points {
            pieces.push(circle(p, radius, segments));
        }
        for (a, b) in path.edges() {
            let len = a.distance(&b);
            if len == 0.0 {
                continue;
            }
            let nx = (-(b.y - a.y) as f64 / len * radius).round() as i64;
            let ny = ((b.x - a.x) as f64 / len * radius).round() as i64;
            pieces.push(Path::closed(vec![
                Point::new(a.x - nx, a.y - ny),
                Point::new(b.x - nx, b.y - ny),
                Point::new(b.x + nx, b.y + ny),
                Point::new(a.x + nx, a.y + ny),
            ]));
        }
    }
    // Every piece runs counter-clockwise, so a non-zero union merges them
    rings_to_geo(&pieces).union(&MultiPolygon::new(Vec::new()), 1.0)
}

/// Grow (positive `distance`) or shrink (negative) boundaries by `distance`
/// fixed-point units.
///
/// Closed paths are offset as a region. Open paths are stroked into the
/// outline a tool of radius `distance` sweeps; a negative distance leaves
/// nothing of them. A zero distance returns the input unchanged.
pub fn offset(paths: &PathSet, distance: f64, join_type: JoinType, miter_limit: f64) -> PathSet {
    if distance == 0.0 {
        return paths.clone();
    }
    if let Err(err) = check_range(paths) {
        tracing::debug!("offset: {}", err);
        return PathSet::new();
    }

    let region = resolved(paths);
    let mut multi = if region.0.is_empty() {
        MultiPolygon::new(Vec::new())
    } else {
        region.offset(
            distance,
            join_type.to_clipper(miter_limit),
            EndType::ClosedPolygon,
            1.0,
        )
    };

    let open = paths.open_paths();
    if distance > 0.0 && !open.is_empty() {
        multi = multi.union(&stroke(&open.paths, distance), 1.0);
    }

    PathSet::from_paths(finish(&multi, &[paths]))
}

/// Combine two path sets.
///
/// Closed paths of each side are resolved under that side's fill rule
/// first. Open paths of `a` are clipped against the region of `b`: kept
/// inside it for [`BooleanOp::Intersection`], outside it for
/// [`BooleanOp::Difference`], and passed through for the other kinds. Open
/// paths of `b` play no part. Region results come first, then open runs.
pub fn boolean_op(kind: BooleanOp, a: &PathSet, b: &PathSet) -> PathSet {
    if let Err(err) = check_range(a).and_then(|_| check_range(b)) {
        tracing::debug!("boolean_op: {}", err);
        return PathSet::new();
    }

    let subject = resolved(a);
    let clip = resolved(b);
    let multi = match kind {
        BooleanOp::Union => subject.union(&clip, 1.0),
        BooleanOp::Intersection => subject.intersection(&clip, 1.0),
        BooleanOp::Difference => subject.difference(&clip, 1.0),
        BooleanOp::Xor => subject.xor(&clip, 1.0),
    };
    let mut result = finish(&multi, &[a, b]);

    let clip_rings = region_rings(b);
    for path in a.iter().filter(|p| !p.closed) {
        match kind {
            BooleanOp::Intersection => {
                result.extend(clip::clip_path(path, &clip_rings, FillRule::NonZero, true))
            }
            BooleanOp::Difference => {
                result.extend(clip::clip_path(path, &clip_rings, FillRule::NonZero, false))
            }
            BooleanOp::Union | BooleanOp::Xor => {
                if path.len() >= 2 {
                    result.push(path.clone());
                }
            }
        }
    }
    PathSet::from_paths(result)
}

/// A vertex `b` between `a` and `c` that adds nothing to the path.
fn is_redundant(a: &Point, b: &Point, c: &Point) -> bool {
    let (abx, aby) = ((b.x - a.x) as i128, (b.y - a.y) as i128);
    let (bcx, bcy) = ((c.x - b.x) as i128, (c.y - b.y) as i128);
    let straight = abx * bcy - aby * bcx == 0 && abx * bcx + aby * bcy > 0;
    if !straight {
        return false;
    }
    // Keep vertices that carry a change in slope along Z
    match (a.z, b.z, c.z) {
        (None, None, None) => true,
        (Some(za), Some(zb), Some(zc)) => {
            let total = a.distance(c);
            let expected = za + (zc - za) * a.distance(b) / total;
            (zb - expected).abs() <= 1e-9
        }
        _ => false,
    }
}

fn drop_redundant(mut points: Vec<Point>, closed: bool) -> Vec<Point> {
    loop {
        let n = points.len();
        if n < 3 {
            return points;
        }
        let found = (0..n).find(|&i| {
            if !closed && (i == 0 || i == n - 1) {
                return false;
            }
            is_redundant(&points[(i + n - 1) % n], &points[i], &points[(i + 1) % n])
        });
        match found {
            Some(i) => {
                points.remove(i);
            }
            None => return points,
        }
    }
}

/// Merge vertices closer than `tolerance` and drop the ones that lie on a
/// straight run between their neighbours.
///
/// Closed paths lose any trailing vertex that duplicates the first. Paths
/// left too short to mean anything (closed with fewer than three vertices or
/// no area, open with fewer than two) are removed. Cleaning a cleaned set
/// changes nothing.
pub fn clean(paths: &PathSet, tolerance: f64) -> PathSet {
    let tol2 = tolerance.max(0.0).powi(2);
    let near = |a: &Point, b: &Point| a.distance_squared(b) as f64 <= tol2;

    let cleaned = paths
        .iter()
        .filter_map(|path| {
            let mut points: Vec<Point> = Vec::with_capacity(path.len());
            for p in &path.points {
                match points.last() {
                    Some(last) if near(last, p) => {}
                    _ => points.push(*p),
                }
            }
            if path.closed {
                while points.len() > 1 && near(&points[points.len() - 1], &points[0]) {
                    points.pop();
                }
            }
            let points = drop_redundant(points, path.closed);
            let cleaned = Path::new(points, path.closed);
            let keep = if cleaned.closed {
                cleaned.len() >= 3 && cleaned.signed_area() != 0.0
            } else {
                cleaned.len() >= 2
            };
            keep.then_some(cleaned)
        })
        .collect::<Vec<_>>();

    PathSet::from_paths(cleaned).with_fill_rule(paths.fill_rule)
}

/// Split the region of `paths` into islands: one exterior ring followed by
/// the holes directly inside it. Open paths are ignored.
pub fn features(paths: &PathSet) -> Vec<PathSet> {
    if let Err(err) = check_range(paths) {
        tracing::debug!("features: {}", err);
        return Vec::new();
    }
    finish_islands(&resolved(paths), &[paths])
        .into_iter()
        .map(Island::into_path_set)
        .collect()
}

/// Normalized rings of the region of `region`, for point-in-region queries
/// under the non-zero rule.
pub(crate) fn region_rings(region: &PathSet) -> Vec<Path> {
    if check_range(region).is_err() {
        return Vec::new();
    }
    finish(&resolved(region), &[])
}
