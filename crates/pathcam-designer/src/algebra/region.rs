//! Region structure: turning loose rings plus a fill rule into islands, and
//! converting islands to and from the geo types the clipper works on.

use geo::{Coord, LineString, MultiPolygon, Polygon};
use pathcam_core::{FillRule, GeometryError, Path, PathSet, Point};

/// Largest coordinate magnitude that survives the round trip through `f64`.
const MAX_COORDINATE: i64 = 1 << 52;

/// Distance, in fixed-point units, within which a point counts as lying on
/// a boundary.
const BOUNDARY_TOLERANCE: f64 = 0.5;

/// One exterior ring and the holes directly inside it.
///
/// Exteriors run counter-clockwise, holes clockwise.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Island {
    pub exterior: Path,
    pub holes: Vec<Path>,
}

impl Island {
    pub fn into_path_set(self) -> PathSet {
        let mut paths = Vec::with_capacity(self.holes.len() + 1);
        paths.push(self.exterior);
        paths.extend(self.holes);
        PathSet::from_paths(paths)
    }
}

/// Where a point lies relative to a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Location {
    Inside,
    Outside,
    Boundary,
}

pub(crate) fn check_range(set: &PathSet) -> Result<(), GeometryError> {
    match set
        .points()
        .flat_map(|p| [p.x, p.y])
        .find(|v| v.abs() > MAX_COORDINATE)
    {
        Some(value) => Err(GeometryError::CoordinateOutOfRange { value }),
        None => Ok(()),
    }
}

fn ring_to_line_string(path: &Path) -> LineString<f64> {
    let mut coords: Vec<Coord<f64>> = path
        .points
        .iter()
        .map(|p| Coord {
            x: p.x as f64,
            y: p.y as f64,
        })
        .collect();

    // Close the ring if needed
    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if first != last {
            coords.push(first);
        }
    }
    LineString::new(coords)
}

fn line_string_to_ring(line: &LineString<f64>) -> Option<Path> {
    let mut points: Vec<Point> = line
        .coords()
        .map(|c| Point::new(c.x.round() as i64, c.y.round() as i64))
        .collect();

    // Our rings keep the closing edge implicit
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }
    points.dedup();
    (points.len() >= 3).then(|| Path::closed(points))
}

/// Each ring as its own hole-free polygon, orientation untouched.
pub(crate) fn rings_to_geo<'a>(rings: impl IntoIterator<Item = &'a Path>) -> MultiPolygon<f64> {
    MultiPolygon::new(
        rings
            .into_iter()
            .map(|ring| Polygon::new(ring_to_line_string(ring), Vec::new()))
            .collect(),
    )
}

/// Counter-clockwise copy of `ring`.
pub(crate) fn counter_clockwise(ring: &Path) -> Path {
    oriented(ring.clone(), true)
}

/// Flatten clipper output to rings, ignoring how it grouped them.
pub(crate) fn geo_to_rings(multi: &MultiPolygon<f64>) -> Vec<Path> {
    multi
        .0
        .iter()
        .flat_map(|poly| std::iter::once(poly.exterior()).chain(poly.interiors().iter()))
        .filter_map(line_string_to_ring)
        .collect()
}

/// Winding number of `ring` around `(px, py)`; counter-clockwise is positive.
pub(crate) fn winding_number(px: f64, py: f64, ring: &Path) -> i32 {
    let mut winding = 0;
    for (a, b) in ring.edges() {
        let (ax, ay, bx, by) = (a.x as f64, a.y as f64, b.x as f64, b.y as f64);
        let side = (bx - ax) * (py - ay) - (px - ax) * (by - ay);
        if ay <= py {
            if by > py && side > 0.0 {
                winding += 1;
            }
        } else if by <= py && side < 0.0 {
            winding -= 1;
        }
    }
    winding
}

fn distance_to_segment(px: f64, py: f64, a: &Point, b: &Point) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((px - ax) * dx + (py - ay) * dy) / len2).clamp(0.0, 1.0)
    };
    let (qx, qy) = (ax + dx * t, ay + dy * t);
    ((px - qx).powi(2) + (py - qy).powi(2)).sqrt()
}

/// Locate a point against closed `rings` under `fill_rule`.
pub(crate) fn locate(px: f64, py: f64, rings: &[Path], fill_rule: FillRule) -> Location {
    let on_boundary = rings.iter().any(|ring| {
        ring.edges()
            .any(|(a, b)| distance_to_segment(px, py, &a, &b) <= BOUNDARY_TOLERANCE)
    });
    if on_boundary {
        return Location::Boundary;
    }
    let winding: i32 = rings.iter().map(|r| winding_number(px, py, r)).sum();
    if fill_rule.is_inside(winding) {
        Location::Inside
    } else {
        Location::Outside
    }
}

/// A point just inside `ring`, next to the middle of its longest edge.
fn interior_sample(ring: &Path) -> Option<(f64, f64)> {
    let (a, b) = ring
        .edges()
        .max_by(|(a1, b1), (a2, b2)| a1.distance_squared(b1).cmp(&a2.distance_squared(b2)))?;
    let len = a.distance(&b);
    if len == 0.0 {
        return None;
    }
    let (mx, my) = ((a.x + b.x) as f64 / 2.0, (a.y + b.y) as f64 / 2.0);
    // Left of travel is inside for a counter-clockwise ring
    let sign = if ring.signed_area() > 0.0 { 1.0 } else { -1.0 };
    let (nx, ny) = (-(b.y - a.y) as f64 / len, (b.x - a.x) as f64 / len);
    let eps = (len / 4.0).min(BOUNDARY_TOLERANCE / 2.0);
    Some((mx + sign * nx * eps, my + sign * ny * eps))
}

/// Does `inner` lie inside `outer`? Decided by the first vertex of `inner`
/// that is not on `outer`'s boundary.
fn ring_inside(inner: &Path, outer: &Path) -> bool {
    let ring = std::slice::from_ref(outer);
    for p in &inner.points {
        match locate(p.x as f64, p.y as f64, ring, FillRule::NonZero) {
            Location::Inside => return true,
            Location::Outside => return false,
            Location::Boundary => continue,
        }
    }
    // Every vertex is on the outer boundary: fall back to an edge midpoint
    interior_sample(inner)
        .map(|(x, y)| locate(x, y, ring, FillRule::NonZero) == Location::Inside)
        .unwrap_or(false)
}

fn oriented(path: Path, counter_clockwise: bool) -> Path {
    if path.is_counter_clockwise() == counter_clockwise {
        path
    } else {
        path.reversed()
    }
}

/// Classify non-crossing closed rings into islands under `fill_rule`.
///
/// A ring is an exterior when the region is filled just inside it and empty
/// just outside, a hole for the reverse, and is dropped when it separates
/// nothing. Holes attach to the smallest exterior that contains them.
/// Rings that cross or overlap must be resolved by the clipper first.
pub(crate) fn build_islands(rings: &[Path], fill_rule: FillRule) -> Vec<Island> {
    let rings: Vec<&Path> = rings
        .iter()
        .filter(|r| r.closed && r.len() >= 3 && r.signed_area() != 0.0)
        .collect();
    let owned: Vec<Path> = rings.iter().map(|r| (*r).clone()).collect();

    let mut exteriors: Vec<Path> = Vec::new();
    let mut holes: Vec<Path> = Vec::new();
    for ring in &rings {
        let Some((sx, sy)) = interior_sample(ring) else {
            continue;
        };
        let inside: i32 = owned.iter().map(|r| winding_number(sx, sy, r)).sum();
        let own = if ring.signed_area() > 0.0 { 1 } else { -1 };
        let outside = inside - own;
        match (fill_rule.is_inside(inside), fill_rule.is_inside(outside)) {
            (true, false) => exteriors.push(oriented((*ring).clone(), true)),
            (false, true) => holes.push(oriented((*ring).clone(), false)),
            _ => {}
        }
    }

    let mut islands: Vec<Island> = exteriors
        .into_iter()
        .map(|exterior| Island {
            exterior,
            holes: Vec::new(),
        })
        .collect();
    for hole in holes {
        let parent = islands
            .iter()
            .enumerate()
            .filter(|(_, island)| ring_inside(&hole, &island.exterior))
            .min_by(|(_, a), (_, b)| {
                a.exterior
                    .signed_area()
                    .total_cmp(&b.exterior.signed_area())
            })
            .map(|(i, _)| i);
        match parent {
            Some(i) => islands[i].holes.push(hole),
            None => tracing::debug!("Dropping hole with no enclosing exterior"),
        }
    }
    islands
}

pub(crate) fn islands_to_paths(islands: Vec<Island>) -> Vec<Path> {
    islands
        .into_iter()
        .flat_map(|island| island.into_path_set().paths)
        .collect()
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
    fn test_winding_number() {
        let sq = square(0, 0, 100);
        assert_eq!(winding_number(50.0, 50.0, &sq), 1);
        assert_eq!(winding_number(50.0, 50.0, &sq.reversed()), -1);
        assert_eq!(winding_number(150.0, 50.0, &sq), 0);
    }

    #[test]
    fn test_locate() {
        let rings = vec![square(0, 0, 100)];
        assert_eq!(locate(50.0, 50.0, &rings, FillRule::NonZero), Location::Inside);
        assert_eq!(locate(100.0, 50.0, &rings, FillRule::NonZero), Location::Boundary);
        assert_eq!(locate(-1.0, 50.0, &rings, FillRule::NonZero), Location::Outside);
    }

    #[test]
    fn test_even_odd_same_orientation_hole() {
        // Both rings counter-clockwise: even-odd makes the inner one a hole
        let rings = vec![square(0, 0, 100), square(25, 25, 50)];
        let islands = build_islands(&rings, FillRule::EvenOdd);
        assert_eq!(islands.len(), 1);
        assert_eq!(islands[0].holes.len(), 1);
        assert!(!islands[0].holes[0].is_counter_clockwise());

        // Non-zero fills the inner ring, which then separates nothing
        let islands = build_islands(&rings, FillRule::NonZero);
        assert_eq!(islands.len(), 1);
        assert!(islands[0].holes.is_empty());
    }

    #[test]
    fn test_non_zero_opposite_orientation_hole() {
        let rings = vec![square(0, 0, 100).reversed(), square(25, 25, 50)];
        let islands = build_islands(&rings, FillRule::NonZero);
        assert_eq!(islands.len(), 1);
        assert!(islands[0].exterior.is_counter_clockwise());
        assert_eq!(islands[0].holes.len(), 1);
    }

    #[test]
    fn test_island_inside_hole() {
        let rings = vec![square(0, 0, 300), square(50, 50, 200), square(100, 100, 100)];
        let islands = build_islands(&rings, FillRule::EvenOdd);
        assert_eq!(islands.len(), 2);
        assert_eq!(islands[0].holes.len(), 1);
        assert!(islands[1].holes.is_empty());
    }

    #[test]
    fn test_geo_round_trip() {
        let rings = geo_to_rings(&rings_to_geo(&[square(0, 0, 100)]));
        assert_eq!(rings, vec![square(0, 0, 100)]);
    }
}
