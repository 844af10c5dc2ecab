use serde::{Deserialize, Serialize};

use super::Point;

/// Axis-aligned XY bounds in fixed-point units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub min_x: i64,
    pub min_y: i64,
    pub max_x: i64,
    pub max_y: i64,
}

impl Bounds {
    /// Bounds of a single point.
    pub fn from_point(p: &Point) -> Self {
        Self {
            min_x: p.x,
            min_y: p.y,
            max_x: p.x,
            max_y: p.y,
        }
    }

    /// Bounds covering all of `points`, or `None` when empty.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        Some(iter.fold(Bounds::from_point(first), |b, p| b.include(p)))
    }

    /// Grow to include `p`.
    pub fn include(self, p: &Point) -> Self {
        Self {
            min_x: self.min_x.min(p.x),
            min_y: self.min_y.min(p.y),
            max_x: self.max_x.max(p.x),
            max_y: self.max_y.max(p.y),
        }
    }

    /// Smallest bounds covering both.
    pub fn union(self, other: Bounds) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Grow every side by `amount` units.
    pub fn expand(self, amount: i64) -> Self {
        Self {
            min_x: self.min_x - amount,
            min_y: self.min_y - amount,
            max_x: self.max_x + amount,
            max_y: self.max_y + amount,
        }
    }

    pub fn width(&self) -> i64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> i64 {
        self.max_y - self.min_y
    }

    /// Centre point, rounded toward negative infinity.
    pub fn center(&self) -> Point {
        Point::new(
            self.min_x + self.width().div_euclid(2),
            self.min_y + self.height().div_euclid(2),
        )
    }

    pub fn contains(&self, p: &Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }
}

/// Range of defined Z values, in millimetres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZRange {
    pub min: f64,
    pub max: f64,
}

/// XY bounds plus the Z range when any vertex carries Z.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds3 {
    pub xy: Bounds,
    pub z: Option<ZRange>,
}

/// An ordered polyline, optionally closed back to its first point.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Path {
    pub points: Vec<Point>,
    #[serde(default)]
    pub closed: bool,
}

impl Path {
    pub fn new(points: Vec<Point>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// An open polyline.
    pub fn open(points: Vec<Point>) -> Self {
        Self::new(points, false)
    }

    /// A closed ring; the closing edge is implicit.
    pub fn closed(points: Vec<Point>) -> Self {
        Self::new(points, true)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&Point> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&Point> {
        self.points.last()
    }

    /// 2D bounding box.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.points)
    }

    /// 3D bounding box.
    pub fn bounds3(&self) -> Option<Bounds3> {
        let xy = self.bounds()?;
        let z = self.z_range();
        Some(Bounds3 { xy, z })
    }

    /// Range of the Z values that are set.
    pub fn z_range(&self) -> Option<ZRange> {
        self.points.iter().filter_map(|p| p.z).fold(None, |acc, z| {
            Some(match acc {
                None => ZRange { min: z, max: z },
                Some(r) => ZRange {
                    min: r.min.min(z),
                    max: r.max.max(z),
                },
            })
        })
    }

    /// Lowest Z on the path, if any vertex has one.
    pub fn min_z(&self) -> Option<f64> {
        self.z_range().map(|r| r.min)
    }

    /// True when the path is non-empty and every vertex carries Z.
    pub fn has_full_z(&self) -> bool {
        !self.points.is_empty() && self.points.iter().all(|p| p.z.is_some())
    }

    /// Same path traversed backwards; the closed flag is kept.
    pub fn reversed(&self) -> Path {
        let mut points = self.points.clone();
        points.reverse();
        Path::new(points, self.closed)
    }

    /// Edges in travel order, including the closing edge of a closed path.
    pub fn edges(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let n = self.points.len();
        let count = match (self.closed, n) {
            (_, 0) | (_, 1) => 0,
            (true, _) => n,
            (false, _) => n - 1,
        };
        (0..count).map(move |i| (self.points[i], self.points[(i + 1) % n]))
    }

    /// Total travel length in fixed-point units.
    pub fn length(&self) -> f64 {
        self.edges().map(|(a, b)| a.distance(&b)).sum()
    }

    /// Signed area in square units; positive for counter-clockwise rings.
    ///
    /// Open paths are treated as if closed.
    pub fn signed_area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let twice: i128 = (0..n)
            .map(|i| {
                let a = &self.points[i];
                let b = &self.points[(i + 1) % n];
                a.x as i128 * b.y as i128 - b.x as i128 * a.y as i128
            })
            .sum();
        twice as f64 / 2.0
    }

    pub fn is_counter_clockwise(&self) -> bool {
        self.signed_area() > 0.0
    }

    /// Fill in Z on every vertex that lacks one.
    pub fn with_default_z(mut self, z: f64) -> Path {
        for p in &mut self.points {
            if p.z.is_none() {
                p.z = Some(z);
            }
        }
        self
    }

    /// Drop every Z value.
    pub fn without_z(mut self) -> Path {
        for p in &mut self.points {
            p.z = None;
        }
        self
    }
}
