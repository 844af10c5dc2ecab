use serde::de::{self, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

use super::{from_fixed, to_fixed};

/// A vertex in fixed-point XY with an optional Z in millimetres.
///
/// Equality and hashing look at X and Y only; two vertices at the same
/// position but different depths are the same vertex.
#[derive(Debug, Clone, Copy, Default)]
pub struct Point {
    pub x: i64,
    pub y: i64,
    pub z: Option<f64>,
}

impl Point {
    /// Creates a point with no Z.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y, z: None }
    }

    /// Creates a point with a Z value.
    pub const fn with_z(x: i64, y: i64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }

    /// Creates a point from millimetre coordinates.
    pub fn from_mm(x: f64, y: f64) -> Self {
        Self::new(to_fixed(x), to_fixed(y))
    }

    /// X and Y in millimetres.
    pub fn to_mm(&self) -> (f64, f64) {
        (from_fixed(self.x), from_fixed(self.y))
    }

    /// Same position with Z replaced.
    pub fn at_z(self, z: Option<f64>) -> Self {
        Self { z, ..self }
    }

    /// Squared distance in fixed-point units, exact.
    pub fn distance_squared(&self, other: &Point) -> i128 {
        let dx = (other.x - self.x) as i128;
        let dy = (other.y - self.y) as i128;
        dx * dx + dy * dy
    }

    /// Euclidean distance in fixed-point units.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.distance_squared(other) as f64).sqrt()
    }

    /// Point at parameter `t` along `self -> other`, rounded to the grid.
    ///
    /// Z is interpolated when both ends carry one, otherwise the defined
    /// end's Z is used.
    pub fn lerp(&self, other: &Point, t: f64) -> Point {
        let x = self.x as f64 + (other.x - self.x) as f64 * t;
        let y = self.y as f64 + (other.y - self.y) as f64 * t;
        let z = match (self.z, other.z) {
            (Some(a), Some(b)) => Some(a + (b - a) * t),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        Point {
            x: x.round() as i64,
            y: y.round() as i64,
            z,
        }
    }

    /// Returns true if both points share X and Y and their Z values agree.
    pub fn same_position(&self, other: &Point) -> bool {
        self == other && self.z == other.z
    }
}

impl PartialEq for Point {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl Eq for Point {}

impl Hash for Point {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.x.hash(state);
        self.y.hash(state);
    }
}

impl From<(i64, i64)> for Point {
    fn from((x, y): (i64, i64)) -> Self {
        Point::new(x, y)
    }
}

impl From<(i64, i64, f64)> for Point {
    fn from((x, y, z): (i64, i64, f64)) -> Self {
        Point::with_z(x, y, z)
    }
}

// Points travel as `[x, y]` or `[x, y, z]`.
impl Serialize for Point {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.z.is_some() { 3 } else { 2 };
        let mut seq = serializer.serialize_seq(Some(len))?;
        seq.serialize_element(&self.x)?;
        seq.serialize_element(&self.y)?;
        if let Some(z) = self.z {
            seq.serialize_element(&z)?;
        }
        seq.end()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Int(i64),
    Float(f64),
}

impl Coordinate {
    fn fixed(self) -> i64 {
        match self {
            Coordinate::Int(v) => v,
            Coordinate::Float(v) => v.round() as i64,
        }
    }

    fn float(self) -> f64 {
        match self {
            Coordinate::Int(v) => v as f64,
            Coordinate::Float(v) => v,
        }
    }
}

struct PointVisitor;

impl<'de> Visitor<'de> for PointVisitor {
    type Value = Point;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array [x, y] or [x, y, z]")
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Point, A::Error> {
        let x: Coordinate = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(0, &self))?;
        let y: Coordinate = seq
            .next_element()?
            .ok_or_else(|| de::Error::invalid_length(1, &self))?;
        let z: Option<Coordinate> = seq.next_element()?;
        if seq.next_element::<de::IgnoredAny>()?.is_some() {
            return Err(de::Error::invalid_length(4, &self));
        }
        Ok(Point {
            x: x.fixed(),
            y: y.fixed(),
            z: z.map(Coordinate::float),
        })
    }
}

impl<'de> Deserialize<'de> for Point {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_seq(PointVisitor)
    }
}
