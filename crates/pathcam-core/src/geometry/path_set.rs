use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Bounds, Path, Point};

/// How self-intersecting or overlapping rings are turned into a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillRule {
    /// Inside where the winding number is non-zero
    #[default]
    NonZero,
    /// Inside where the winding number is odd
    EvenOdd,
}

impl FillRule {
    /// Whether a winding number counts as inside.
    pub fn is_inside(&self, winding: i32) -> bool {
        match self {
            FillRule::NonZero => winding != 0,
            FillRule::EvenOdd => winding % 2 != 0,
        }
    }
}

/// An ordered collection of paths sharing one coordinate scale.
///
/// Order matters for cutting order within an operation; the algebra treats
/// it as a set. Serializes as a bare array of paths.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathSet {
    pub paths: Vec<Path>,
    pub fill_rule: FillRule,
}

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_paths(paths: Vec<Path>) -> Self {
        Self {
            paths,
            fill_rule: FillRule::default(),
        }
    }

    pub fn with_fill_rule(mut self, fill_rule: FillRule) -> Self {
        self.fill_rule = fill_rule;
        self
    }

    pub fn push(&mut self, path: Path) {
        self.paths.push(path);
    }

    pub fn extend(&mut self, other: PathSet) {
        self.paths.extend(other.paths);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Path> {
        self.paths.iter()
    }

    /// Every vertex in path-then-vertex order.
    pub fn points(&self) -> impl Iterator<Item = &Point> {
        self.paths.iter().flat_map(|p| p.points.iter())
    }

    pub fn vertex_count(&self) -> usize {
        self.paths.iter().map(Path::len).sum()
    }

    /// 2D bounds over all paths.
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(self.points())
    }

    /// True when any vertex carries Z.
    pub fn has_z(&self) -> bool {
        self.points().any(|p| p.z.is_some())
    }

    /// Closed paths only, keeping the fill rule.
    pub fn closed_paths(&self) -> PathSet {
        PathSet {
            paths: self.paths.iter().filter(|p| p.closed).cloned().collect(),
            fill_rule: self.fill_rule,
        }
    }

    /// Open paths only, keeping the fill rule.
    pub fn open_paths(&self) -> PathSet {
        PathSet {
            paths: self.paths.iter().filter(|p| !p.closed).cloned().collect(),
            fill_rule: self.fill_rule,
        }
    }

    /// Parse the JSON array-of-paths form.
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Render the JSON array-of-paths form.
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl From<Vec<Path>> for PathSet {
    fn from(paths: Vec<Path>) -> Self {
        PathSet::from_paths(paths)
    }
}

impl FromIterator<Path> for PathSet {
    fn from_iter<I: IntoIterator<Item = Path>>(iter: I) -> Self {
        PathSet::from_paths(iter.into_iter().collect())
    }
}

impl IntoIterator for PathSet {
    type Item = Path;
    type IntoIter = std::vec::IntoIter<Path>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.into_iter()
    }
}

impl<'a> IntoIterator for &'a PathSet {
    type Item = &'a Path;
    type IntoIter = std::slice::Iter<'a, Path>;

    fn into_iter(self) -> Self::IntoIter {
        self.paths.iter()
    }
}

impl Serialize for PathSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.paths.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PathSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<Path>::deserialize(deserializer).map(PathSet::from_paths)
    }
}
