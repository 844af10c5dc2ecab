//! Z re-derivation for vertices synthesized by the algebra.

use std::collections::HashMap;

use pathcam_core::{Path, PathSet, Point};

struct SourceEdge {
    a: Point,
    b: Point,
}

impl SourceEdge {
    /// Squared distance to `p` and the Z at the closest point, if any.
    fn project(&self, p: &Point) -> (f64, Option<f64>) {
        let (ax, ay) = (self.a.x as f64, self.a.y as f64);
        let (dx, dy) = (self.b.x as f64 - ax, self.b.y as f64 - ay);
        let len2 = dx * dx + dy * dy;
        let t = if len2 == 0.0 {
            0.0
        } else {
            (((p.x as f64 - ax) * dx + (p.y as f64 - ay) * dy) / len2).clamp(0.0, 1.0)
        };
        let (qx, qy) = (ax + dx * t, ay + dy * t);
        let dist2 = (p.x as f64 - qx).powi(2) + (p.y as f64 - qy).powi(2);
        let z = match (self.a.z, self.b.z) {
            (Some(za), Some(zb)) => Some(za + (zb - za) * t),
            (Some(z), None) | (None, Some(z)) => Some(z),
            (None, None) => None,
        };
        (dist2, z)
    }
}

/// Give every Z-less vertex of `paths` a Z derived from `sources`.
///
/// A vertex sitting on a source vertex takes that vertex's Z; any other
/// vertex is projected onto the nearest source edge and interpolated along
/// it. Nothing changes when no source vertex carries Z.
pub(crate) fn restore_z(paths: &mut [Path], sources: &[&PathSet]) {
    let mut exact: HashMap<(i64, i64), f64> = HashMap::new();
    let mut edges: Vec<SourceEdge> = Vec::new();
    for set in sources {
        for path in set.iter() {
            for p in &path.points {
                if let Some(z) = p.z {
                    exact.entry((p.x, p.y)).or_insert(z);
                }
            }
            edges.extend(
                path.edges()
                    .filter(|(a, b)| a.z.is_some() || b.z.is_some())
                    .map(|(a, b)| SourceEdge { a, b }),
            );
            // Lone vertices still anchor a Z value
            if path.len() == 1 && path.points[0].z.is_some() {
                let p = path.points[0];
                edges.push(SourceEdge { a: p, b: p });
            }
        }
    }
    if exact.is_empty() {
        return;
    }

    for path in paths.iter_mut() {
        for p in path.points.iter_mut().filter(|p| p.z.is_none()) {
            if let Some(z) = exact.get(&(p.x, p.y)) {
                p.z = Some(*z);
                continue;
            }
            p.z = edges
                .iter()
                .map(|edge| edge.project(p))
                .filter(|(_, z)| z.is_some())
                .min_by(|(d1, _), (d2, _)| d1.total_cmp(d2))
                .and_then(|(_, z)| z);
        }
    }
}
