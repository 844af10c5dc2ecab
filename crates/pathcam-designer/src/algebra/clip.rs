//! Clipping open polylines against a closed region.
//!
//! Each segment is split wherever it meets a region edge and every piece is
//! classified by its midpoint. Pieces lying on the boundary count as inside.

use pathcam_core::{FillRule, Path, Point};

use super::region::{locate, Location};

const PARAM_EPSILON: f64 = 1e-12;

fn cross(ax: i128, ay: i128, bx: i128, by: i128) -> i128 {
    ax * by - ay * bx
}

/// Push the parameters along `a -> b` where it meets edge `c -> d`.
fn push_crossings(a: &Point, b: &Point, c: &Point, d: &Point, params: &mut Vec<f64>) {
    let (rx, ry) = ((b.x - a.x) as i128, (b.y - a.y) as i128);
    let (sx, sy) = ((d.x - c.x) as i128, (d.y - c.y) as i128);
    let (qx, qy) = ((c.x - a.x) as i128, (c.y - a.y) as i128);
    let denom = cross(rx, ry, sx, sy);

    if denom == 0 {
        // Parallel: only collinear overlaps split the segment
        if cross(qx, qy, rx, ry) != 0 {
            return;
        }
        let rr = rx * rx + ry * ry;
        if rr == 0 {
            return;
        }
        let (ex, ey) = ((d.x - a.x) as i128, (d.y - a.y) as i128);
        for dot in [qx * rx + qy * ry, ex * rx + ey * ry] {
            let t = dot as f64 / rr as f64;
            if t > 0.0 && t < 1.0 {
                params.push(t);
            }
        }
        return;
    }

    let t = cross(qx, qy, sx, sy) as f64 / denom as f64;
    let u = cross(qx, qy, rx, ry) as f64 / denom as f64;
    if (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u) {
        params.push(t);
    }
}

/// Pieces of `a -> b` as parameter intervals, each tagged inside/outside.
fn classify_segment(
    a: &Point,
    b: &Point,
    region: &[Path],
    fill_rule: FillRule,
) -> Vec<(f64, f64, bool)> {
    let mut params = vec![0.0, 1.0];
    for ring in region {
        for (c, d) in ring.edges() {
            push_crossings(a, b, &c, &d, &mut params);
        }
    }
    params.sort_by(f64::total_cmp);
    params.dedup_by(|x, y| (*x - *y).abs() <= PARAM_EPSILON);

    params
        .windows(2)
        .filter(|w| w[1] - w[0] > PARAM_EPSILON)
        .map(|w| {
            let t = (w[0] + w[1]) / 2.0;
            let mx = a.x as f64 + (b.x - a.x) as f64 * t;
            let my = a.y as f64 + (b.y - a.y) as f64 * t;
            let inside = locate(mx, my, region, fill_rule) != Location::Outside;
            (w[0], w[1], inside)
        })
        .collect()
}

/// Clip `path` against `region`, keeping the parts inside (or outside).
///
/// Runs come back in travel order; Z is interpolated at new vertices.
pub(crate) fn clip_path(
    path: &Path,
    region: &[Path],
    fill_rule: FillRule,
    keep_inside: bool,
) -> Vec<Path> {
    fn flush(current: &mut Vec<Point>, runs: &mut Vec<Path>) {
        if current.len() >= 2 {
            runs.push(Path::open(std::mem::take(current)));
        } else {
            current.clear();
        }
    }

    let mut runs = Vec::new();
    let mut current: Vec<Point> = Vec::new();

    for (a, b) in path.edges() {
        for (t0, t1, inside) in classify_segment(&a, &b, region, fill_rule) {
            if inside != keep_inside {
                flush(&mut current, &mut runs);
                continue;
            }
            let start = a.lerp(&b, t0);
            let end = a.lerp(&b, t1);
            if current.last() != Some(&start) {
                flush(&mut current, &mut runs);
                current.push(start);
            }
            if current.last() != Some(&end) {
                current.push(end);
            }
        }
    }
    flush(&mut current, &mut runs);
    runs
}

/// True when the straight move `a -> b` never leaves `region`.
pub(crate) fn segment_inside(a: &Point, b: &Point, region: &[Path], fill_rule: FillRule) -> bool {
    if a == b {
        return locate(a.x as f64, a.y as f64, region, fill_rule) != Location::Outside;
    }
    classify_segment(a, b, region, fill_rule)
        .iter()
        .all(|(_, _, inside)| *inside)
}
