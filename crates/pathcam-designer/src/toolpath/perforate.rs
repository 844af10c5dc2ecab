//! Splitting a path into alternating cut and gap runs.

use pathcam_core::{Path, Point};

/// Smallest advance along the path, in fixed-point units.
const MIN_STEP: f64 = 1e-6;

fn push_distinct(run: &mut Vec<Point>, p: Point) {
    if run.last() != Some(&p) {
        run.push(p);
    }
}

fn flush(run: &mut Vec<Point>, runs: &mut Vec<Vec<Point>>) {
    if run.len() >= 2 {
        runs.push(std::mem::take(run));
    } else {
        run.clear();
    }
}

/// Cut runs `width` long repeating every `spacing` along `path`, both in
/// fixed-point units, starting with a cut at the first vertex.
///
/// Runs are open paths. On a closed path a run still cutting when the loop
/// returns to the start is joined to the first run across the seam.
pub(crate) fn perforate(path: &Path, spacing: f64, width: f64) -> Vec<Path> {
    if spacing <= 0.0 || width <= 0.0 || width >= spacing {
        return vec![path.clone()];
    }

    let mut runs: Vec<Vec<Point>> = Vec::new();
    let mut run: Vec<Point> = Vec::new();
    let mut travelled = 0.0;

    for (a, b) in path.edges() {
        let len = a.distance(&b);
        if len == 0.0 {
            continue;
        }
        let end = travelled + len;
        let mut pos = travelled;
        while pos < end {
            let base = (pos / spacing).floor() * spacing;
            let phase = pos - base;
            let cutting = phase < width;
            let boundary = if cutting { base + width } else { base + spacing };
            let next = boundary.max(pos + MIN_STEP).min(end);
            if cutting {
                push_distinct(&mut run, a.lerp(&b, (pos - travelled) / len));
                push_distinct(&mut run, a.lerp(&b, (next - travelled) / len));
            } else {
                flush(&mut run, &mut runs);
            }
            pos = next;
        }
        travelled = end;
    }

    // Join across the seam: the first run always starts at the first vertex
    if path.closed && run.len() >= 2 && !runs.is_empty() {
        let first = runs.remove(0);
        run.extend(first.into_iter().skip(1));
        runs.insert(0, run);
    } else {
        flush(&mut run, &mut runs);
    }

    runs.into_iter().map(Path::open).collect()
}
