use pathcam_core::{Path, PathSet, Point};
use pathcam_designer::toolpath::{generate_toolpath, Strategy, ToolpathStrategy};
use pathcam_designer::{CutDirection, OperationKind, OperationParams};

fn square(size: i64) -> Path {
    Path::closed(vec![
        Point::new(0, 0),
        Point::new(size, 0),
        Point::new(size, size),
        Point::new(0, size),
    ])
}

fn distance_to_segment(p: (f64, f64), a: &Point, b: &Point) -> f64 {
    let (ax, ay) = (a.x as f64, a.y as f64);
    let (dx, dy) = (b.x as f64 - ax, b.y as f64 - ay);
    let len2 = dx * dx + dy * dy;
    let t = if len2 == 0.0 {
        0.0
    } else {
        (((p.0 - ax) * dx + (p.1 - ay) * dy) / len2).clamp(0.0, 1.0)
    };
    ((p.0 - ax - dx * t).powi(2) + (p.1 - ay - dy * t).powi(2)).sqrt()
}

fn distance_to_paths(p: (f64, f64), paths: &PathSet) -> f64 {
    paths
        .iter()
        .flat_map(|path| {
            let single = path
                .first()
                .filter(|_| path.len() == 1)
                .map(|a| distance_to_segment(p, a, a));
            path.edges()
                .map(move |(a, b)| distance_to_segment(p, &a, &b))
                .chain(single)
        })
        .fold(f64::INFINITY, f64::min)
}

#[test]
fn test_drill_two_vertices() {
    let operand = PathSet::from_paths(vec![Path::open(vec![
        Point::new(0, 0),
        Point::new(100_000, 0),
    ])]);
    let toolpath = generate_toolpath(OperationKind::Drill, &operand, &OperationParams::default());
    assert_eq!(toolpath.paths.len(), 2);
    assert_eq!(toolpath.paths.paths[0].points, vec![Point::new(0, 0)]);
    assert_eq!(toolpath.paths.paths[1].points, vec![Point::new(100_000, 0)]);
}

#[test]
fn test_drill_keeps_vertex_order() {
    let operand = PathSet::from_paths(vec![square(1000), Path::open(vec![Point::new(5, 5)])]);
    let toolpath = generate_toolpath(OperationKind::Drill, &operand, &OperationParams::default());
    let sites: Vec<Point> = toolpath.paths.points().copied().collect();
    let expected: Vec<Point> = operand.points().copied().collect();
    assert_eq!(sites, expected);
}

#[test]
fn test_engrave_square_unchanged() {
    let operand = PathSet::from_paths(vec![square(1000)]);
    let toolpath = generate_toolpath(OperationKind::Engrave, &operand, &OperationParams::default());
    assert_eq!(toolpath.paths, operand);
}

#[test]
fn test_empty_operand_gives_empty_toolpath() {
    for kind in [
        OperationKind::Drill,
        OperationKind::Engrave,
        OperationKind::Inside,
        OperationKind::Outside,
        OperationKind::Perforate,
        OperationKind::AnnularPocket,
        OperationKind::RasterPocket,
    ] {
        let toolpath = generate_toolpath(kind, &PathSet::new(), &OperationParams::default());
        assert!(toolpath.is_empty(), "{}", kind);
        assert_eq!(toolpath.skipped_features, 0);
    }
}

#[test]
fn test_inside_climb_keeps_counter_clockwise() {
    let operand = PathSet::from_paths(vec![square(1_000_000)]);
    let params = OperationParams {
        direction: CutDirection::Climb,
        ..OperationParams::default()
    };
    let toolpath = generate_toolpath(OperationKind::Inside, &operand, &params);
    assert!(toolpath.paths.paths[0].is_counter_clockwise());
}

#[test]
fn test_pocket_coverage() {
    // 10 mm square, 2 mm tool, 0.4 step-over
    let operand = PathSet::from_paths(vec![square(1_000_000)]);
    let params = OperationParams {
        tool_diameter: 2.0,
        step_over: 0.4,
        ..OperationParams::default()
    };
    let radius = params.tool_radius_fixed();
    let strip = params.step_fixed();

    for kind in [OperationKind::AnnularPocket, OperationKind::RasterPocket] {
        let toolpath = generate_toolpath(kind, &operand, &params);
        assert!(!toolpath.is_empty());

        let mut y = strip;
        while y <= 1_000_000.0 - strip {
            let mut x = strip;
            while x <= 1_000_000.0 - strip {
                let d = distance_to_paths((x, y), &toolpath.paths);
                assert!(d <= radius + 1.0, "{} misses ({}, {}) by {}", kind, x, y, d);
                x += 20_000.0;
            }
            y += 20_000.0;
        }
    }
}

#[test]
fn test_pocket_with_hole_avoids_it() {
    let hole = Path::closed(vec![
        Point::new(400_000, 400_000),
        Point::new(400_000, 600_000),
        Point::new(600_000, 600_000),
        Point::new(600_000, 400_000),
    ]);
    let operand = PathSet::from_paths(vec![square(1_000_000), hole]);
    let params = OperationParams {
        tool_diameter: 1.0,
        step_over: 0.5,
        ..OperationParams::default()
    };
    let toolpath = generate_toolpath(OperationKind::RasterPocket, &operand, &params);
    let d = distance_to_paths((500_000.0, 500_000.0), &toolpath.paths);
    assert!(d >= 100_000.0 + params.tool_radius_fixed() - 1.0);
}

#[test]
fn test_preview_bloat_matches_preview() {
    let operand = PathSet::from_paths(vec![square(1_000_000)]);
    let params = OperationParams {
        tool_diameter: 2.0,
        ..OperationParams::default()
    };
    for kind in [
        OperationKind::Drill,
        OperationKind::Engrave,
        OperationKind::Inside,
        OperationKind::Outside,
        OperationKind::AnnularPocket,
        OperationKind::RasterPocket,
    ] {
        let strategy = Strategy::for_kind(kind);
        let preview = strategy.preview_geometry(&operand, &params);
        let bloat = (strategy.preview_bloat(params.tool_diameter) * 100_000.0).round() as i64;
        let b = preview.bounds().unwrap();
        assert!((b.max_x - 1_000_000 - bloat).abs() <= 1_000, "{}: {}", kind, b.max_x);
        assert!((b.min_x + bloat).abs() <= 1_000, "{}: {}", kind, b.min_x);
    }
}
