use pathcam_core::{Path, Point};
use pathcam_designer::multipass::{MoveKind, MultiPassConfig, MultiPassPlanner, ToolMove};
use pathcam_designer::OperationParams;

fn planner(ramp: bool, cut_depth: f64) -> MultiPassPlanner {
    let params = OperationParams {
        cut_depth,
        pass_depth: 1.0,
        ramp,
        cut_feed: 600.0,
        plunge_feed: 120.0,
        ..OperationParams::default()
    };
    MultiPassPlanner::new(MultiPassConfig::from_params(&params, 5.0))
}

fn triangle() -> Path {
    Path::closed(vec![
        Point::new(0, 0),
        Point::new(700_000, 0),
        Point::new(300_000, 400_000),
    ])
}

fn assert_descends(moves: &[ToolMove]) {
    let mut deepest = f64::INFINITY;
    for m in moves.iter().filter(|m| m.kind != MoveKind::Rapid) {
        assert!(m.z <= deepest + 1e-9, "climbed back to {} after {}", m.z, deepest);
        deepest = deepest.min(m.z);
    }
}

#[test]
fn test_config_from_params() {
    let planner = planner(true, 2.5);
    let config = planner.config();
    assert_eq!(config.safe_z, 5.0);
    assert!(config.ramp);
    assert_eq!(config.pass_depths(-2.5), vec![-1.0, -2.0, -2.5]);
}

#[test]
fn test_ramp_monotonic_closed() {
    let moves = planner(true, 3.0).plan(&triangle(), false);
    assert_descends(&moves);
    let deepest = moves.iter().map(|m| m.z).fold(f64::INFINITY, f64::min);
    assert_eq!(deepest, -3.0);
    assert_eq!(moves.first().unwrap().kind, MoveKind::Rapid);
    assert_eq!(moves.last().unwrap().z, 5.0);
}

#[test]
fn test_ramp_monotonic_open() {
    let line = Path::open(vec![
        Point::new(0, 0),
        Point::new(150_000, 0),
        Point::new(150_000, 50_000),
    ]);
    let moves = planner(true, 2.0).plan(&line, false);
    assert_descends(&moves);
    assert!(moves.iter().any(|m| (m.z + 2.0).abs() < 1e-9));
}

#[test]
fn test_ramp_never_plunges_below_surface() {
    let moves = planner(true, 3.0).plan(&triangle(), false);
    for m in moves.iter().filter(|m| m.kind == MoveKind::Plunge) {
        assert_eq!(m.z, 0.0);
    }
}

#[test]
fn test_ramp_passes_cover_whole_ring_at_depth() {
    let moves = planner(true, 1.0).plan(&triangle(), false);
    let at_depth: Vec<(i64, i64)> = moves
        .iter()
        .filter(|m| m.kind == MoveKind::Cut && (m.z + 1.0).abs() < 1e-9)
        .map(|m| (m.x, m.y))
        .collect();
    for corner in triangle().points {
        assert!(at_depth.contains(&(corner.x, corner.y)));
    }
}

#[test]
fn test_path_z_sets_bottom() {
    let path = Path::open(vec![
        Point::with_z(0, 0, -1.5),
        Point::new(100_000, 0),
    ]);
    let moves = planner(false, 3.0).plan(&path, false);
    let plunges: Vec<f64> = moves
        .iter()
        .filter(|m| m.kind == MoveKind::Plunge)
        .map(|m| m.z)
        .collect();
    assert_eq!(plunges, vec![-1.0, -1.5]);
}
