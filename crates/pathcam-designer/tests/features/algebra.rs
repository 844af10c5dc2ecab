use pathcam_core::{FillRule, Path, PathSet, Point};
use pathcam_designer::algebra::{boolean_op, clean, features, offset, BooleanOp, JoinType};
use proptest::prelude::*;

fn square(x: i64, y: i64, size: i64) -> Path {
    Path::closed(vec![
        Point::new(x, y),
        Point::new(x + size, y),
        Point::new(x + size, y + size),
        Point::new(x, y + size),
    ])
}

fn area(set: &PathSet) -> f64 {
    set.iter().filter(|p| p.closed).map(Path::signed_area).sum()
}

#[test]
fn test_offset_round_trip_on_convex() {
    let set = PathSet::from_paths(vec![square(0, 0, 1_000_000)]);
    let grown = offset(&set, 100_000.0, JoinType::Round, 2.0);
    let back = offset(&grown, -100_000.0, JoinType::Round, 2.0);
    let b = back.bounds().unwrap();
    assert!(b.min_x.abs() <= 250 && b.min_y.abs() <= 250);
    assert!((b.max_x - 1_000_000).abs() <= 250 && (b.max_y - 1_000_000).abs() <= 250);
    assert!((area(&back) - 1e12).abs() / 1e12 < 0.01);
}

#[test]
fn test_union_and_intersection_areas() {
    let a = PathSet::from_paths(vec![square(0, 0, 1000)]);
    let b = PathSet::from_paths(vec![square(500, 500, 1000)]);

    let union = boolean_op(BooleanOp::Union, &a, &b);
    assert_eq!(union.len(), 1);
    assert_eq!(area(&union), 1_750_000.0);

    let both = boolean_op(BooleanOp::Intersection, &a, &b);
    assert_eq!(area(&both), 250_000.0);

    let xor = boolean_op(BooleanOp::Xor, &a, &b);
    assert_eq!(area(&xor), 1_500_000.0);
}

#[test]
fn test_difference_makes_hole() {
    let a = PathSet::from_paths(vec![square(0, 0, 1000)]);
    let b = PathSet::from_paths(vec![square(250, 250, 500)]);
    let ring = boolean_op(BooleanOp::Difference, &a, &b);
    assert_eq!(ring.len(), 2);
    assert!(ring.paths[0].is_counter_clockwise());
    assert!(!ring.paths[1].is_counter_clockwise());
    assert_eq!(area(&ring), 750_000.0);

    let islands = features(&ring);
    assert_eq!(islands.len(), 1);
    assert_eq!(islands[0].len(), 2);
}

#[test]
fn test_fill_rules_resolve_nested_rings() {
    let rings = vec![square(0, 0, 1000), square(250, 250, 500)];
    let even_odd = PathSet::from_paths(rings.clone()).with_fill_rule(FillRule::EvenOdd);
    assert_eq!(features(&even_odd)[0].len(), 2);

    let non_zero = PathSet::from_paths(rings);
    assert_eq!(features(&non_zero)[0].len(), 1);
}

#[test]
fn test_open_path_clipped_by_region() {
    let line = PathSet::from_paths(vec![Path::open(vec![Point::new(-500, 500), Point::new(1500, 500)])]);
    let region = PathSet::from_paths(vec![square(0, 0, 1000)]);

    let inside = boolean_op(BooleanOp::Intersection, &line, &region);
    assert_eq!(inside.len(), 1);
    assert_eq!(inside.paths[0].points, vec![Point::new(0, 500), Point::new(1000, 500)]);

    let outside = boolean_op(BooleanOp::Difference, &line, &region);
    assert_eq!(outside.len(), 2);
    assert!(outside.iter().all(|p| !p.closed));
}

#[test]
fn test_offset_keeps_z() {
    let ring = Path::closed(vec![
        Point::with_z(0, 0, -1.0),
        Point::with_z(1_000_000, 0, -1.0),
        Point::with_z(1_000_000, 1_000_000, -1.0),
        Point::with_z(0, 1_000_000, -1.0),
    ]);
    let inset = offset(&PathSet::from_paths(vec![ring]), -100_000.0, JoinType::Miter, 2.0);
    assert!(!inset.is_empty());
    assert!(inset.points().all(|p| p.z == Some(-1.0)));
}

fn arb_path() -> impl Strategy<Value = Path> {
    (
        prop::collection::vec((-2000i64..2000, -2000i64..2000), 1..12),
        any::<bool>(),
    )
        .prop_map(|(coords, closed)| {
            Path::new(
                coords.into_iter().map(|(x, y)| Point::new(x, y)).collect(),
                closed,
            )
        })
}

proptest! {
    #[test]
    fn clean_is_idempotent(paths in prop::collection::vec(arb_path(), 0..5), tolerance in 0.0f64..300.0) {
        let set = PathSet::from_paths(paths);
        let once = clean(&set, tolerance);
        let twice = clean(&once, tolerance);
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn offset_grows_square_bounds(size in 1000i64..1_000_000, grow in 100.0f64..50_000.0) {
        let set = PathSet::from_paths(vec![square(0, 0, size)]);
        let grown = offset(&set, grow, JoinType::Miter, 2.0);
        let b = grown.bounds().unwrap();
        let expected = grow.round() as i64;
        prop_assert!((b.min_x + expected).abs() <= 1);
        prop_assert!((b.max_x - size - expected).abs() <= 1);
    }
}
