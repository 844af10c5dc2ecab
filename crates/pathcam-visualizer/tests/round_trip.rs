//! Programs written by the emitter read back to the motions that were planned

use pathcam_core::{Path, PathSet, Point, Units};
use pathcam_designer::{
    emit_program, generate_toolpath, GcodeEmitter, JobParams, MoveKind, MultiPassConfig,
    MultiPassPlanner, Operation, OperationKind, OperationParams, OriginMode, OutputMapping,
};
use pathcam_visualizer::{parse_program, BackfillPolicy, ProgramParser, ProgramStats, Waypoint};
use proptest::prelude::*;

const TOLERANCE: f64 = 1e-3;

fn square_mm(x: f64, y: f64, size: f64) -> PathSet {
    PathSet::from_paths(vec![Path::closed(vec![
        Point::from_mm(x, y),
        Point::from_mm(x + size, y),
        Point::from_mm(x + size, y + size),
        Point::from_mm(x, y + size),
    ])])
}

fn operations() -> Vec<Operation> {
    let params = OperationParams {
        tool_diameter: 2.0,
        cut_depth: 1.5,
        pass_depth: 0.5,
        cut_feed: 450.0,
        plunge_feed: 90.0,
        ..OperationParams::default()
    };
    vec![
        Operation::new(
            "holes",
            OperationKind::Drill,
            PathSet::from_paths(vec![Path::open(vec![
                Point::from_mm(2.0, 2.0),
                Point::from_mm(28.0, 2.0),
            ])]),
            params.clone(),
        )
        .unwrap(),
        Operation::new(
            "pocket",
            OperationKind::AnnularPocket,
            square_mm(5.0, 5.0, 8.0),
            params.clone(),
        )
        .unwrap(),
        Operation::new(
            "outline",
            OperationKind::Outside,
            square_mm(0.0, 0.0, 30.0),
            OperationParams {
                ramp: true,
                ..params
            },
        )
        .unwrap(),
    ]
}

fn close(waypoint: &Waypoint, target: [f64; 3]) -> bool {
    (waypoint.x - target[0]).abs() < TOLERANCE
        && (waypoint.y - target[1]).abs() < TOLERANCE
        && (waypoint.z - target[2]).abs() < TOLERANCE
}

/// Walk the planned moves of every operation and find each one, in order,
/// among the parsed waypoints.
fn assert_round_trip(ops: &[Operation], job: &JobParams, mapping: &OutputMapping) {
    let lines = emit_program(ops, job).unwrap();
    let waypoints = parse_program(&lines);
    assert!(!waypoints.is_empty());

    let mut at = 0;
    for op in ops {
        let toolpath = generate_toolpath(op.kind, &op.operand, &op.params);
        let planner = MultiPassPlanner::new(MultiPassConfig::from_params(&op.params, job.safe_z));
        for path in toolpath.paths.iter() {
            for m in planner.plan(path, toolpath.generates_z) {
                let target = mapping.map(m.x, m.y, m.z);
                let found = waypoints[at..]
                    .iter()
                    .position(|w| close(w, target))
                    .map(|offset| at + offset)
                    .unwrap_or_else(|| panic!("{}: {:?} not found after {}", op.name, m, at));

                let w = &waypoints[found];
                assert!(w.spindle_on);
                assert_eq!(w.spindle_speed, job.spindle_rpm);
                if m.kind != MoveKind::Rapid && found > at {
                    // A feed move is one line, so it is the very next waypoint
                    assert_eq!(found, at + 1, "{}: {:?}", op.name, m);
                    assert!(!w.rapid);
                    let feed = match m.kind {
                        MoveKind::Plunge => op.params.plunge_feed,
                        _ => op.params.cut_feed,
                    };
                    assert!((w.f - feed).abs() < TOLERANCE, "{}: feed {} for {:?}", op.name, w.f, m);
                }
                at = found;
            }
        }
    }

    let last = waypoints.last().unwrap();
    assert!(!last.spindle_on);
    assert_eq!((last.x, last.y), (0.0, 0.0));
    assert!((last.z - mapping.map_z(job.safe_z)).abs() < TOLERANCE);
}

#[test]
fn test_round_trip_absolute_mm() {
    let job = JobParams::default();
    let mapping = OutputMapping::for_job(&job, None);
    assert_round_trip(&operations(), &job, &mapping);
}

#[test]
fn test_round_trip_inch_with_offsets() {
    let job = JobParams {
        units: Units::Inch,
        top_z: 2.0,
        x_offset: 10.0,
        y_offset: -5.0,
        spindle_rpm: 18000.0,
        ..JobParams::default()
    };
    let mapping = OutputMapping::for_job(&job, None);
    assert_round_trip(&operations(), &job, &mapping);
}

#[test]
fn test_parses_without_diagnostics() {
    let lines = emit_program(&operations(), &JobParams::default()).unwrap();
    let program = ProgramParser::new().parse(&lines);
    assert!(program.diagnostics.is_empty(), "{:?}", program.diagnostics);
}

#[test]
fn test_policies_agree_after_first_assignment() {
    let lines = emit_program(&operations(), &JobParams::default()).unwrap();
    let zero = ProgramParser::with_policy(BackfillPolicy::Zero).parse(&lines);
    let later = ProgramParser::with_policy(BackfillPolicy::FirstLaterValue).parse(&lines);
    assert_eq!(zero.waypoints.len(), later.waypoints.len());
    // Only the opening retract precedes the first XY and feed assignment
    assert_eq!(zero.waypoints[2..], later.waypoints[2..]);
}

#[test]
fn test_stats_of_emitted_program() {
    let lines = emit_program(&operations(), &JobParams::default()).unwrap();
    let stats = ProgramStats::from_waypoints(&parse_program(&lines));
    assert!(stats.cutting_distance > 4.0 * 32.0);
    assert!(stats.rapid_distance > 0.0);
    let max = stats.max.unwrap();
    let min = stats.min.unwrap();
    assert_eq!(max[2], 5.0);
    assert_eq!(min[2], -1.5);
    assert!(min[0] >= -1.0 - TOLERANCE && max[0] <= 31.0 + TOLERANCE);
}

#[test]
fn test_center_origin_centres_cut_area() {
    let job = JobParams {
        origin: OriginMode::Center,
        ..JobParams::default()
    };
    let lines = emit_program(&operations(), &job).unwrap();
    let stats = ProgramStats::from_waypoints(&parse_program(&lines));
    let (min, max) = (stats.min.unwrap(), stats.max.unwrap());
    // The outline keeps the tool one radius outside the 30 mm square
    assert!((min[0] + 16.0).abs() < 0.05, "{}", min[0]);
    assert!((max[0] - 16.0).abs() < 0.05, "{}", max[0]);
}

proptest! {
    #[test]
    fn emitted_motions_parse_back(
        moves in prop::collection::vec(
            (any::<bool>(), -1000i32..1000, -1000i32..1000, -50i32..50, 1u32..2000),
            1..30,
        )
    ) {
        let mut emitter = GcodeEmitter::new(OutputMapping::for_job(&JobParams::default(), None), 4);
        emitter.motion(true, [Some(0.0), Some(0.0), Some(5.0)], None);

        // Moves that change the position, with the motion kind and feed that reached it
        let mut expected: Vec<([f64; 3], bool, f64)> = Vec::new();
        let mut position = [0.0, 0.0, 5.0];
        for (rapid, x, y, z, feed) in moves {
            let target = [x as f64 / 10.0, y as f64 / 10.0, z as f64 / 10.0];
            let feed = feed as f64;
            emitter.motion(rapid, [Some(target[0]), Some(target[1]), Some(target[2])], Some(feed));
            if target != position {
                expected.push((target, rapid, feed));
                position = target;
            }
        }

        let lines = emitter.finish();
        let waypoints = parse_program(&lines);
        prop_assert_eq!(waypoints.len(), expected.len() + 1);
        for (w, (target, rapid, feed)) in waypoints[1..].iter().zip(&expected) {
            prop_assert!(close(w, *target));
            prop_assert_eq!(w.rapid, *rapid);
            if !rapid {
                prop_assert_eq!(w.f, *feed);
            }
        }
    }
}
