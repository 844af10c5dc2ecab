use std::collections::HashMap;

use pathcam_core::{Path, PathSet, Point, Units};
use pathcam_designer::{
    emit_program, JobParams, Operation, OperationKind, OperationParams, OriginMode,
};

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
        cut_depth: 2.0,
        pass_depth: 1.0,
        ..OperationParams::default()
    };
    vec![
        Operation::new("pocket", OperationKind::RasterPocket, square_mm(5.0, 5.0, 10.0), params.clone())
            .unwrap(),
        Operation::new(
            "outline",
            OperationKind::Outside,
            square_mm(0.0, 0.0, 20.0),
            OperationParams {
                ramp: true,
                ..params
            },
        )
        .unwrap(),
    ]
}

/// Every motion word must change the value last written for its letter.
fn assert_minimal(lines: &[String]) {
    let mut last: HashMap<char, String> = HashMap::new();
    let mut previous: Option<&String> = None;
    for line in lines {
        assert_ne!(Some(line), previous, "repeated line {}", line);
        previous = Some(line);
        if !(line.starts_with("G0 ") || line.starts_with("G1 ")) {
            continue;
        }
        let words: Vec<&str> = line.split_whitespace().skip(1).collect();
        assert!(!words.is_empty(), "empty motion line");
        for word in words {
            let mut chars = word.chars();
            let letter = chars.next().unwrap();
            let value: String = chars.collect();
            assert_ne!(last.get(&letter), Some(&value), "{} repeats {}", line, word);
            last.insert(letter, value);
        }
    }
}

#[test]
fn test_program_is_minimal() {
    let lines = emit_program(&operations(), &JobParams::default()).unwrap();
    assert_minimal(&lines);
}

#[test]
fn test_program_structure() {
    let lines = emit_program(&operations(), &JobParams::default()).unwrap();
    let pocket = lines.iter().position(|l| l == "; pocket (Raster Pocket)").unwrap();
    let outline = lines.iter().position(|l| l == "; outline (Outside)").unwrap();
    assert!(pocket < outline);

    let g90 = lines.iter().position(|l| l == "G90").unwrap();
    assert_eq!(lines[g90 + 1], "G21");
    assert_eq!(lines.iter().filter(|l| l.starts_with("M3")).count(), 1);
    assert_eq!(lines.iter().filter(|l| *l == "M5").count(), 1);
    assert_eq!(lines.last().unwrap(), "M2");
}

#[test]
fn test_inch_output_scales() {
    let job = JobParams {
        units: Units::Inch,
        return_to_zero: false,
        ..JobParams::default()
    };
    let op = Operation::new(
        "mark",
        OperationKind::Drill,
        PathSet::from_paths(vec![Path::open(vec![Point::from_mm(25.4, 50.8)])]),
        OperationParams::default(),
    )
    .unwrap();
    let lines = emit_program(&[op], &job).unwrap();
    assert!(lines.contains(&"G20".to_string()));
    assert!(lines.contains(&"G0 X1 Y2".to_string()));
}

#[test]
fn test_lower_left_origin() {
    let job = JobParams {
        origin: OriginMode::LowerLeft,
        ..JobParams::default()
    };
    let op = Operation::new(
        "holes",
        OperationKind::Drill,
        PathSet::from_paths(vec![Path::open(vec![
            Point::from_mm(10.0, 10.0),
            Point::from_mm(20.0, 10.0),
        ])]),
        OperationParams {
            tool_diameter: 2.0,
            ..OperationParams::default()
        },
    )
    .unwrap();
    let lines = emit_program(&[op], &job).unwrap();
    // Lower-left of the drilled area is one tool radius outside the first hole
    assert!(lines.contains(&"G0 X1 Y1".to_string()));
}
