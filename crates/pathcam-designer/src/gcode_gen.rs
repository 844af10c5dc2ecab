//! G-code generation from toolpaths.
//!
//! [`emit_program`] generates every operation's toolpath, plans its passes
//! and writes the result as G-code lines. [`GcodeEmitter`] keeps the
//! machine state of one emission and leaves out every word that would not
//! change it.

use pathcam_core::{
    format_number, to_fixed, Bounds, MachineState, ParameterError, SpindleState, Units,
    FIXED_POINT_SCALE,
};
use serde::{Deserialize, Serialize};

use crate::multipass::{MoveKind, MultiPassConfig, MultiPassPlanner, ToolMove};
use crate::operation::{Operation, OperationParams};
use crate::toolpath::{generate_toolpath, Strategy, Toolpath, ToolpathStrategy};

/// Where the program origin sits relative to the geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginMode {
    /// Geometry coordinates are machine coordinates
    #[default]
    Absolute,
    /// Lower-left corner of the cut area at X0 Y0
    LowerLeft,
    /// Centre of the cut area at X0 Y0
    Center,
}

/// Job-wide output settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobParams {
    pub units: Units,
    /// Safe travel height above the material top, mm
    pub safe_z: f64,
    /// Machine Z of the material top, mm
    pub top_z: f64,
    pub spindle_rpm: f64,
    pub origin: OriginMode,
    /// Extra X shift applied after the origin, mm
    pub x_offset: f64,
    /// Extra Y shift applied after the origin, mm
    pub y_offset: f64,
    /// Rapid back to X0 Y0 before ending the program
    pub return_to_zero: bool,
    /// Decimal places written for every number
    pub precision: usize,
}

impl Default for JobParams {
    fn default() -> Self {
        Self {
            units: Units::Mm,
            safe_z: 5.0,
            top_z: 0.0,
            spindle_rpm: 10_000.0,
            origin: OriginMode::Absolute,
            x_offset: 0.0,
            y_offset: 0.0,
            return_to_zero: true,
            precision: 4,
        }
    }
}

impl JobParams {
    pub fn validate(&self) -> Result<(), ParameterError> {
        if !(self.safe_z.is_finite() && self.safe_z > 0.0) {
            return Err(ParameterError::invalid(
                "safe_z",
                format!("must be above the material top, got {}", self.safe_z),
            ));
        }
        if !(self.spindle_rpm.is_finite() && self.spindle_rpm >= 0.0) {
            return Err(ParameterError::invalid(
                "spindle_rpm",
                format!("must be zero or positive, got {}", self.spindle_rpm),
            ));
        }
        for (name, value) in [
            ("top_z", self.top_z),
            ("x_offset", self.x_offset),
            ("y_offset", self.y_offset),
        ] {
            if !value.is_finite() {
                return Err(ParameterError::invalid(name, "must be finite"));
            }
        }
        if self.precision > 10 {
            return Err(ParameterError::invalid(
                "precision",
                format!("must be at most 10 decimal places, got {}", self.precision),
            ));
        }
        Ok(())
    }
}

/// Affine map from planner coordinates to program coordinates.
///
/// XY input is fixed-point, Z input is millimetres relative to the material
/// top. Output is in the job's units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutputMapping {
    pub scale: [f64; 3],
    pub offset: [f64; 3],
}

impl OutputMapping {
    /// Mapping for `job`, with `bounds` the extent of the cut area used by
    /// the relative origin modes.
    pub fn for_job(job: &JobParams, bounds: Option<Bounds>) -> Self {
        let per_mm = job.units.per_mm();
        let xy_scale = per_mm / FIXED_POINT_SCALE;

        let (origin_x, origin_y) = match (job.origin, bounds) {
            (OriginMode::LowerLeft, Some(b)) => (b.min_x as f64, b.min_y as f64),
            (OriginMode::Center, Some(b)) => {
                let c = b.center();
                (c.x as f64, c.y as f64)
            }
            _ => (0.0, 0.0),
        };

        Self {
            scale: [xy_scale, xy_scale, per_mm],
            offset: [
                job.x_offset * per_mm - origin_x * xy_scale,
                job.y_offset * per_mm - origin_y * xy_scale,
                job.top_z * per_mm,
            ],
        }
    }

    pub fn map(&self, x: i64, y: i64, z: f64) -> [f64; 3] {
        [
            x as f64 * self.scale[0] + self.offset[0],
            y as f64 * self.scale[1] + self.offset[1],
            z * self.scale[2] + self.offset[2],
        ]
    }

    /// Program Z for a height relative to the material top.
    pub fn map_z(&self, z: f64) -> f64 {
        z * self.scale[2] + self.offset[2]
    }
}

/// Writes G-code lines for one program, tracking machine state so each
/// line carries only the words that change it.
#[derive(Debug, Clone)]
pub struct GcodeEmitter {
    mapping: OutputMapping,
    precision: usize,
    state: MachineState,
    lines: Vec<String>,
}

impl GcodeEmitter {
    pub fn new(mapping: OutputMapping, precision: usize) -> Self {
        Self {
            mapping,
            precision,
            state: MachineState::new(),
            lines: Vec::new(),
        }
    }

    pub fn state(&self) -> &MachineState {
        &self.state
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Write a line verbatim.
    pub fn raw(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn comment(&mut self, text: &str) {
        self.lines.push(format!("; {}", text));
    }

    fn render(&self, value: f64) -> String {
        format_number(value, self.precision)
    }

    /// Changed axis words, updating the state as they are written.
    fn axis_words(&mut self, target: [Option<f64>; 3]) -> Vec<String> {
        let mut words = Vec::new();
        let precision = self.precision;
        let slots = [
            ('X', &mut self.state.x),
            ('Y', &mut self.state.y),
            ('Z', &mut self.state.z),
        ];
        for ((letter, slot), value) in slots.into_iter().zip(target) {
            let Some(value) = value else {
                continue;
            };
            let rendered = format_number(value, precision);
            if slot.map(|v| format_number(v, precision)).as_deref() != Some(rendered.as_str()) {
                words.push(format!("{}{}", letter, rendered));
                *slot = Some(value);
            }
        }
        words
    }

    /// A G0 or G1 move to program coordinates, skipped when nothing changes.
    pub fn motion(&mut self, rapid: bool, target: [Option<f64>; 3], feed: Option<f64>) {
        let mut words = self.axis_words(target);
        if words.is_empty() {
            return;
        }
        if let (false, Some(feed)) = (rapid, feed) {
            let rendered = self.render(feed);
            if self.state.feed.map(|f| self.render(f)).as_deref() != Some(rendered.as_str()) {
                words.push(format!("F{}", rendered));
                self.state.feed = Some(feed);
            }
        }
        let code = if rapid { "G0" } else { "G1" };
        self.lines.push(format!("{} {}", code, words.join(" ")));
    }

    /// Emit one planned move with the operation's feeds.
    pub fn tool_move(&mut self, m: &ToolMove, params: &OperationParams) {
        let [x, y, z] = self.mapping.map(m.x, m.y, m.z);
        match m.kind {
            MoveKind::Rapid => {
                // Climb before travelling, travel before descending
                let rising = self.state.z.map_or(true, |current| z >= current);
                if rising {
                    self.motion(true, [None, None, Some(z)], None);
                    self.motion(true, [Some(x), Some(y), None], None);
                } else {
                    self.motion(true, [Some(x), Some(y), None], None);
                    self.motion(true, [None, None, Some(z)], None);
                }
            }
            MoveKind::Plunge => {
                self.motion(false, [Some(x), Some(y), Some(z)], Some(params.plunge_feed))
            }
            MoveKind::Cut => self.motion(false, [Some(x), Some(y), Some(z)], Some(params.cut_feed)),
        }
    }

    /// Rapid to a height relative to the material top.
    pub fn retract(&mut self, z: f64) {
        let z = self.mapping.map_z(z);
        self.motion(true, [None, None, Some(z)], None);
    }

    /// `M3 S<rpm>` unless the spindle already runs at that speed.
    pub fn spindle_on(&mut self, rpm: f64) {
        let rendered = self.render(rpm);
        let same_speed =
            self.state.spindle_speed.map(|s| self.render(s)).as_deref() == Some(rendered.as_str());
        if self.state.spindle_on() && same_speed {
            return;
        }
        self.lines.push(format!("M3 S{}", rendered));
        self.state.spindle = Some(SpindleState::On);
        self.state.spindle_speed = Some(rpm);
    }

    /// `M5` if the spindle is running.
    pub fn spindle_off(&mut self) {
        if self.state.spindle_on() {
            self.lines.push("M5".to_string());
            self.state.spindle = Some(SpindleState::Off);
        }
    }

    pub fn finish(self) -> Vec<String> {
        self.lines
    }
}

/// Extent of the material the operations cut: each operand widened by its
/// strategy's preview bloat. Operations that produced no toolpath are left
/// out.
fn cut_bounds(operations: &[Operation], toolpaths: &[Toolpath]) -> Option<Bounds> {
    operations
        .iter()
        .zip(toolpaths)
        .filter(|(_, toolpath)| !toolpath.is_empty())
        .filter_map(|(op, _)| {
            let bloat = Strategy::for_kind(op.kind).preview_bloat(op.params.tool_diameter);
            op.operand.bounds().map(|b| b.expand(to_fixed(bloat)))
        })
        .reduce(Bounds::union)
}

/// Generate the complete program for `operations`, in order.
pub fn emit_program(operations: &[Operation], job: &JobParams) -> pathcam_core::Result<Vec<String>> {
    job.validate()?;
    for op in operations {
        op.params.validate(op.kind)?;
    }

    let toolpaths: Vec<Toolpath> = operations
        .iter()
        .map(|op| generate_toolpath(op.kind, &op.operand, &op.params))
        .collect();
    let mapping = OutputMapping::for_job(job, cut_bounds(operations, &toolpaths));

    let mut emitter = GcodeEmitter::new(mapping, job.precision);
    emitter.comment("Generated by pathcam");
    emitter.comment(&format!("Units: {}", job.units));
    emitter.comment(&format!("Operations: {}", operations.len()));
    emitter.raw("G90");
    emitter.raw(job.units.gcode());
    emitter.retract(job.safe_z);
    emitter.spindle_on(job.spindle_rpm);

    for (op, toolpath) in operations.iter().zip(&toolpaths) {
        emitter.comment(&format!("{} ({})", op.name, op.kind));
        let planner = MultiPassPlanner::new(MultiPassConfig::from_params(&op.params, job.safe_z));
        let mut moves = 0;
        for path in toolpath.paths.iter() {
            for m in planner.plan(path, toolpath.generates_z) {
                emitter.tool_move(&m, &op.params);
                moves += 1;
            }
        }
        tracing::debug!("{}: {} paths, {} moves", op.name, toolpath.paths.len(), moves);
    }

    emitter.spindle_off();
    if job.return_to_zero {
        emitter.retract(job.safe_z);
        emitter.motion(true, [Some(0.0), Some(0.0), None], None);
    }
    emitter.raw("M2");

    let lines = emitter.finish();
    tracing::debug!("Emitted {} lines for {} operations", lines.len(), operations.len());
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::OperationKind;
    use pathcam_core::{Path, PathSet, Point};

    fn emitter() -> GcodeEmitter {
        GcodeEmitter::new(OutputMapping::for_job(&JobParams::default(), None), 4)
    }

    #[test]
    fn test_unchanged_words_are_omitted() {
        let mut e = emitter();
        e.motion(false, [Some(1.0), Some(2.0), Some(-1.0)], Some(100.0));
        e.motion(false, [Some(3.0), Some(2.0), Some(-1.0)], Some(100.0));
        e.motion(false, [Some(3.0), Some(2.0), Some(-1.0)], Some(200.0));
        e.motion(true, [Some(3.0), Some(4.0), None], None);
        assert_eq!(e.lines(), &["G1 X1 Y2 Z-1 F100", "G1 X3", "G0 Y4"]);
    }

    #[test]
    fn test_rendered_equality_decides() {
        let mut e = emitter();
        e.motion(true, [Some(1.0), None, None], None);
        e.motion(true, [Some(1.00001), None, None], None);
        assert_eq!(e.lines().len(), 1);
    }

    #[test]
    fn test_spindle_transitions() {
        let mut e = emitter();
        e.spindle_off();
        e.spindle_on(12000.0);
        e.spindle_on(12000.0);
        e.spindle_off();
        e.spindle_off();
        assert_eq!(e.lines(), &["M3 S12000", "M5"]);
    }

    #[test]
    fn test_mapping_units_and_top() {
        let job = JobParams {
            units: Units::Inch,
            top_z: 25.4,
            ..JobParams::default()
        };
        let mapping = OutputMapping::for_job(&job, None);
        let [x, y, z] = mapping.map(2_540_000, 0, -25.4);
        assert!((x - 1.0).abs() < 1e-12);
        assert_eq!(y, 0.0);
        assert!(z.abs() < 1e-12);
    }

    #[test]
    fn test_mapping_lower_left_and_center() {
        let bounds = Bounds {
            min_x: 100_000,
            min_y: 200_000,
            max_x: 300_000,
            max_y: 400_000,
        };
        let job = JobParams {
            origin: OriginMode::LowerLeft,
            x_offset: 1.0,
            ..JobParams::default()
        };
        let mapping = OutputMapping::for_job(&job, Some(bounds));
        let [x, y, _] = mapping.map(100_000, 200_000, 0.0);
        assert!((x - 1.0).abs() < 1e-9 && y.abs() < 1e-9);

        let job = JobParams {
            origin: OriginMode::Center,
            ..JobParams::default()
        };
        let mapping = OutputMapping::for_job(&job, Some(bounds));
        assert_eq!(mapping.map(200_000, 300_000, 0.0), [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_job_validation() {
        let job = JobParams {
            safe_z: 0.0,
            ..JobParams::default()
        };
        assert!(job.validate().is_err());
        assert!(JobParams::default().validate().is_ok());
    }

    #[test]
    fn test_emit_drill_program() {
        let operand = PathSet::from_paths(vec![Path::open(vec![
            Point::from_mm(10.0, 10.0),
            Point::from_mm(20.0, 10.0),
        ])]);
        let params = OperationParams {
            cut_depth: 2.0,
            pass_depth: 5.0,
            ..OperationParams::default()
        };
        let op = Operation::new("holes", OperationKind::Drill, operand, params).unwrap();
        let lines = emit_program(&[op], &JobParams::default()).unwrap();
        let body: Vec<&str> = lines
            .iter()
            .map(String::as_str)
            .filter(|l| !l.starts_with(';'))
            .collect();
        assert_eq!(
            body,
            vec![
                "G90",
                "G21",
                "G0 Z5",
                "M3 S10000",
                "G0 X10 Y10",
                "G1 Z-2 F100",
                "G0 Z5",
                "G0 X20",
                "G1 Z-2",
                "G0 Z5",
                "M5",
                "G0 X0 Y0",
                "M2",
            ]
        );
        assert!(lines.iter().any(|l| l == "; holes (Drill)"));
    }

    #[test]
    fn test_vertical_step_at_plunge_feed() {
        let params = OperationParams::default();
        let planner = MultiPassPlanner::new(MultiPassConfig::from_params(&params, 5.0));
        let path = Path::open(vec![
            Point::with_z(0, 0, -1.0),
            Point::with_z(0, 0, -2.0),
            Point::with_z(1_000_000, 0, -2.0),
        ]);
        let mut e = emitter();
        for m in planner.plan(&path, true) {
            e.tool_move(&m, &params);
        }
        assert_eq!(
            e.lines(),
            &[
                "G0 Z5",
                "G0 X0 Y0",
                "G1 Z-1 F100",
                "G1 Z-2",
                "G1 X10 F500",
                "G0 Z5",
            ]
        );
    }

    #[test]
    fn test_emit_rejects_invalid_job() {
        let job = JobParams {
            precision: 20,
            ..JobParams::default()
        };
        let err = emit_program(&[], &job).unwrap_err();
        assert!(err.is_parameter_error());
    }
}
