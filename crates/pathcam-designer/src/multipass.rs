//! Multiple pass depth control.
//!
//! Turns one toolpath path into concrete tool moves: passes stepping down to
//! the target depth, optionally ramping into each pass along the path
//! instead of plunging, with a retract to safe height at the end.
//!
//! Z values are millimetres relative to the material top (negative is into
//! the material). XY stays in fixed-point units until emission.

use pathcam_core::{distance_to_mm, Path, Point};

use crate::operation::OperationParams;

/// Ramp steps allowed for one pass before giving up and plunging.
const MAX_RAMP_STEPS: usize = 100_000;

/// Depth differences below this are treated as equal.
const DEPTH_EPSILON: f64 = 1e-9;

/// Kind of tool move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    /// Non-cutting move at safe height
    Rapid,
    /// Vertical move into the material at plunge feed
    Plunge,
    /// Cutting move at cut feed
    Cut,
}

/// One straight tool move to `(x, y, z)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToolMove {
    pub kind: MoveKind,
    pub x: i64,
    pub y: i64,
    pub z: f64,
}

impl ToolMove {
    pub fn new(kind: MoveKind, p: &Point, z: f64) -> Self {
        Self {
            kind,
            x: p.x,
            y: p.y,
            z,
        }
    }

    fn same_place(&self, p: &Point, z: f64) -> bool {
        self.x == p.x && self.y == p.y && (self.z - z).abs() <= DEPTH_EPSILON
    }
}

/// Configuration for multi-pass depth control.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiPassConfig {
    /// Safe height above the material top
    pub safe_z: f64,
    /// Target depth below the top, as a positive number
    pub cut_depth: f64,
    /// Maximum depth per pass
    pub pass_depth: f64,
    pub ramp: bool,
    pub cut_feed: f64,
    pub plunge_feed: f64,
}

impl MultiPassConfig {
    /// Configuration for an operation's parameters.
    pub fn from_params(params: &OperationParams, safe_z: f64) -> Self {
        Self {
            safe_z,
            cut_depth: params.cut_depth,
            pass_depth: params.pass_depth,
            ramp: params.ramp,
            cut_feed: params.cut_feed,
            plunge_feed: params.plunge_feed,
        }
    }

    /// Calculates the number of passes needed to reach `bottom`.
    pub fn calculate_passes(&self, bottom: f64) -> usize {
        self.pass_depths(bottom).len()
    }

    /// Z of every pass down to `bottom`, each at most `pass_depth` below the
    /// previous one, the last exactly at `bottom`.
    pub fn pass_depths(&self, bottom: f64) -> Vec<f64> {
        let mut depths = Vec::new();
        if self.pass_depth <= 0.0 || !bottom.is_finite() {
            return depths;
        }
        let mut current = 0.0;
        while current > bottom + DEPTH_EPSILON {
            current = (current - self.pass_depth).max(bottom);
            depths.push(current);
        }
        depths
    }
}

enum RampEdge {
    /// Target depth reached at this fraction of the edge
    Reached(f64),
    /// Edge ends above the target at this Z
    Descended(f64),
}

/// Plans the tool moves for toolpath paths.
#[derive(Debug, Clone)]
pub struct MultiPassPlanner {
    config: MultiPassConfig,
}

impl MultiPassPlanner {
    pub fn new(config: MultiPassConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MultiPassConfig {
        &self.config
    }

    /// Tool moves for one path.
    ///
    /// With `generates_z` every vertex already carries its final Z and the
    /// path is cut once. Otherwise passes step down to the path's lowest Z,
    /// or to the configured cut depth when the path has none. Every plan
    /// starts with a rapid over the start point and ends with a retract.
    pub fn plan(&self, path: &Path, generates_z: bool) -> Vec<ToolMove> {
        let Some(start) = path.first().copied() else {
            return Vec::new();
        };
        let mut moves = vec![ToolMove::new(MoveKind::Rapid, &start, self.config.safe_z)];

        if generates_z && path.has_full_z() {
            self.plan_precomputed(path, &mut moves);
        } else {
            let bottom = path.min_z().unwrap_or(-self.config.cut_depth);
            if bottom >= 0.0 {
                return Vec::new();
            }
            let points: Vec<Point> = path.points.iter().map(|p| p.at_z(None)).collect();
            if points.len() == 1 || path.length() == 0.0 {
                push(&mut moves, MoveKind::Plunge, &start, bottom);
            } else if self.config.ramp {
                self.plan_ramped(points, path.closed, bottom, &mut moves);
            } else {
                self.plan_stepped(points, path.closed, bottom, &mut moves);
            }
        }

        if let Some(last) = moves.last().copied() {
            let end = Point::new(last.x, last.y);
            push(&mut moves, MoveKind::Rapid, &end, self.config.safe_z);
        }
        moves
    }

    fn plan_precomputed(&self, path: &Path, moves: &mut Vec<ToolMove>) {
        let mut points = path.points.clone();
        if path.closed {
            points.push(points[0]);
        }
        let mut previous: Option<Point> = None;
        for p in &points {
            let z = p.z.unwrap_or(0.0);
            // Vertical steps over the same XY feed at plunge rate
            let kind = match previous {
                Some(prev) if prev != *p => MoveKind::Cut,
                _ => MoveKind::Plunge,
            };
            push(moves, kind, p, z);
            previous = Some(*p);
        }
    }

    fn plan_stepped(&self, mut points: Vec<Point>, closed: bool, bottom: f64, moves: &mut Vec<ToolMove>) {
        for depth in self.config.pass_depths(bottom) {
            push(moves, MoveKind::Plunge, &points[0], depth);
            for p in &points[1..] {
                push(moves, MoveKind::Cut, p, depth);
            }
            if closed {
                push(moves, MoveKind::Cut, &points[0], depth);
            } else {
                // Next pass starts where this one ended
                points.reverse();
            }
        }
    }

    fn ramp_edge(&self, a: &Point, b: &Point, z: f64, target: f64) -> RampEdge {
        let t_cut = distance_to_mm(a.distance(b)) / self.config.cut_feed;
        let t_plunge = (z - target) / self.config.plunge_feed;
        if t_cut >= t_plunge {
            RampEdge::Reached(t_plunge / t_cut)
        } else {
            RampEdge::Descended((z - self.config.plunge_feed * t_cut).max(target))
        }
    }

    fn plan_ramped(&self, mut points: Vec<Point>, closed: bool, bottom: f64, moves: &mut Vec<ToolMove>) {
        push(moves, MoveKind::Plunge, &points[0], 0.0);
        let mut z = 0.0;
        for target in self.config.pass_depths(bottom) {
            if closed {
                self.ramp_closed(&mut points, z, target, moves);
            } else {
                self.ramp_open(&mut points, z, target, moves);
            }
            z = target;
        }
    }

    /// One ramped pass around a closed ring starting at `ring[0]`. Leaves
    /// `ring` rotated to start where the pass ended.
    fn ramp_closed(&self, ring: &mut Vec<Point>, mut z: f64, target: f64, moves: &mut Vec<ToolMove>) {
        let n = ring.len();
        let mut i = 0;
        let reached_at = loop {
            let (a, b) = (ring[i % n], ring[(i + 1) % n]);
            if i >= MAX_RAMP_STEPS {
                tracing::warn!("Ramp did not reach {} mm, plunging", target);
                push(moves, MoveKind::Plunge, &a, target);
                break i % n;
            }
            i += 1;
            if a.same_position(&b) {
                continue;
            }
            match self.ramp_edge(&a, &b, z, target) {
                RampEdge::Descended(next) => {
                    z = next;
                    push(moves, MoveKind::Cut, &b, z);
                }
                RampEdge::Reached(f) if f >= 1.0 => {
                    push(moves, MoveKind::Cut, &b, target);
                    break i % n;
                }
                RampEdge::Reached(f) => {
                    let p = a.lerp(&b, f);
                    push(moves, MoveKind::Cut, &p, target);
                    if p.same_position(&a) {
                        break (i - 1) % n;
                    }
                    if p.same_position(&b) {
                        break i % n;
                    }
                    ring.rotate_left(i % n);
                    ring.insert(0, p);
                    break 0;
                }
            }
        };
        ring.rotate_left(reached_at);

        for p in ring[1..].iter().chain(std::iter::once(&ring[0])) {
            push(moves, MoveKind::Cut, p, target);
        }
    }

    /// One ramped pass along an open path starting at `line[0]`, bouncing at
    /// the ends. Leaves `line` ordered to start where the pass ended.
    fn ramp_open(&self, line: &mut Vec<Point>, mut z: f64, target: f64, moves: &mut Vec<ToolMove>) {
        let n = line.len();
        let mut i = 0;
        let mut forward = true;
        let mut steps = 0;
        loop {
            if (forward && i == n - 1) || (!forward && i == 0) {
                forward = !forward;
            }
            let j = if forward { i + 1 } else { i - 1 };
            let (a, b) = (line[i], line[j]);

            steps += 1;
            if steps > MAX_RAMP_STEPS {
                tracing::warn!("Ramp did not reach {} mm, plunging", target);
                push(moves, MoveKind::Plunge, &a, target);
                // Finish as if the target was reached at `a` heading onward
                finish_open(line, i, forward, target, moves);
                return;
            }
            if a.same_position(&b) {
                i = j;
                continue;
            }
            match self.ramp_edge(&a, &b, z, target) {
                RampEdge::Descended(next) => {
                    z = next;
                    push(moves, MoveKind::Cut, &b, z);
                    i = j;
                }
                RampEdge::Reached(f) => {
                    let p = if f >= 1.0 { b } else { a.lerp(&b, f) };
                    push(moves, MoveKind::Cut, &p, target);
                    finish_open(line, j, forward, target, moves);
                    return;
                }
            }
        }
    }
}

/// Having reached `target` heading toward `line[next]`, cut on to that end
/// of the line and back over the whole of it.
fn finish_open(line: &mut Vec<Point>, next: usize, forward: bool, target: f64, moves: &mut Vec<ToolMove>) {
    let n = line.len();
    if forward {
        for p in &line[next..] {
            push(moves, MoveKind::Cut, p, target);
        }
        for p in line[..n - 1].iter().rev() {
            push(moves, MoveKind::Cut, p, target);
        }
    } else {
        for p in line[..=next].iter().rev() {
            push(moves, MoveKind::Cut, p, target);
        }
        for p in &line[1..] {
            push(moves, MoveKind::Cut, p, target);
        }
        line.reverse();
    }
}

/// Append a move unless the tool is already there.
fn push(moves: &mut Vec<ToolMove>, kind: MoveKind, p: &Point, z: f64) {
    if moves.last().is_some_and(|last| last.same_place(p, z)) {
        return;
    }
    moves.push(ToolMove::new(kind, p, z));
}
