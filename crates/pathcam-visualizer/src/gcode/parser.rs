//! G-Code parser and waypoint reconstruction
//!
//! Reads the restricted dialect the emitter writes and rebuilds the sequence
//! of positions the tool visits. Words the emitter leaves out because they
//! did not change are carried forward from the machine state; values used
//! before their first assignment are back-filled once the whole program has
//! been read.

use std::sync::OnceLock;

use pathcam_core::{GcodeError, MachineState, SpindleState};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

/// Setup codes that may appear in a program but never change a waypoint.
const IGNORED_G_CODES: [u32; 11] = [17, 20, 21, 40, 49, 54, 61, 64, 80, 90, 94];

/// One reconstructed tool position, in the program's output units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub f: f64,
    pub spindle_on: bool,
    pub spindle_speed: f64,
    /// The move that reached this waypoint was a rapid (`G0`).
    pub rapid: bool,
}

impl Waypoint {
    pub fn distance_to(&self, other: &Waypoint) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        let dz = other.z - self.z;
        (dx * dx + dy * dy + dz * dz).sqrt()
    }

    /// Equal in every field except the motion mode that reached it.
    pub fn same_state(&self, other: &Waypoint) -> bool {
        Waypoint {
            rapid: other.rapid,
            ..*self
        } == *other
    }
}

/// How fields read before their first assignment are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackfillPolicy {
    /// Use the first value the program later assigns, or 0 if it never does.
    FirstLaterValue,
    /// Treat every unassigned field as 0.
    #[default]
    Zero,
}

/// Parser output: the waypoints plus every diagnostic raised on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedProgram {
    pub waypoints: Vec<Waypoint>,
    pub diagnostics: Vec<GcodeError>,
}

/// Waypoint before back-fill. `None` fields were still unknown when the
/// motion happened; coalescing waits until they are resolved.
#[derive(Debug, Clone, Copy)]
struct PendingWaypoint {
    state: MachineState,
    rapid: bool,
}

/// Value of each tracked field at its first assignment.
#[derive(Debug, Clone, Copy, Default)]
struct FirstValues {
    x: Option<f64>,
    y: Option<f64>,
    z: Option<f64>,
    feed: Option<f64>,
    spindle_speed: Option<f64>,
}

impl FirstValues {
    fn record(&mut self, state: &MachineState) {
        self.x = self.x.or(state.x);
        self.y = self.y.or(state.y);
        self.z = self.z.or(state.z);
        self.feed = self.feed.or(state.feed);
        self.spindle_speed = self.spindle_speed.or(state.spindle_speed);
    }
}

/// Program demarcation seen so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Demarcation {
    /// No content read yet.
    Start,
    /// Content without a leading `%`.
    Unmarked,
    /// A leading `%` was read and its partner has not been seen.
    Open,
}

/// Outcome of reading one line.
enum LineOutcome {
    Continue,
    ProgramEnd,
}

/// Single-pass G-code reader with modal state tracking.
#[derive(Debug, Clone)]
pub struct ProgramParser {
    policy: BackfillPolicy,
    state: MachineState,
    rapid_mode: bool,
    first: FirstValues,
    pending: Vec<PendingWaypoint>,
    diagnostics: Vec<GcodeError>,
}

impl Default for ProgramParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgramParser {
    pub fn new() -> Self {
        Self::with_policy(BackfillPolicy::default())
    }

    pub fn with_policy(policy: BackfillPolicy) -> Self {
        Self {
            policy,
            state: MachineState::new(),
            rapid_mode: true,
            first: FirstValues::default(),
            pending: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn policy(&self) -> BackfillPolicy {
        self.policy
    }

    /// Parse a whole program. The parser is reset first, so one parser may be
    /// reused across programs.
    pub fn parse<S: AsRef<str>>(&mut self, lines: &[S]) -> ParsedProgram {
        *self = Self::with_policy(self.policy);

        let mut demarcation = Demarcation::Start;
        let mut ended = false;

        for (index, raw) in lines.iter().enumerate() {
            let line_number = u32::try_from(index + 1).unwrap_or(u32::MAX);
            let line = strip_comments(raw.as_ref());
            if line.is_empty() || line.starts_with('/') {
                continue;
            }

            if line == "%" {
                match demarcation {
                    Demarcation::Start => {
                        demarcation = Demarcation::Open;
                        continue;
                    }
                    _ => {
                        trace!("Program end marker at line {}", line_number);
                        demarcation = Demarcation::Unmarked;
                        break;
                    }
                }
            }
            if demarcation == Demarcation::Start {
                demarcation = Demarcation::Unmarked;
            }
            if ended {
                continue;
            }

            if let LineOutcome::ProgramEnd = self.parse_line(line_number, &line) {
                trace!("Program end at line {}", line_number);
                ended = true;
            }
        }

        if demarcation == Demarcation::Open {
            let diagnostic = GcodeError::MalformedProgram {
                reason: "leading '%' has no closing '%'".to_string(),
            };
            warn!("{}", diagnostic);
            self.diagnostics.push(diagnostic);
        }

        ParsedProgram {
            waypoints: self.finish(),
            diagnostics: std::mem::take(&mut self.diagnostics),
        }
    }

    fn diagnose(&mut self, diagnostic: GcodeError) {
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    fn parse_line(&mut self, line_number: u32, line: &str) -> LineOutcome {
        let words = match tokenize(line) {
            Some(words) => words,
            None => {
                self.diagnose(GcodeError::InvalidSyntax {
                    line_number,
                    reason: format!("cannot read words in '{}'", line),
                });
                return LineOutcome::Continue;
            }
        };

        let mut motion = None;
        let mut spindle = None;
        let mut program_end = false;
        let mut next = self.state;
        let mut has_axis = false;

        for word in &words {
            match word.letter {
                'G' => match word.code() {
                    Some(0) => motion = Some(true),
                    Some(1) => motion = Some(false),
                    Some(code) if IGNORED_G_CODES.contains(&code) => {}
                    _ => {
                        self.diagnose(GcodeError::UnsupportedCommand {
                            line_number,
                            code: word.text(),
                        });
                        return LineOutcome::Continue;
                    }
                },
                'M' => match word.code() {
                    Some(3) | Some(4) => spindle = Some(SpindleState::On),
                    Some(5) => spindle = Some(SpindleState::Off),
                    Some(2) | Some(30) => program_end = true,
                    _ => {
                        self.diagnose(GcodeError::UnsupportedCommand {
                            line_number,
                            code: word.text(),
                        });
                        return LineOutcome::Continue;
                    }
                },
                'X' => {
                    next.x = Some(word.value);
                    has_axis = true;
                }
                'Y' => {
                    next.y = Some(word.value);
                    has_axis = true;
                }
                'Z' => {
                    next.z = Some(word.value);
                    has_axis = true;
                }
                'F' => next.feed = Some(word.value),
                'S' => next.spindle_speed = Some(word.value),
                'T' | 'N' => {}
                _ => {
                    self.diagnose(GcodeError::UnsupportedCommand {
                        line_number,
                        code: word.text(),
                    });
                    return LineOutcome::Continue;
                }
            }
        }

        if let Some(spindle) = spindle {
            next.spindle = Some(spindle);
        }
        if let Some(rapid) = motion {
            self.rapid_mode = rapid;
        }
        self.state = next;
        self.first.record(&self.state);

        if has_axis {
            trace!(
                "Line {}: {} to {:?}",
                line_number,
                if self.rapid_mode { "rapid" } else { "feed" },
                (self.state.x, self.state.y, self.state.z)
            );
            self.pending.push(PendingWaypoint {
                state: self.state,
                rapid: self.rapid_mode,
            });
        }

        if program_end {
            LineOutcome::ProgramEnd
        } else {
            LineOutcome::Continue
        }
    }

    /// Resolve fields that were unknown when their waypoint was recorded,
    /// then merge consecutive waypoints that resolved to the same state.
    fn finish(&mut self) -> Vec<Waypoint> {
        let policy = self.policy;
        let fill = |value: Option<f64>, first: Option<f64>| {
            value.unwrap_or(match policy {
                BackfillPolicy::FirstLaterValue => first.unwrap_or(0.0),
                BackfillPolicy::Zero => 0.0,
            })
        };

        let first = self.first;
        let mut waypoints: Vec<Waypoint> = Vec::with_capacity(self.pending.len());
        for pending in self.pending.drain(..) {
            let state = pending.state;
            let waypoint = Waypoint {
                x: fill(state.x, first.x),
                y: fill(state.y, first.y),
                z: fill(state.z, first.z),
                f: fill(state.feed, first.feed),
                spindle_on: state.spindle_on(),
                spindle_speed: fill(state.spindle_speed, first.spindle_speed),
                rapid: pending.rapid,
            };
            if waypoints.last().is_some_and(|last| last.same_state(&waypoint)) {
                continue;
            }
            waypoints.push(waypoint);
        }
        waypoints
    }
}

/// Parse a program with the default back-fill policy, discarding diagnostics.
pub fn parse_program<S: AsRef<str>>(lines: &[S]) -> Vec<Waypoint> {
    ProgramParser::new().parse(lines).waypoints
}

/// One letter/number word.
#[derive(Debug, Clone, PartialEq)]
struct Word {
    letter: char,
    number: String,
    value: f64,
}

impl Word {
    /// Integral command number, or `None` for fractional codes such as `G38.2`.
    fn code(&self) -> Option<u32> {
        if self.value >= 0.0 && self.value.fract() == 0.0 && self.value <= u32::MAX as f64 {
            Some(self.value as u32)
        } else {
            None
        }
    }

    fn text(&self) -> String {
        format!("{}{}", self.letter, self.number)
    }
}

/// Remove `(...)` and `;` comments and surrounding whitespace.
fn strip_comments(line: &str) -> String {
    static PAREN_REGEX: OnceLock<Regex> = OnceLock::new();
    let paren =
        PAREN_REGEX.get_or_init(|| Regex::new(r"\([^)]*\)?").expect("invalid regex pattern"));

    let without_paren = paren.replace_all(line, " ");
    let code = match without_paren.find(';') {
        Some(pos) => &without_paren[..pos],
        None => &without_paren[..],
    };
    code.trim().to_string()
}

/// Split a comment-free line into words. Returns `None` when any part of the
/// line is not a letter followed by a number.
fn tokenize(line: &str) -> Option<Vec<Word>> {
    static LINE_REGEX: OnceLock<Regex> = OnceLock::new();
    static WORD_REGEX: OnceLock<Regex> = OnceLock::new();
    let whole = LINE_REGEX.get_or_init(|| {
        Regex::new(r"^\s*(?:[A-Za-z]\s*[+-]?(?:\d+(?:\.\d*)?|\.\d+)\s*)*$")
            .expect("invalid regex pattern")
    });
    let word = WORD_REGEX.get_or_init(|| {
        Regex::new(r"([A-Za-z])\s*([+-]?(?:\d+(?:\.\d*)?|\.\d+))").expect("invalid regex pattern")
    });

    if !whole.is_match(line) {
        return None;
    }

    word.captures_iter(line)
        .map(|caps| {
            let letter = caps.get(1)?.as_str().chars().next()?.to_ascii_uppercase();
            let number = caps.get(2)?.as_str().to_string();
            let value = number.parse::<f64>().ok()?;
            Some(Word {
                letter,
                number,
                value,
            })
        })
        .collect()
}
