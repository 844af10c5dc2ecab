//! # PathCAM Visualizer
//!
//! Reads G-code back into the waypoint path a visualizer draws. The parser
//! understands the dialect `pathcam-designer` emits: rapid and linear moves,
//! spindle on/off and program end.

pub mod gcode;

pub use gcode::{
    parse_program, BackfillPolicy, ParsedProgram, ProgramParser, ProgramStats, Waypoint,
};
