//! # PathCAM Designer
//!
//! Turns operand geometry and operation parameters into G-code.
//!
//! ## Layers
//!
//! ```text
//! algebra     offset, boolean ops and cleaning on fixed-point path sets
//! toolpath    one strategy per operation kind, producing tool-centre paths
//! multipass   depth passes and ramps turning a path into tool moves
//! gcode_gen   machine-state tracking emitter and whole-program assembly
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use pathcam_designer::{emit_program, JobParams, Operation, OperationKind, OperationParams};
//!
//! let op = Operation::new("outline", OperationKind::Outside, operand, OperationParams::default())?;
//! let program = emit_program(&[op], &JobParams::default())?;
//! ```

pub mod algebra;
pub mod gcode_gen;
pub mod multipass;
pub mod operation;
pub mod toolpath;

pub use algebra::{boolean_op, clean, features, offset, BooleanOp, JoinType};
pub use gcode_gen::{emit_program, GcodeEmitter, JobParams, OriginMode, OutputMapping};
pub use multipass::{MoveKind, MultiPassConfig, MultiPassPlanner, ToolMove};
pub use operation::{CutDirection, Operation, OperationKind, OperationParams, RingOrder};
pub use toolpath::{generate_toolpath, Strategy, Toolpath, ToolpathStrategy};
