//! G-Code parsing
//!
//! This module provides:
//! - Line scanning and tokenizing
//! - Machine state tracking with back-filled waypoints
//! - Program statistics

pub mod parser;
pub mod stats;

pub use parser::*;
pub use stats::*;
