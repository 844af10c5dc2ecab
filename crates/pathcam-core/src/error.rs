//! Error handling for PathCAM
//!
//! Provides error types for every layer of the engine:
//! - Geometry errors (degenerate or unresolvable algebra input)
//! - Parameter errors (operation and job validation)
//! - G-Code errors (parser diagnostics)
//!
//! All error types use `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Geometry error type
///
/// Raised inside the path algebra when input cannot be resolved. The algebra
/// recovers from these locally and returns an empty result, so callers only
/// see them through logs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Degenerate or unresolvable input geometry
    #[error("Invalid geometry: {reason}")]
    InvalidGeometry {
        /// Why the geometry was rejected.
        reason: String,
    },

    /// Coordinates outside the range the fixed-point algebra can represent
    #[error("Coordinate {value} out of range")]
    CoordinateOutOfRange {
        /// The offending coordinate value.
        value: i64,
    },
}

/// Parameter error type
///
/// Operation and job parameters are safety relevant, so invalid values are
/// rejected at construction time rather than clamped.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParameterError {
    /// A parameter value is outside its valid range
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter {
        /// The parameter name.
        name: String,
        /// The reason the value was rejected.
        reason: String,
    },
}

impl ParameterError {
    /// Shorthand for building an [`ParameterError::InvalidParameter`].
    pub fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ParameterError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// G-Code error type
///
/// Represents diagnostics raised while parsing a control-code program.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GcodeError {
    /// Invalid G-Code syntax
    #[error("Invalid syntax at line {line_number}: {reason}")]
    InvalidSyntax {
        /// The line number where the syntax error occurred.
        line_number: u32,
        /// The reason for the syntax error.
        reason: String,
    },

    /// Recognized but unhandled command
    #[error("Unsupported command at line {line_number}: {code}")]
    UnsupportedCommand {
        /// The line number where the command was found.
        line_number: u32,
        /// The unsupported command word.
        code: String,
    },

    /// Program demarcation is missing or unbalanced
    #[error("Malformed program: {reason}")]
    MalformedProgram {
        /// Description of the malformation.
        reason: String,
    },
}

impl GcodeError {
    /// Line the diagnostic refers to, when it refers to one.
    pub fn line_number(&self) -> Option<u32> {
        match self {
            GcodeError::InvalidSyntax { line_number, .. }
            | GcodeError::UnsupportedCommand { line_number, .. } => Some(*line_number),
            GcodeError::MalformedProgram { .. } => None,
        }
    }
}

/// Main error type for PathCAM
///
/// A unified error type that can represent any error from all layers.
/// This is the primary error type used in public APIs.
#[derive(Error, Debug)]
pub enum Error {
    /// Geometry error
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Parameter error
    #[error(transparent)]
    Parameter(#[from] ParameterError),

    /// G-Code error
    #[error(transparent)]
    Gcode(#[from] GcodeError),

    /// Standard I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Geometry serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an error from a string message
    pub fn other(msg: impl Into<String>) -> Self {
        Error::Other(msg.into())
    }

    /// Check if this is a parameter validation error
    pub fn is_parameter_error(&self) -> bool {
        matches!(self, Error::Parameter(_))
    }

    /// Check if this is a G-Code error
    pub fn is_gcode_error(&self) -> bool {
        matches!(self, Error::Gcode(_))
    }
}

/// Result type using Error
pub type Result<T> = std::result::Result<T, Error>;
