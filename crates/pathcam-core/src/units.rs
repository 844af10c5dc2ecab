//! Unit handling
//!
//! Output unit systems for emitted programs and the number formatting used
//! for every coordinate word.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Output unit system of an emitted program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Millimetres (G21)
    #[default]
    Mm,
    /// Inches (G20)
    Inch,
}

impl Units {
    /// The modal code selecting this unit system.
    pub fn gcode(&self) -> &'static str {
        match self {
            Units::Mm => "G21",
            Units::Inch => "G20",
        }
    }

    /// How many output units one millimetre is.
    pub fn per_mm(&self) -> f64 {
        match self {
            Units::Mm => 1.0,
            Units::Inch => 1.0 / MM_PER_INCH,
        }
    }

    /// Convert a millimetre value into this unit system.
    pub fn from_mm(&self, value_mm: f64) -> f64 {
        value_mm * self.per_mm()
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Units::Mm => write!(f, "mm"),
            Units::Inch => write!(f, "inch"),
        }
    }
}

impl FromStr for Units {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mm" | "metric" | "millimeter" | "millimetre" => Ok(Units::Mm),
            "inch" | "in" | "imperial" => Ok(Units::Inch),
            _ => Err(format!("Unknown units: {}", s)),
        }
    }
}

/// Render `value` with `precision` decimals, trailing zeros stripped.
///
/// Negative zero and values that round to zero render as `"0"`.
pub fn format_number(value: f64, precision: usize) -> String {
    let mut text = format!("{:.*}", precision, value);
    if text.contains('.') {
        while text.ends_with('0') {
            text.pop();
        }
        if text.ends_with('.') {
            text.pop();
        }
    }
    if text == "-0" {
        text = "0".to_string();
    }
    text
}
