//! Machine state tracked while emitting or reading a program.
//!
//! Every field starts out unknown, the way a controller knows nothing about
//! the tool position until the first move commands it.

/// Spindle on/off state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpindleState {
    On,
    Off,
}

/// Last known machine position, feed and spindle.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MachineState {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub z: Option<f64>,
    pub feed: Option<f64>,
    pub spindle_speed: Option<f64>,
    pub spindle: Option<SpindleState>,
}

impl MachineState {
    /// A state with every field unknown.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spindle_on(&self) -> bool {
        self.spindle == Some(SpindleState::On)
    }

    /// True once X, Y and Z have all been assigned.
    pub fn position_known(&self) -> bool {
        self.x.is_some() && self.y.is_some() && self.z.is_some()
    }
}
