//! PathCAM Settings Crate
//!
//! Handles project files: job settings plus the ordered list of operations,
//! stored as JSON or TOML.

pub mod config;
pub mod error;

pub use config::{GeometrySource, OperationConfig, ProjectConfig};
pub use error::{SettingsError, SettingsResult};
