//! Project configuration for PathCAM
//!
//! A project holds the job-wide output settings and the ordered list of
//! operations to cut. It is stored as JSON or TOML, chosen by the file
//! extension. Operation geometry is either embedded in the project or read
//! from a geometry JSON file next to it.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use pathcam_core::{FillRule, PathSet};
use pathcam_designer::{JobParams, Operation, OperationKind, OperationParams};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{SettingsError, SettingsResult};

/// File formats a project can be stored in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConfigFormat {
    Json,
    Toml,
}

impl ConfigFormat {
    fn for_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Some(Self::Json),
            Some("toml") => Some(Self::Toml),
            _ => None,
        }
    }
}

/// Where an operation's operand geometry comes from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometrySource {
    /// A geometry JSON file, relative to the project file
    File(PathBuf),
    /// Paths embedded in the project
    Inline(PathSet),
}

/// One operation entry in a project file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationConfig {
    pub name: String,
    pub kind: OperationKind,
    /// Fill rule the operand is resolved with
    #[serde(default)]
    pub fill_rule: FillRule,
    pub geometry: GeometrySource,
    #[serde(default)]
    pub params: OperationParams,
}

/// A complete project: job settings plus operations in cutting order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub job: JobParams,
    #[serde(default)]
    pub operations: Vec<OperationConfig>,
}

impl ProjectConfig {
    /// Create new project with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load project from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = ConfigFormat::for_path(path).ok_or_else(|| {
            SettingsError::LoadError(format!(
                "{}: project file must be .json or .toml",
                path.display()
            ))
        })?;

        let content = fs::read_to_string(path).map_err(|e| {
            SettingsError::LoadError(format!("cannot read {}: {}", path.display(), e))
        })?;

        let config: Self = match format {
            ConfigFormat::Json => serde_json::from_str(&content)?,
            ConfigFormat::Toml => toml::from_str(&content)?,
        };

        config.validate()?;
        debug!(
            "Loaded project {} with {} operations",
            path.display(),
            config.operations.len()
        );
        Ok(config)
    }

    /// Save project to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match ConfigFormat::for_path(path) {
            Some(ConfigFormat::Json) => serde_json::to_string_pretty(self)?,
            Some(ConfigFormat::Toml) => toml::to_string_pretty(self)?,
            None => {
                return Err(SettingsError::SaveError(format!(
                    "{}: project file must be .json or .toml",
                    path.display()
                )))
            }
        };

        fs::write(path, content).map_err(|e| {
            SettingsError::SaveError(format!("cannot write {}: {}", path.display(), e))
        })?;
        debug!("Saved project {}", path.display());
        Ok(())
    }

    /// Validate the job settings and every operation entry.
    pub fn validate(&self) -> SettingsResult<()> {
        self.job.validate()?;

        let mut names = HashSet::new();
        for (i, op) in self.operations.iter().enumerate() {
            let key = |field: &str| format!("operations[{}].{}", i, field);

            if op.name.trim().is_empty() {
                return Err(SettingsError::invalid(key("name"), "must not be empty"));
            }
            if !names.insert(op.name.as_str()) {
                return Err(SettingsError::invalid(
                    key("name"),
                    format!("duplicate operation name '{}'", op.name),
                ));
            }
            if let GeometrySource::File(file) = &op.geometry {
                if file.as_os_str().is_empty() {
                    return Err(SettingsError::invalid(key("geometry"), "file path is empty"));
                }
            }
            op.params.validate(op.kind)?;
        }

        Ok(())
    }

    /// Resolve every operation's geometry and build the operations in
    /// order. Relative geometry paths are taken from `base_dir`.
    pub fn build_operations(&self, base_dir: &Path) -> SettingsResult<Vec<Operation>> {
        self.operations
            .iter()
            .map(|op| -> SettingsResult<Operation> {
                let operand = op.load_geometry(base_dir)?.with_fill_rule(op.fill_rule);
                Ok(Operation::new(op.name.clone(), op.kind, operand, op.params.clone())?)
            })
            .collect()
    }
}

impl OperationConfig {
    pub fn new(
        name: impl Into<String>,
        kind: OperationKind,
        geometry: GeometrySource,
        params: OperationParams,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            fill_rule: FillRule::default(),
            geometry,
            params,
        }
    }

    fn load_geometry(&self, base_dir: &Path) -> SettingsResult<PathSet> {
        match &self.geometry {
            GeometrySource::Inline(paths) => Ok(paths.clone()),
            GeometrySource::File(file) => {
                let path = if file.is_absolute() {
                    file.clone()
                } else {
                    base_dir.join(file)
                };
                let json = fs::read_to_string(&path).map_err(|e| {
                    SettingsError::LoadError(format!(
                        "{}: cannot read geometry {}: {}",
                        self.name,
                        path.display(),
                        e
                    ))
                })?;
                let paths: PathSet = serde_json::from_str(&json).map_err(|e| {
                    SettingsError::LoadError(format!(
                        "{}: invalid geometry {}: {}",
                        self.name,
                        path.display(),
                        e
                    ))
                })?;
                debug!(
                    "{}: {} paths from {}",
                    self.name,
                    paths.len(),
                    path.display()
                );
                Ok(paths)
            }
        }
    }
}
