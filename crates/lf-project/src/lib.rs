//! lf-project: controller configuration file format and validation.
//!
//! A project is read once at startup and never written back by a run. YAML is
//! the native format; a `.json` file is accepted as well so generated
//! configurations can be fed in without conversion.

pub mod schema;
pub mod validate;

use std::path::Path;

pub use schema::*;
pub use validate::{ValidationError, validate_project};

pub type ProjectResult<T> = Result<T, ProjectError>;

#[derive(thiserror::Error, Debug)]
pub enum ProjectError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// On-disk encoding of a project file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFormat {
    Yaml,
    Json,
}

impl ProjectFormat {
    /// `.json` files are JSON, anything else is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ProjectFormat::Json,
            _ => ProjectFormat::Yaml,
        }
    }
}

/// Parse and validate a project.
pub fn parse(content: &str, format: ProjectFormat) -> ProjectResult<ControllerProject> {
    let project: ControllerProject = match format {
        ProjectFormat::Yaml => serde_yaml::from_str(content)?,
        ProjectFormat::Json => serde_json::from_str(content)?,
    };
    validate_project(&project)?;
    Ok(project)
}

/// Load a project file, picking the format from its extension.
pub fn load(path: &Path) -> ProjectResult<ControllerProject> {
    let content = std::fs::read_to_string(path)?;
    parse(&content, ProjectFormat::from_path(path))
}

/// Validate and write a project file, picking the format from its extension.
///
/// Nothing is written when validation fails.
pub fn save(path: &Path, project: &ControllerProject) -> ProjectResult<()> {
    validate_project(project)?;
    let content = match ProjectFormat::from_path(path) {
        ProjectFormat::Yaml => serde_yaml::to_string(project)?,
        ProjectFormat::Json => serde_json::to_string_pretty(project)?,
    };
    std::fs::write(path, content)?;
    Ok(())
}
