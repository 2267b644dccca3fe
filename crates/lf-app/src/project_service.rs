//! Project loading, saving and validation.

use std::path::Path;

use lf_project::ControllerProject;

use crate::error::{AppError, AppResult};

/// Load and validate a project file.
pub fn load_project(path: &Path) -> AppResult<ControllerProject> {
    let project = lf_project::load(path)?;
    crate::runtime_compile::build_loops(&project)?;
    Ok(project)
}

/// Validate and save a project file.
pub fn save_project(path: &Path, project: &ControllerProject) -> AppResult<()> {
    lf_project::save(path, project).map_err(|e| match e {
        lf_project::ProjectError::Io(source) => AppError::ProjectFileWrite {
            path: path.to_path_buf(),
            source,
        },
        other => AppError::from(other),
    })
}

/// Check a project beyond schema validation: everything the engine would
/// build at startup must build.
pub fn validate_project(project: &ControllerProject) -> AppResult<()> {
    lf_project::validate_project(project)?;
    crate::runtime_compile::build_loops(project)?;
    crate::runtime_compile::engine_config(project)?;
    let calibration = crate::runtime_compile::build_calibration(&project.calibration)?;
    crate::runtime_compile::build_plant(&project.plant, calibration)?;
    Ok(())
}
