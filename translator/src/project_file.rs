//! PSM projects stored as JSON.

use std::path::Path;

use thiserror::Error;
use xcase_psm::{PsmProject, ValidationError};

#[derive(Debug, Error)]
pub enum ProjectError {
    #[error("failed to access the project file: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid project file: {0}")]
    Json(#[from] serde_json::Error),
    #[error("inconsistent project: {0}")]
    Invalid(#[from] ValidationError),
}

/// Parses a project and checks that its references are consistent.
pub fn from_json_str(source: &str) -> Result<PsmProject, ProjectError> {
    let project: PsmProject = serde_json::from_str(source)?;
    project.validate()?;
    Ok(project)
}

pub fn to_json_string(project: &PsmProject) -> Result<String, ProjectError> {
    Ok(serde_json::to_string_pretty(project)?)
}

pub fn load(path: impl AsRef<Path>) -> Result<PsmProject, ProjectError> {
    from_json_str(&std::fs::read_to_string(path)?)
}

pub fn save(project: &PsmProject, path: impl AsRef<Path>) -> Result<(), ProjectError> {
    std::fs::write(path, to_json_string(project)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_tables_default_to_empty() {
        let project = from_json_str(r#"{ "default_namespace": "urn:shop" }"#).unwrap();
        assert_eq!(project.default_namespace.as_deref(), Some("urn:shop"));
        assert_eq!(project.count::<xcase_psm::PsmDiagram>(), 0);
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(from_json_str("{"), Err(ProjectError::Json(_))));
    }

    #[test]
    fn rejects_dangling_references() {
        let error = from_json_str(r#"{ "diagrams": [{ "name": "d", "roots": [7] }] }"#)
            .unwrap_err();
        assert!(
            matches!(
                &error,
                ProjectError::Invalid(ValidationError::DanglingReference { id: 7, .. })
            ),
            "{error}"
        );
    }
}
