//! Error types for the project and source file collaborators.

use thiserror::Error;

use crate::types::{ObjectType, ProjectId, QualifiedName};

/// Errors reported by a project or source file implementation.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Failed to enumerate {object_type} files of project {project}: {reason}")]
    Enumerate {
        project: ProjectId,
        object_type: ObjectType,
        reason: String,
    },

    #[error("Cannot read property '{property}' of {file}: {reason}")]
    PropertyRead {
        file: QualifiedName,
        property: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;
