//! Error types for index queries.

use thiserror::Error;

use crate::project::SourceError;
use crate::types::ProjectId;

/// Errors surfaced by index queries.
///
/// Only full rebuilds can fail; incremental updates recover locally.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Project {0} is not registered")]
    UnknownProject(ProjectId),
}

pub type IndexResult<T> = Result<T, IndexError>;
