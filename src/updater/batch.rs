//! Change batches delivered by the host's notification source.

use crate::project::SourceFileRef;
use crate::types::{DeltaKind, ProjectId};

/// One source file and how it changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDelta {
    pub file: SourceFileRef,
    pub kind: DeltaKind,
}

impl FileDelta {
    pub fn new(file: SourceFileRef, kind: DeltaKind) -> Self {
        Self { file, kind }
    }
}

/// Everything observed since the previous batch.
///
/// File deltas are applied in the order they were pushed. Projects listed in
/// `dependency_changes` have their edges re-read before any file delta runs.
#[derive(Debug, Clone, Default)]
pub struct ChangeBatch {
    pub files: Vec<FileDelta>,
    pub dependency_changes: Vec<ProjectId>,
}

impl ChangeBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file: impl Into<SourceFileRef>, kind: DeltaKind) {
        self.files.push(FileDelta::new(file.into(), kind));
    }

    pub fn added(mut self, file: impl Into<SourceFileRef>) -> Self {
        self.push(file, DeltaKind::Added);
        self
    }

    pub fn removed(mut self, file: impl Into<SourceFileRef>) -> Self {
        self.push(file, DeltaKind::Removed);
        self
    }

    pub fn changed(mut self, file: impl Into<SourceFileRef>) -> Self {
        self.push(file, DeltaKind::Changed);
        self
    }

    /// Report that `project` now declares different dependency edges.
    pub fn dependencies_changed(mut self, project: &ProjectId) -> Self {
        if !self.dependency_changes.contains(project) {
            self.dependency_changes.push(project.clone());
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dependency_changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }
}
