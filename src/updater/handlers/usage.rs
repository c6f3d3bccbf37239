//! Handler for indexes that aggregate over reexport closures.

use std::sync::Arc;

use crate::index::{CrossProjectIndex, KeyExtractor};
use crate::types::ProjectId;
use crate::updater::{FileDelta, IndexHandler};

/// Applies local changes and propagates them into built aggregates.
/// Graph changes drop the aggregates of every affected project.
pub struct CrossProjectHandler<E: KeyExtractor> {
    index: Arc<CrossProjectIndex<E>>,
}

impl<E: KeyExtractor> CrossProjectHandler<E> {
    pub fn new(index: Arc<CrossProjectIndex<E>>) -> Self {
        Self { index }
    }
}

impl<E: KeyExtractor> IndexHandler for CrossProjectHandler<E> {
    fn name(&self) -> &str {
        self.index.extractor().name()
    }

    fn apply(&self, _project: &ProjectId, deltas: &[FileDelta]) -> usize {
        deltas
            .iter()
            .filter(|delta| self.index.apply_change(&delta.file, delta.kind).is_some())
            .count()
    }

    fn graph_changed(&self, affected: &[ProjectId]) -> usize {
        self.index.invalidate_aggregates(affected)
    }

    fn project_removed(&self, project: &ProjectId) {
        self.index.remove_project(project);
    }

    fn invalidate(&self, project: &ProjectId) -> bool {
        self.index.invalidate(project)
    }
}
