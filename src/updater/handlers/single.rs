//! Handler for indexes without cross-project visibility.

use std::sync::Arc;

use crate::index::{KeyExtractor, SingleProjectIndex};
use crate::types::ProjectId;
use crate::updater::{FileDelta, IndexHandler};

pub struct SingleProjectHandler<E: KeyExtractor> {
    index: Arc<SingleProjectIndex<E>>,
}

impl<E: KeyExtractor> SingleProjectHandler<E> {
    pub fn new(index: Arc<SingleProjectIndex<E>>) -> Self {
        Self { index }
    }
}

impl<E: KeyExtractor> IndexHandler for SingleProjectHandler<E> {
    fn name(&self) -> &str {
        self.index.extractor().name()
    }

    fn apply(&self, _project: &ProjectId, deltas: &[FileDelta]) -> usize {
        deltas
            .iter()
            .filter(|delta| self.index.apply_change(&delta.file, delta.kind).is_some())
            .count()
    }

    fn project_removed(&self, project: &ProjectId) {
        self.index.remove_project(project);
    }

    fn invalidate(&self, project: &ProjectId) -> bool {
        self.index.invalidate(project)
    }
}
