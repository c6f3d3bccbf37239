//! Indexes answering lookups inside one project.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;

use super::{
    BucketChange, BuildOptions, CacheStats, IndexError, IndexResult, KeyExtractor, KeyedIndexCache,
    ProjectCaches, PropertyKey, UnqualifiedNameKey,
};
use crate::project::{ProjectGraph, SourceFileRef};
use crate::types::{DeltaKind, ObjectType, ProjectId};

/// Files of one project keyed by a fixed property value.
pub type RuntimeIdIndex = SingleProjectIndex<PropertyKey>;

/// Files of one project keyed by the last segment of their qualified name.
pub type UnqualifiedNameIndex = SingleProjectIndex<UnqualifiedNameKey>;

/// A keyed index per project with no visibility across projects.
pub struct SingleProjectIndex<E: KeyExtractor> {
    graph: Arc<ProjectGraph>,
    caches: ProjectCaches<E>,
}

impl<E: KeyExtractor> SingleProjectIndex<E> {
    pub fn new(graph: Arc<ProjectGraph>, extractor: E, options: BuildOptions) -> Self {
        Self {
            graph,
            caches: ProjectCaches::new(extractor, options),
        }
    }

    pub fn extractor(&self) -> &E {
        self.caches.extractor()
    }

    pub fn object_type(&self) -> ObjectType {
        self.caches.extractor().object_type()
    }

    /// The cache for a registered project.
    pub fn cache(&self, project: &ProjectId) -> IndexResult<Arc<KeyedIndexCache<E>>> {
        let project = self
            .graph
            .project(project)
            .ok_or_else(|| IndexError::UnknownProject(project.clone()))?;
        Ok(self.caches.cache_for(&project))
    }

    /// Files of `project` whose key equals `key`; empty when none match.
    pub fn get<Q>(&self, project: &ProjectId, key: &Q) -> IndexResult<Vec<SourceFileRef>>
    where
        E::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.cache(project)?.get(key)
    }

    pub fn keys(&self, project: &ProjectId) -> IndexResult<Vec<E::Key>> {
        self.cache(project)?.keys()
    }

    /// Update the owning project's cache. Files of projects without a cache
    /// yet are skipped: the first query scans them anyway.
    pub fn apply_change(
        &self,
        file: &SourceFileRef,
        kind: DeltaKind,
    ) -> Option<BucketChange<E::Key>> {
        self.caches
            .existing(file.project())?
            .apply_change(file, kind)
    }

    pub fn invalidate(&self, project: &ProjectId) -> bool {
        self.caches
            .existing(project)
            .is_some_and(|cache| cache.invalidate())
    }

    pub fn remove_project(&self, project: &ProjectId) -> bool {
        self.caches.remove(project).is_some()
    }

    pub fn stats(&self) -> CacheStats {
        self.caches.stats()
    }
}
