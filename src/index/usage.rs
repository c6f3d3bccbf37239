//! Index whose lookups see every project in the reexport closure.
//!
//! Each project has a local cache as in [`super::SingleProjectIndex`]. On top
//! of that, a lazily built aggregate per queried project holds the union of
//! the local caches over its reexport closure. Local changes are patched into
//! the aggregates that contain the changed project; graph changes drop the
//! affected aggregates so they are rebuilt from the locals on the next query.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;

use super::lazy::LazyBuckets;
use super::{
    BucketChange, BuildOptions, CacheStats, IndexBuckets, IndexError, IndexResult, KeyExtractor,
    KeyedIndexCache, ProjectCaches, PropertyKey,
};
use crate::project::{ProjectGraph, SourceFileRef};
use crate::types::{DeltaKind, ProjectId};

/// Table contents keyed by the table structure they reference, visible
/// across reexported dependencies.
pub type TableUsageIndex = CrossProjectIndex<PropertyKey>;

pub struct CrossProjectIndex<E: KeyExtractor> {
    graph: Arc<ProjectGraph>,
    locals: ProjectCaches<E>,
    aggregates: DashMap<ProjectId, Arc<LazyBuckets<E::Key>>>,
}

impl<E: KeyExtractor> CrossProjectIndex<E> {
    pub fn new(graph: Arc<ProjectGraph>, extractor: E, options: BuildOptions) -> Self {
        Self {
            graph,
            locals: ProjectCaches::new(extractor, options),
            aggregates: DashMap::new(),
        }
    }

    pub fn extractor(&self) -> &E {
        self.locals.extractor()
    }

    /// Files matching `key` in `project` and every project its reexport
    /// closure reaches.
    pub fn get<Q>(&self, project: &ProjectId, key: &Q) -> IndexResult<Vec<SourceFileRef>>
    where
        E::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if !self.graph.contains(project) {
            return Err(IndexError::UnknownProject(project.clone()));
        }

        let aggregate = self.aggregate(project);
        let state = aggregate.read_built(|| self.build_aggregate(project))?;
        Ok(state.buckets().get(key))
    }

    /// Files matching `key` in `project` alone.
    pub fn get_local<Q>(&self, project: &ProjectId, key: &Q) -> IndexResult<Vec<SourceFileRef>>
    where
        E::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.local(project)?.get(key)
    }

    pub fn keys(&self, project: &ProjectId) -> IndexResult<Vec<E::Key>> {
        self.local(project)?.keys()
    }

    /// Update the owning project's local cache and every built aggregate
    /// that sees it.
    pub fn apply_change(
        &self,
        file: &SourceFileRef,
        kind: DeltaKind,
    ) -> Option<BucketChange<E::Key>> {
        let change = self
            .locals
            .existing(file.project())?
            .apply_change(file, kind)?;

        let mut patched = 0;
        for viewer in self.graph.visible_from(file.project()) {
            let Some(aggregate) = self.existing_aggregate(&viewer) else {
                continue;
            };
            if aggregate
                .update(|buckets| buckets.assign(file.clone(), change.new.clone()))
                .is_some()
            {
                patched += 1;
            }
        }

        if patched > 0 {
            tracing::trace!(
                "[index] {}: propagated {} to {patched} aggregates",
                self.extractor().name(),
                file.qualified_name()
            );
        }
        Some(change)
    }

    /// Drop the aggregates of `projects`; their next query recollects them.
    pub fn invalidate_aggregates(&self, projects: &[ProjectId]) -> usize {
        let dropped = projects
            .iter()
            .filter_map(|id| self.existing_aggregate(id))
            .filter(|aggregate| aggregate.invalidate())
            .count();

        if dropped > 0 {
            crate::debug_event!(
                "index",
                "invalidated",
                "{}: {dropped} aggregates",
                self.extractor().name()
            );
        }
        dropped
    }

    /// Drop the local cache of `project` and every aggregate that sees it.
    pub fn invalidate(&self, project: &ProjectId) -> bool {
        let local = self
            .locals
            .existing(project)
            .is_some_and(|cache| cache.invalidate());
        let viewers = self.graph.visible_from(project);
        let aggregates = self.invalidate_aggregates(&viewers);
        local || aggregates > 0
    }

    /// Forget every cache of `project`. Aggregates of other projects are left
    /// to the graph change that goes with the removal.
    pub fn remove_project(&self, project: &ProjectId) -> bool {
        let local = self.locals.remove(project).is_some();
        let aggregate = self.aggregates.remove(project).is_some();
        local || aggregate
    }

    /// Counters of the local caches.
    pub fn stats(&self) -> CacheStats {
        self.locals.stats()
    }

    /// Counters of the aggregates.
    pub fn aggregate_stats(&self) -> CacheStats {
        self.aggregates
            .iter()
            .map(|entry| entry.value().stats())
            .sum()
    }

    fn local(&self, project: &ProjectId) -> IndexResult<Arc<KeyedIndexCache<E>>> {
        let project = self
            .graph
            .project(project)
            .ok_or_else(|| IndexError::UnknownProject(project.clone()))?;
        Ok(self.locals.cache_for(&project))
    }

    fn aggregate(&self, project: &ProjectId) -> Arc<LazyBuckets<E::Key>> {
        self.aggregates
            .entry(project.clone())
            .or_insert_with(|| Arc::new(LazyBuckets::new()))
            .clone()
    }

    fn existing_aggregate(&self, project: &ProjectId) -> Option<Arc<LazyBuckets<E::Key>>> {
        self.aggregates.get(project).map(|entry| entry.value().clone())
    }

    fn build_aggregate(&self, project: &ProjectId) -> IndexResult<IndexBuckets<E::Key>> {
        let started = Instant::now();
        let closure = self.graph.reexport_closure(project);

        // Members named by an edge but not registered contribute nothing.
        let mut members: Vec<_> = closure
            .iter()
            .filter_map(|id| self.graph.project(id))
            .map(|member| self.locals.cache_for(&member))
            .collect();
        members.sort_by(|a, b| a.project_id().cmp(b.project_id()));

        // Sequential: a member rebuild holds its lock while waiting on the
        // pool, so pool jobs must never take cache locks themselves.
        let mut buckets = IndexBuckets::new();
        for member in &members {
            buckets.merge_from(member.entries()?);
        }

        crate::debug_event!(
            "index",
            "aggregated",
            "{} {project}: {} of {} closure members, {} files in {:?}",
            self.extractor().name(),
            members.len(),
            closure.len(),
            buckets.file_count(),
            started.elapsed()
        );
        Ok(buckets)
    }
}
