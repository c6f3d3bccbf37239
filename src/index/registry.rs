use std::sync::Arc;

use dashmap::DashMap;

use super::{BuildOptions, CacheStats, KeyExtractor, KeyedIndexCache};
use crate::project::Project;
use crate::types::ProjectId;

/// One cache per project for a single key strategy, created on first use.
pub struct ProjectCaches<E: KeyExtractor> {
    extractor: Arc<E>,
    options: BuildOptions,
    caches: DashMap<ProjectId, Arc<KeyedIndexCache<E>>>,
}

impl<E: KeyExtractor> ProjectCaches<E> {
    pub fn new(extractor: E, options: BuildOptions) -> Self {
        Self {
            extractor: Arc::new(extractor),
            options,
            caches: DashMap::new(),
        }
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// The cache for `project`, creating an unbuilt one if needed.
    ///
    /// The returned handle is detached from the map, so builds never run
    /// while a shard lock is held.
    pub fn cache_for(&self, project: &Arc<dyn Project>) -> Arc<KeyedIndexCache<E>> {
        self.caches
            .entry(project.id().clone())
            .or_insert_with(|| {
                Arc::new(KeyedIndexCache::new(
                    project.clone(),
                    self.extractor.clone(),
                    self.options.clone(),
                ))
            })
            .clone()
    }

    pub fn existing(&self, id: &ProjectId) -> Option<Arc<KeyedIndexCache<E>>> {
        self.caches.get(id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, id: &ProjectId) -> Option<Arc<KeyedIndexCache<E>>> {
        self.caches.remove(id).map(|(_, cache)| cache)
    }

    pub fn stats(&self) -> CacheStats {
        self.caches.iter().map(|entry| entry.value().stats()).sum()
    }

    pub fn len(&self) -> usize {
        self.caches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.caches.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::UnqualifiedNameKey;
    use crate::project::MemoryProject;
    use crate::types::ObjectType;

    #[test]
    fn test_cache_is_shared_per_project() {
        let caches = ProjectCaches::new(
            UnqualifiedNameKey::new(ObjectType::ProductComponent),
            BuildOptions::sequential(),
        );
        let base: Arc<dyn Project> = MemoryProject::new("base");
        let other: Arc<dyn Project> = MemoryProject::new("other");

        let first = caches.cache_for(&base);
        let second = caches.cache_for(&base);
        caches.cache_for(&other);

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(caches.len(), 2);

        assert!(caches.remove(base.id()).is_some());
        assert!(caches.existing(base.id()).is_none());
        assert_eq!(caches.stats().caches, 1);
    }
}
