//! Keyed index cache for one project and one key extraction strategy.

use std::borrow::Borrow;
use std::hash::Hash;
use std::sync::Arc;
use std::time::Instant;

use super::lazy::LazyBuckets;
use super::{BucketChange, BuildOptions, CacheStats, IndexBuckets, IndexResult, KeyExtractor};
use crate::project::{Project, SourceFileRef};
use crate::types::{DeltaKind, ProjectId};

/// Map from derived key to the project's source files producing it.
///
/// Built on the first query by enumerating the project's files, then kept
/// current through [`KeyedIndexCache::apply_change`].
pub struct KeyedIndexCache<E: KeyExtractor> {
    project: Arc<dyn Project>,
    extractor: Arc<E>,
    options: BuildOptions,
    lazy: LazyBuckets<E::Key>,
}

impl<E: KeyExtractor> KeyedIndexCache<E> {
    pub fn new(project: Arc<dyn Project>, extractor: Arc<E>, options: BuildOptions) -> Self {
        Self {
            project,
            extractor,
            options,
            lazy: LazyBuckets::new(),
        }
    }

    pub fn project_id(&self) -> &ProjectId {
        self.project.id()
    }

    /// Files whose derived key equals `key`. Builds the cache on first use.
    pub fn get<Q>(&self, key: &Q) -> IndexResult<Vec<SourceFileRef>>
    where
        E::Key: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let state = self.lazy.read_built(|| self.rebuild())?;
        Ok(state.buckets().get(key))
    }

    /// Every key currently indexed, sorted.
    pub fn keys(&self) -> IndexResult<Vec<E::Key>> {
        let state = self.lazy.read_built(|| self.rebuild())?;
        let mut keys: Vec<_> = state.buckets().keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    /// Every indexed file with its key. Builds the cache on first use.
    pub fn entries(&self) -> IndexResult<Vec<(SourceFileRef, E::Key)>> {
        let state = self.lazy.read_built(|| self.rebuild())?;
        Ok(state
            .buckets()
            .entries()
            .map(|(file, key)| (file.clone(), key.clone()))
            .collect())
    }

    /// Bring one file's membership up to date.
    ///
    /// Returns the effective change, or `None` when nothing moved: the file
    /// has another object type, the cache is not built yet, or the file
    /// already sits in the right bucket.
    pub fn apply_change(
        &self,
        file: &SourceFileRef,
        kind: DeltaKind,
    ) -> Option<BucketChange<E::Key>> {
        if file.object_type() != self.extractor.object_type() || !self.lazy.is_built() {
            return None;
        }

        // Derive outside the lock: property reads may touch the file's content.
        let key = match kind {
            DeltaKind::Removed => None,
            DeltaKind::Added | DeltaKind::Changed => {
                if file.exists() && self.project.owns(&**file) {
                    self.extractor.extract(&**file)
                } else {
                    None
                }
            }
        };

        let change = self
            .lazy
            .update(|buckets| buckets.assign(file.clone(), key))?;

        if change.is_noop() {
            return None;
        }
        tracing::trace!(
            "[index] {} {}: {} {:?} -> {:?}",
            self.extractor.name(),
            self.project.id(),
            file.qualified_name(),
            change.old,
            change.new
        );
        Some(change)
    }

    /// Drop the built map; the next query rescans the project.
    pub fn invalidate(&self) -> bool {
        self.lazy.invalidate()
    }

    pub fn is_built(&self) -> bool {
        self.lazy.is_built()
    }

    pub fn stats(&self) -> CacheStats {
        self.lazy.stats()
    }

    fn rebuild(&self) -> IndexResult<IndexBuckets<E::Key>> {
        let started = Instant::now();
        let object_type = self.extractor.object_type();

        let files = match self.project.find_all_source_files(object_type) {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!(
                    "[index] {} rebuild of {} failed: {e}",
                    self.extractor.name(),
                    self.project.id()
                );
                return Err(e.into());
            }
        };

        let keyed = self
            .options
            .map(&files, |file| (file.clone(), self.extractor.extract(&**file)));

        let mut buckets = IndexBuckets::with_capacity(keyed.len());
        for (file, key) in keyed {
            if let Some(key) = key {
                buckets.insert(file, key);
            }
        }

        crate::debug_event!(
            "index",
            "rebuilt",
            "{} {}: {} files, {} keyed, {} keys in {:?}",
            self.extractor.name(),
            self.project.id(),
            files.len(),
            buckets.file_count(),
            buckets.key_count(),
            started.elapsed()
        );
        Ok(buckets)
    }
}
