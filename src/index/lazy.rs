//! Lazily built bucket map guarded by a read/write lock.
//!
//! The first reader that finds the map unbuilt takes the write lock, checks
//! again and builds. Other readers block on the lock until the build is
//! published; none of them sees a partial map. A failed build leaves the map
//! unbuilt so the next reader retries.

use std::hash::Hash;

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::{CacheStats, IndexBuckets, IndexResult};

pub(crate) struct LazyState<K> {
    built: bool,
    buckets: IndexBuckets<K>,
    build_count: usize,
}

impl<K> LazyState<K> {
    pub(crate) fn buckets(&self) -> &IndexBuckets<K> {
        &self.buckets
    }
}

pub(crate) struct LazyBuckets<K> {
    state: RwLock<LazyState<K>>,
}

impl<K: Clone + Eq + Hash> LazyBuckets<K> {
    pub(crate) fn new() -> Self {
        Self {
            state: RwLock::new(LazyState {
                built: false,
                buckets: IndexBuckets::new(),
                build_count: 0,
            }),
        }
    }

    /// Read access to the built map, building it with `build` first if needed.
    pub(crate) fn read_built<F>(&self, build: F) -> IndexResult<RwLockReadGuard<'_, LazyState<K>>>
    where
        F: FnOnce() -> IndexResult<IndexBuckets<K>>,
    {
        {
            let state = self.state.read();
            if state.built {
                return Ok(state);
            }
        }

        let mut state = self.state.write();
        if !state.built {
            state.buckets = build()?;
            state.built = true;
            state.build_count += 1;
        }
        Ok(RwLockWriteGuard::downgrade(state))
    }

    /// Apply `update` to the map if it is built. Unbuilt maps pick the change
    /// up on their first build.
    pub(crate) fn update<R>(&self, update: impl FnOnce(&mut IndexBuckets<K>) -> R) -> Option<R> {
        let mut state = self.state.write();
        if !state.built {
            return None;
        }
        Some(update(&mut state.buckets))
    }

    /// Drop the map; the next read rebuilds it.
    pub(crate) fn invalidate(&self) -> bool {
        let mut state = self.state.write();
        let was_built = state.built;
        state.built = false;
        state.buckets = IndexBuckets::new();
        was_built
    }

    pub(crate) fn is_built(&self) -> bool {
        self.state.read().built
    }

    pub(crate) fn stats(&self) -> CacheStats {
        let state = self.state.read();
        CacheStats {
            caches: 1,
            built: usize::from(state.built),
            build_count: state.build_count,
            key_count: state.buckets.key_count(),
            file_count: state.buckets.file_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexError;
    use crate::project::{MemoryProject, SourceError};
    use crate::types::{ObjectType, ProjectId};

    #[test]
    fn test_builds_once() {
        let lazy: LazyBuckets<String> = LazyBuckets::new();
        let mut calls = 0;

        for _ in 0..3 {
            let state = lazy
                .read_built(|| {
                    calls += 1;
                    Ok(IndexBuckets::new())
                })
                .unwrap();
            assert!(state.buckets().is_empty());
        }

        assert_eq!(calls, 1);
        assert_eq!(lazy.stats().build_count, 1);
    }

    #[test]
    fn test_failed_build_is_retried() {
        let lazy: LazyBuckets<String> = LazyBuckets::new();

        let result = lazy.read_built(|| {
            Err(IndexError::Source(SourceError::Enumerate {
                project: ProjectId::new("base"),
                object_type: ObjectType::ProductComponent,
                reason: "offline".to_string(),
            }))
        });
        assert!(result.is_err());
        drop(result);
        assert!(!lazy.is_built());

        let project = MemoryProject::new("base");
        let file = project.new_file("p.A", ObjectType::ProductComponent).handle();
        let state = lazy
            .read_built(|| {
                let mut buckets = IndexBuckets::new();
                buckets.insert(file.clone(), "k".to_string());
                Ok(buckets)
            })
            .unwrap();
        assert_eq!(state.buckets().get("k"), vec![file]);
    }

    #[test]
    fn test_update_skips_unbuilt_map() {
        let lazy: LazyBuckets<String> = LazyBuckets::new();
        assert!(lazy.update(|_| ()).is_none());

        drop(lazy.read_built(|| Ok(IndexBuckets::new())).unwrap());
        assert!(lazy.update(|_| ()).is_some());

        assert!(lazy.invalidate());
        assert!(!lazy.is_built());
        assert!(lazy.update(|_| ()).is_none());
    }
}
