//! Key to file-set map with a reverse file to key map.
//!
//! The reverse map keeps every file in at most one bucket and makes removal
//! identity based: a deleted file cannot have its key derived again.

use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;

use indexmap::IndexSet;

use crate::project::SourceFileRef;

/// Effect of one update on a file's bucket membership.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketChange<K> {
    pub file: SourceFileRef,
    /// Bucket the file was in before the update.
    pub old: Option<K>,
    /// Bucket the file is in after the update.
    pub new: Option<K>,
}

impl<K: PartialEq> BucketChange<K> {
    pub fn is_noop(&self) -> bool {
        self.old == self.new
    }
}

#[derive(Debug, Clone)]
pub struct IndexBuckets<K> {
    buckets: HashMap<K, IndexSet<SourceFileRef>>,
    keys: HashMap<SourceFileRef, K>,
}

impl<K> Default for IndexBuckets<K> {
    fn default() -> Self {
        Self {
            buckets: HashMap::new(),
            keys: HashMap::new(),
        }
    }
}

impl<K: Clone + Eq + Hash> IndexBuckets<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(files: usize) -> Self {
        Self {
            buckets: HashMap::with_capacity(files),
            keys: HashMap::with_capacity(files),
        }
    }

    /// Put `file` into the bucket for `key`, or into no bucket for `None`.
    ///
    /// Moves the file out of its previous bucket first. The stored handle is
    /// replaced by `file` so the newest handle for an identity wins.
    pub fn assign(&mut self, file: SourceFileRef, key: Option<K>) -> BucketChange<K> {
        let old = self.keys.remove(&file);

        if let Some(old_key) = &old {
            if let Some(bucket) = self.buckets.get_mut(old_key) {
                bucket.swap_remove(&file);
                if bucket.is_empty() {
                    self.buckets.remove(old_key);
                }
            }
        }

        if let Some(new_key) = &key {
            self.buckets
                .entry(new_key.clone())
                .or_default()
                .replace(file.clone());
            self.keys.insert(file.clone(), new_key.clone());
        }

        BucketChange {
            file,
            old,
            new: key,
        }
    }

    pub fn insert(&mut self, file: SourceFileRef, key: K) -> BucketChange<K> {
        self.assign(file, Some(key))
    }

    /// Remove `file` from whatever bucket holds it. No-op when absent.
    pub fn remove(&mut self, file: &SourceFileRef) -> BucketChange<K> {
        self.assign(file.clone(), None)
    }

    /// Files in the bucket for `key`, empty when there is none.
    pub fn get<Q>(&self, key: &Q) -> Vec<SourceFileRef>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.buckets
            .get(key)
            .map(|bucket| bucket.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn key_of(&self, file: &SourceFileRef) -> Option<&K> {
        self.keys.get(file)
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.buckets.keys()
    }

    /// Every indexed file with its key.
    pub fn entries(&self) -> impl Iterator<Item = (&SourceFileRef, &K)> {
        self.keys.iter()
    }

    /// Add entries taken from another index.
    pub fn merge_from(&mut self, entries: impl IntoIterator<Item = (SourceFileRef, K)>) {
        for (file, key) in entries {
            self.assign(file, Some(key));
        }
    }

    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn file_count(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::MemoryProject;
    use crate::types::ObjectType;

    fn file(project: &MemoryProject, name: &str) -> SourceFileRef {
        project.new_file(name, ObjectType::ProductComponent).handle()
    }

    #[test]
    fn test_insert_is_idempotent() {
        let project = MemoryProject::new("base");
        let a = file(&project, "p.A");
        let mut buckets = IndexBuckets::new();

        let first = buckets.insert(a.clone(), "id".to_string());
        let second = buckets.insert(a.clone(), "id".to_string());

        assert!(!first.is_noop());
        assert!(second.is_noop());
        assert_eq!(buckets.get("id"), vec![a]);
        assert_eq!(buckets.file_count(), 1);
    }

    #[test]
    fn test_insert_then_remove_restores_state() {
        let project = MemoryProject::new("base");
        let a = file(&project, "p.A");
        let b = file(&project, "p.B");
        let mut buckets = IndexBuckets::new();
        buckets.insert(b.clone(), "id".to_string());

        buckets.insert(a.clone(), "id".to_string());
        buckets.remove(&a);

        assert_eq!(buckets.get("id"), vec![b]);
        assert_eq!(buckets.key_count(), 1);
        assert_eq!(buckets.file_count(), 1);
    }

    #[test]
    fn test_reassign_moves_between_buckets() {
        let project = MemoryProject::new("base");
        let a = file(&project, "p.A");
        let mut buckets = IndexBuckets::new();
        buckets.insert(a.clone(), "old".to_string());

        let change = buckets.insert(a.clone(), "new".to_string());

        assert_eq!(change.old.as_deref(), Some("old"));
        assert_eq!(change.new.as_deref(), Some("new"));
        assert!(buckets.get("old").is_empty());
        assert_eq!(buckets.get("new"), vec![a.clone()]);
        assert_eq!(buckets.key_of(&a).map(String::as_str), Some("new"));
        // Empty buckets are dropped
        assert_eq!(buckets.key_count(), 1);
    }

    #[test]
    fn test_remove_absent_file_is_noop() {
        let project = MemoryProject::new("base");
        let a = file(&project, "p.A");
        let mut buckets: IndexBuckets<String> = IndexBuckets::new();

        let change = buckets.remove(&a);

        assert!(change.is_noop());
        assert!(buckets.is_empty());
    }

    #[test]
    fn test_merge_unions_entries() {
        let base = MemoryProject::new("base");
        let motor = MemoryProject::new("motor");
        let mut left = IndexBuckets::new();
        left.insert(file(&base, "p.A"), "s".to_string());
        let mut right = IndexBuckets::new();
        right.insert(file(&motor, "p.A"), "s".to_string());

        left.merge_from(right.entries().map(|(f, k)| (f.clone(), k.clone())));

        assert_eq!(left.get("s").len(), 2);
    }
}
