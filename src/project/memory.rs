//! In-memory implementation of the project and source file contracts.
//!
//! Hosts without a file based model (and the test-suite) use these to feed
//! the indexes. Every mutation is visible immediately; reporting it to the
//! indexes is up to the caller, by sending the matching change batch.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::{DependencyEdge, Project, SourceError, SourceFile, SourceFileRef, SourceResult};
use crate::types::{ObjectType, ProjectId, QualifiedName};

/// A source file whose properties live in memory.
#[derive(Debug)]
pub struct MemorySourceFile {
    project: ProjectId,
    qualified_name: QualifiedName,
    object_type: ObjectType,
    properties: RwLock<HashMap<String, String>>,
    exists: AtomicBool,
    unreadable: AtomicBool,
}

impl MemorySourceFile {
    pub fn new(project: &ProjectId, qualified_name: &str, object_type: ObjectType) -> Arc<Self> {
        Arc::new(Self {
            project: project.clone(),
            qualified_name: QualifiedName::new(qualified_name),
            object_type,
            properties: RwLock::new(HashMap::new()),
            exists: AtomicBool::new(true),
            unreadable: AtomicBool::new(false),
        })
    }

    /// Handle for index queries and change deltas.
    pub fn handle(self: &Arc<Self>) -> SourceFileRef {
        SourceFileRef::from(self.clone())
    }

    pub fn set_property(&self, name: &str, value: &str) {
        self.properties
            .write()
            .insert(name.to_string(), value.to_string());
    }

    pub fn clear_property(&self, name: &str) {
        self.properties.write().remove(name);
    }

    pub fn set_exists(&self, exists: bool) {
        self.exists.store(exists, Ordering::SeqCst);
    }

    /// Make every property read fail, as for corrupt content.
    pub fn set_unreadable(&self, unreadable: bool) {
        self.unreadable.store(unreadable, Ordering::SeqCst);
    }
}

impl SourceFile for MemorySourceFile {
    fn qualified_name(&self) -> &QualifiedName {
        &self.qualified_name
    }

    fn object_type(&self) -> ObjectType {
        self.object_type
    }

    fn project(&self) -> &ProjectId {
        &self.project
    }

    fn exists(&self) -> bool {
        self.exists.load(Ordering::SeqCst)
    }

    fn property(&self, name: &str) -> SourceResult<Option<String>> {
        if self.unreadable.load(Ordering::SeqCst) {
            return Err(SourceError::PropertyRead {
                file: self.qualified_name.clone(),
                property: name.to_string(),
                reason: "content is not readable".to_string(),
            });
        }
        Ok(self.properties.read().get(name).cloned())
    }
}

/// A project whose source files and dependencies live in memory.
pub struct MemoryProject {
    id: ProjectId,
    files: RwLock<IndexMap<(QualifiedName, ObjectType), Arc<MemorySourceFile>>>,
    dependencies: RwLock<Vec<DependencyEdge>>,
    fail_enumeration: AtomicBool,
    enumerations: AtomicUsize,
}

impl MemoryProject {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: ProjectId::new(id),
            files: RwLock::new(IndexMap::new()),
            dependencies: RwLock::new(Vec::new()),
            fail_enumeration: AtomicBool::new(false),
            enumerations: AtomicUsize::new(0),
        })
    }

    /// Create a file inside this project's source roots.
    pub fn new_file(&self, qualified_name: &str, object_type: ObjectType) -> Arc<MemorySourceFile> {
        let file = MemorySourceFile::new(&self.id, qualified_name, object_type);
        self.add_file(file.clone());
        file
    }

    /// Put a file into this project's source roots, replacing any file with
    /// the same qualified name and object type.
    pub fn add_file(&self, file: Arc<MemorySourceFile>) {
        let key = (file.qualified_name.clone(), file.object_type);
        self.files.write().insert(key, file);
    }

    /// Delete a file: it leaves the source roots and stops existing.
    pub fn delete_file(
        &self,
        qualified_name: &str,
        object_type: ObjectType,
    ) -> Option<Arc<MemorySourceFile>> {
        let file = self.detach_file(qualified_name, object_type)?;
        file.set_exists(false);
        Some(file)
    }

    /// Move a file out of the source roots. The resource still exists.
    pub fn detach_file(
        &self,
        qualified_name: &str,
        object_type: ObjectType,
    ) -> Option<Arc<MemorySourceFile>> {
        let key = (QualifiedName::new(qualified_name), object_type);
        self.files.write().shift_remove(&key)
    }

    pub fn file(&self, qualified_name: &str, object_type: ObjectType) -> Option<Arc<MemorySourceFile>> {
        let key = (QualifiedName::new(qualified_name), object_type);
        self.files.read().get(&key).cloned()
    }

    pub fn set_dependencies(&self, edges: Vec<DependencyEdge>) {
        *self.dependencies.write() = edges;
    }

    /// Make full enumerations fail, as for an unreadable source root.
    pub fn set_fail_enumeration(&self, fail: bool) {
        self.fail_enumeration.store(fail, Ordering::SeqCst);
    }

    /// Number of `find_all_source_files` calls served so far.
    pub fn enumeration_count(&self) -> usize {
        self.enumerations.load(Ordering::SeqCst)
    }
}

impl Project for MemoryProject {
    fn id(&self) -> &ProjectId {
        &self.id
    }

    fn dependency_edges(&self) -> Vec<DependencyEdge> {
        self.dependencies.read().clone()
    }

    fn find_all_source_files(&self, object_type: ObjectType) -> SourceResult<Vec<SourceFileRef>> {
        self.enumerations.fetch_add(1, Ordering::SeqCst);
        if self.fail_enumeration.load(Ordering::SeqCst) {
            return Err(SourceError::Enumerate {
                project: self.id.clone(),
                object_type,
                reason: "source root is not readable".to_string(),
            });
        }

        Ok(self
            .files
            .read()
            .values()
            .filter(|file| file.object_type == object_type)
            .map(|file| file.handle())
            .collect())
    }

    fn owns(&self, file: &dyn SourceFile) -> bool {
        file.project() == &self.id
            && self
                .files
                .read()
                .contains_key(&(file.qualified_name().clone(), file.object_type()))
    }
}
