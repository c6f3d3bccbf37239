//! Contracts for the external project graph provider and source file repository.
//!
//! The indexes never look at file content or dependency configuration
//! directly. Everything they need goes through these two traits, which the
//! hosting tool implements on top of its own model.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::Deref;
use std::sync::Arc;

use super::SourceResult;
use crate::types::{ObjectType, ProjectId, QualifiedName};

/// A dependency of one project on another.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyEdge {
    pub target: ProjectId,
    /// Whether content of `target` is visible to projects depending on the
    /// edge's owner.
    pub reexported: bool,
}

impl DependencyEdge {
    pub fn new(target: impl Into<ProjectId>, reexported: bool) -> Self {
        Self {
            target: target.into(),
            reexported,
        }
    }
}

/// One source file holding one model object.
pub trait SourceFile: Send + Sync + fmt::Debug {
    fn qualified_name(&self) -> &QualifiedName;

    fn object_type(&self) -> ObjectType;

    /// Project the file belongs to.
    fn project(&self) -> &ProjectId;

    /// Whether the underlying resource still exists.
    fn exists(&self) -> bool;

    /// Read a named property from the file's content.
    ///
    /// `Ok(None)` means the property is not set. An error means the content
    /// could not be read or parsed.
    fn property(&self, name: &str) -> SourceResult<Option<String>>;
}

/// A project of the workspace.
pub trait Project: Send + Sync {
    fn id(&self) -> &ProjectId;

    /// Current dependency edges, in declaration order.
    fn dependency_edges(&self) -> Vec<DependencyEdge>;

    /// Enumerate the project's current source files of one object type.
    ///
    /// Only called for full rebuilds.
    fn find_all_source_files(&self, object_type: ObjectType) -> SourceResult<Vec<SourceFileRef>>;

    /// Whether `file` lies inside this project's source roots.
    fn owns(&self, file: &dyn SourceFile) -> bool {
        file.project() == self.id()
    }
}

/// Identity of a source file: owning project, qualified name and object type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceFileId {
    pub project: ProjectId,
    pub qualified_name: QualifiedName,
    pub object_type: ObjectType,
}

impl fmt::Display for SourceFileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} ({})",
            self.project, self.qualified_name, self.object_type
        )
    }
}

/// Shared handle to a source file.
///
/// Equality and hashing use the file's identity, so a handle obtained from a
/// change notification matches the handle stored during a rebuild.
#[derive(Clone)]
pub struct SourceFileRef(Arc<dyn SourceFile>);

impl SourceFileRef {
    pub fn new(file: Arc<dyn SourceFile>) -> Self {
        Self(file)
    }

    pub fn id(&self) -> SourceFileId {
        SourceFileId {
            project: self.0.project().clone(),
            qualified_name: self.0.qualified_name().clone(),
            object_type: self.0.object_type(),
        }
    }

    fn identity(&self) -> (&ProjectId, &QualifiedName, ObjectType) {
        (
            self.0.project(),
            self.0.qualified_name(),
            self.0.object_type(),
        )
    }
}

impl<T: SourceFile + 'static> From<Arc<T>> for SourceFileRef {
    fn from(file: Arc<T>) -> Self {
        Self(file)
    }
}

impl Deref for SourceFileRef {
    type Target = dyn SourceFile;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for SourceFileRef {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl Eq for SourceFileRef {}

impl Hash for SourceFileRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl fmt::Debug for SourceFileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SourceFileRef").field(&self.id()).finish()
    }
}
