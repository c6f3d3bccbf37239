//! Incrementally maintained key indexes over model source files.
//!
//! Answers queries such as "which product components carry runtime id X" or
//! "which table contents reference structure Y" without scanning projects on
//! every call. Indexes build lazily per project, follow change batches, and
//! aggregate across the project dependency graph along reexported edges.

pub mod logging;

pub mod config;
pub mod facade;
pub mod index;
pub mod project;
pub mod types;
pub mod updater;

pub use config::Settings;
pub use facade::{ModelIndex, ModelIndexStats};
pub use index::{
    CacheStats, CrossProjectIndex, IndexError, IndexResult, KeyExtractor, KeyedIndexCache,
    RuntimeIdIndex, SingleProjectIndex, TableUsageIndex, UnqualifiedNameIndex,
};
pub use project::{
    DependencyEdge, Project, ProjectGraph, SourceError, SourceFile, SourceFileId, SourceFileRef,
};
pub use types::{DeltaKind, ObjectType, ProjectId, QualifiedName};
pub use updater::{ChangeBatch, ChangeUpdater, FileDelta, UpdateStats};
