//! Projects, source files and the dependency graph between projects.
//!
//! # Architecture
//!
//! ```text
//! ProjectGraph
//!   - petgraph StableDiGraph<ProjectId, reexported>
//!   - registered Arc<dyn Project> per id
//!   - cached reexport closure per project
//!         |
//!   Project (external) ── find_all_source_files ──> SourceFileRef
//!                                                      |
//!                                          SourceFile (external)
//! ```

mod error;
mod graph;
pub mod memory;
mod source;

pub use error::{SourceError, SourceResult};
pub use graph::{GraphChange, ProjectGraph};
pub use memory::{MemoryProject, MemorySourceFile};
pub use source::{DependencyEdge, Project, SourceFile, SourceFileId, SourceFileRef};
