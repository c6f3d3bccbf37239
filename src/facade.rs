//! ModelIndex - the workspace-owned entry point to the indexes.
//!
//! Holds the project graph, the three concrete indexes and the updater that
//! keeps them current. Whoever owns the workspace context owns one of these;
//! there is no process-wide registry.
//!
//! ## Architecture
//!
//! ```text
//! ModelIndex
//!   ├── ProjectGraph (Arc) - projects, dependency edges, reexport closures
//!   ├── RuntimeIdIndex (Arc) - product components by runtime id
//!   ├── UnqualifiedNameIndex (Arc) - product components by unqualified name
//!   ├── TableUsageIndex (Arc) - table contents by referenced structure
//!   └── ChangeUpdater - routes change batches to all three
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let index = ModelIndex::new(Arc::new(Settings::load()?));
//! index.add_project(project);
//! let components = index.find_by_runtime_id(&id, "rid-42")?;
//! index.apply_changes(&batch);
//! ```

use std::sync::Arc;

use crate::config::Settings;
use crate::index::{
    CacheStats, IndexResult, RuntimeIdIndex, TableUsageIndex, UnqualifiedNameIndex,
};
use crate::project::{Project, ProjectGraph, SourceFileRef};
use crate::types::ProjectId;
use crate::updater::{
    ChangeBatch, ChangeUpdater, CrossProjectHandler, SingleProjectHandler, UpdateStats,
};

/// Cache counters of every index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModelIndexStats {
    pub runtime_id: CacheStats,
    pub unqualified_name: CacheStats,
    pub table_usage: CacheStats,
    /// Aggregates of the table usage index over reexport closures.
    pub table_usage_aggregates: CacheStats,
}

pub struct ModelIndex {
    graph: Arc<ProjectGraph>,
    runtime_ids: Arc<RuntimeIdIndex>,
    unqualified_names: Arc<UnqualifiedNameIndex>,
    table_usages: Arc<TableUsageIndex>,
    updater: ChangeUpdater,
    settings: Arc<Settings>,
}

impl ModelIndex {
    pub fn new(settings: Arc<Settings>) -> Self {
        let graph = Arc::new(ProjectGraph::new());
        let options = settings.index.build_options();

        let runtime_ids = Arc::new(RuntimeIdIndex::new(
            graph.clone(),
            settings.index.runtime_id_key(),
            options.clone(),
        ));
        let unqualified_names = Arc::new(UnqualifiedNameIndex::new(
            graph.clone(),
            settings.index.unqualified_name_key(),
            options.clone(),
        ));
        let table_usages = Arc::new(TableUsageIndex::new(
            graph.clone(),
            settings.index.table_usage_key(),
            options,
        ));

        let updater = ChangeUpdater::builder(graph.clone())
            .handler(SingleProjectHandler::new(runtime_ids.clone()))
            .handler(SingleProjectHandler::new(unqualified_names.clone()))
            .handler(CrossProjectHandler::new(table_usages.clone()))
            .build();

        Self {
            graph,
            runtime_ids,
            unqualified_names,
            table_usages,
            updater,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn graph(&self) -> &Arc<ProjectGraph> {
        &self.graph
    }

    pub fn runtime_ids(&self) -> &Arc<RuntimeIdIndex> {
        &self.runtime_ids
    }

    pub fn unqualified_names(&self) -> &Arc<UnqualifiedNameIndex> {
        &self.unqualified_names
    }

    pub fn table_usages(&self) -> &Arc<TableUsageIndex> {
        &self.table_usages
    }

    pub fn updater(&self) -> &ChangeUpdater {
        &self.updater
    }

    /// Register a project. Replacing a registered project with the same id
    /// drops its caches.
    pub fn add_project(&self, project: Arc<dyn Project>) {
        let id = project.id().clone();
        if self.graph.contains(&id) {
            self.updater.project_removed(&id);
        }

        let change = self.graph.add_project(project);
        let invalidated = self.updater.graph_changed(&change.affected);
        crate::log_event!(
            "graph",
            "project added",
            "{id}, {invalidated} caches invalidated"
        );
    }

    /// Dispose of a project and every cache built for it.
    pub fn remove_project(&self, id: &ProjectId) -> bool {
        if !self.graph.contains(id) {
            return false;
        }

        let change = self.graph.remove_project(id);
        self.updater.project_removed(id);
        let invalidated = self.updater.graph_changed(&change.affected);
        crate::log_event!(
            "graph",
            "project removed",
            "{id}, {invalidated} caches invalidated"
        );
        true
    }

    /// Product components of `project` with the given runtime id.
    pub fn find_by_runtime_id(
        &self,
        project: &ProjectId,
        runtime_id: &str,
    ) -> IndexResult<Vec<SourceFileRef>> {
        self.runtime_ids.get(project, runtime_id).map(sorted)
    }

    /// Product components of `project` whose unqualified name is `name`.
    pub fn find_by_unqualified_name(
        &self,
        project: &ProjectId,
        name: &str,
    ) -> IndexResult<Vec<SourceFileRef>> {
        self.unqualified_names.get(project, name).map(sorted)
    }

    /// Table contents referencing `structure`, in `project` and everything its
    /// reexport closure reaches.
    pub fn find_table_usages(
        &self,
        project: &ProjectId,
        structure: &str,
    ) -> IndexResult<Vec<SourceFileRef>> {
        self.table_usages.get(project, structure).map(sorted)
    }

    /// Table contents referencing `structure` in `project` alone.
    pub fn find_local_table_usages(
        &self,
        project: &ProjectId,
        structure: &str,
    ) -> IndexResult<Vec<SourceFileRef>> {
        self.table_usages.get_local(project, structure).map(sorted)
    }

    pub fn apply_changes(&self, batch: &ChangeBatch) -> UpdateStats {
        self.updater.apply(batch)
    }

    /// Force every index to rescan `project` on its next query.
    pub fn invalidate(&self, project: &ProjectId) -> bool {
        self.updater.invalidate(project)
    }

    pub fn stats(&self) -> ModelIndexStats {
        ModelIndexStats {
            runtime_id: self.runtime_ids.stats(),
            unqualified_name: self.unqualified_names.stats(),
            table_usage: self.table_usages.stats(),
            table_usage_aggregates: self.table_usages.aggregate_stats(),
        }
    }
}

fn sorted(mut files: Vec<SourceFileRef>) -> Vec<SourceFileRef> {
    files.sort_by(|a, b| {
        a.qualified_name()
            .cmp(b.qualified_name())
            .then_with(|| a.project().cmp(b.project()))
    });
    files
}
