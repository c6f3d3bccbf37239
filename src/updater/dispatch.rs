//! Change updater: routes change batches to the registered index handlers.

use std::sync::Arc;

use crossbeam_channel::Receiver;
use indexmap::IndexMap;

use super::{ChangeBatch, FileDelta, IndexHandler};
use crate::project::ProjectGraph;
use crate::types::ProjectId;

/// Outcome of one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateStats {
    /// File deltas handed to the handlers.
    pub applied: usize,
    /// File deltas dropped because their project is not tracked.
    pub ignored: usize,
    /// Deltas that moved a file between buckets, summed over handlers.
    pub changed: usize,
    /// Projects the batch touched.
    pub projects: usize,
    /// Caches dropped because dependency edges changed.
    pub invalidated: usize,
}

impl UpdateStats {
    fn absorb(&mut self, other: UpdateStats) {
        self.applied += other.applied;
        self.ignored += other.ignored;
        self.changed += other.changed;
        self.projects += other.projects;
        self.invalidated += other.invalidated;
    }
}

/// Applies change batches to every registered index.
///
/// Batches are applied one at a time: `apply` takes `&self` but callers are
/// expected to drive it from a single notification thread.
pub struct ChangeUpdater {
    graph: Arc<ProjectGraph>,
    handlers: Vec<Arc<dyn IndexHandler>>,
}

impl ChangeUpdater {
    pub fn builder(graph: Arc<ProjectGraph>) -> ChangeUpdaterBuilder {
        ChangeUpdaterBuilder::new(graph)
    }

    pub fn handlers(&self) -> &[Arc<dyn IndexHandler>] {
        &self.handlers
    }

    /// Apply one batch.
    ///
    /// Dependency changes are synced into the graph first so file deltas are
    /// propagated along the current edges. File deltas are then grouped by
    /// owning project, keeping their order within each project.
    pub fn apply(&self, batch: &ChangeBatch) -> UpdateStats {
        let mut stats = UpdateStats::default();

        for project in &batch.dependency_changes {
            let change = self.graph.sync_edges(project);
            if change.is_empty() {
                continue;
            }
            stats.invalidated += self.graph_changed(&change.affected);
        }

        let mut grouped: IndexMap<&ProjectId, Vec<FileDelta>> = IndexMap::new();
        for delta in &batch.files {
            let project = delta.file.project();
            if !self.graph.contains(project) {
                crate::debug_event!(
                    "updater",
                    "untracked",
                    "{:?} {}",
                    delta.kind,
                    delta.file.id()
                );
                stats.ignored += 1;
                continue;
            }
            grouped.entry(project).or_default().push(delta.clone());
        }

        stats.projects = grouped.len();
        for (project, deltas) in &grouped {
            stats.applied += deltas.len();
            for handler in &self.handlers {
                let changed = handler.apply(project, deltas);
                if changed > 0 {
                    crate::debug_event!(
                        handler.name(),
                        "updated",
                        "{project}: {changed} of {} deltas",
                        deltas.len()
                    );
                }
                stats.changed += changed;
            }
        }

        if !batch.is_empty() {
            crate::log_event!(
                "updater",
                "batch applied",
                "{} deltas over {} projects, {} changed, {} ignored, {} caches invalidated",
                stats.applied,
                stats.projects,
                stats.changed,
                stats.ignored,
                stats.invalidated
            );
        }
        stats
    }

    /// Tell every handler which projects may see a different closure now.
    pub fn graph_changed(&self, affected: &[ProjectId]) -> usize {
        self.handlers
            .iter()
            .map(|handler| handler.graph_changed(affected))
            .sum()
    }

    /// Drop every cache held for `project`.
    pub fn project_removed(&self, project: &ProjectId) {
        for handler in &self.handlers {
            handler.project_removed(project);
        }
    }

    /// Force every index to rescan `project` on its next query.
    pub fn invalidate(&self, project: &ProjectId) -> bool {
        let mut any = false;
        for handler in &self.handlers {
            any |= handler.invalidate(project);
        }
        any
    }
}

/// Builder for configuring the updater.
pub struct ChangeUpdaterBuilder {
    graph: Arc<ProjectGraph>,
    handlers: Vec<Arc<dyn IndexHandler>>,
}

impl ChangeUpdaterBuilder {
    fn new(graph: Arc<ProjectGraph>) -> Self {
        Self {
            graph,
            handlers: Vec::new(),
        }
    }

    pub fn handler(mut self, handler: impl IndexHandler + 'static) -> Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    pub fn shared_handler(mut self, handler: Arc<dyn IndexHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn build(self) -> ChangeUpdater {
        ChangeUpdater {
            graph: self.graph,
            handlers: self.handlers,
        }
    }
}

/// Apply batches from `receiver` until every sender is dropped.
///
/// Runs on the caller's thread. Returns the summed stats of all batches.
pub fn pump(updater: &ChangeUpdater, receiver: &Receiver<ChangeBatch>) -> UpdateStats {
    let mut total = UpdateStats::default();
    let mut batches = 0usize;

    for batch in receiver.iter() {
        total.absorb(updater.apply(&batch));
        batches += 1;
    }

    crate::debug_event!("updater", "disconnected", "{batches} batches applied");
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{
        BuildOptions, PropertyKey, RuntimeIdIndex, SingleProjectIndex, UnqualifiedNameKey,
    };
    use crate::project::{MemoryProject, Project};
    use crate::types::ObjectType;
    use crate::updater::handlers::SingleProjectHandler;

    fn runtime_ids(graph: &Arc<ProjectGraph>) -> Arc<RuntimeIdIndex> {
        Arc::new(SingleProjectIndex::new(
            graph.clone(),
            PropertyKey::new("runtime-id", ObjectType::ProductComponent, "runtimeId"),
            BuildOptions::sequential(),
        ))
    }

    #[test]
    fn test_untracked_project_is_ignored() {
        let graph = Arc::new(ProjectGraph::new());
        let index = runtime_ids(&graph);
        let updater = ChangeUpdater::builder(graph.clone())
            .handler(SingleProjectHandler::new(index))
            .build();

        let stray = MemoryProject::new("stray");
        let file = stray.new_file("p.A", ObjectType::ProductComponent);
        let stats = updater.apply(&ChangeBatch::new().added(file));

        assert_eq!(stats.ignored, 1);
        assert_eq!(stats.applied, 0);
    }

    #[test]
    fn test_deltas_apply_in_order() {
        let graph = Arc::new(ProjectGraph::new());
        let project = MemoryProject::new("base");
        graph.add_project(project.clone());
        let index = runtime_ids(&graph);
        let updater = ChangeUpdater::builder(graph.clone())
            .handler(SingleProjectHandler::new(index.clone()))
            .build();
        assert!(index.get(project.id(), "id").unwrap().is_empty());

        let file = project.new_file("p.A", ObjectType::ProductComponent);
        file.set_property("runtimeId", "id");
        let stats = updater.apply(
            &ChangeBatch::new()
                .added(file.clone())
                .removed(file.clone())
                .added(file.clone()),
        );

        assert_eq!(stats.applied, 3);
        assert_eq!(stats.changed, 3);
        assert_eq!(stats.projects, 1);
        assert_eq!(index.get(project.id(), "id").unwrap(), vec![file.handle()]);
    }

    #[test]
    fn test_every_handler_sees_each_delta() {
        let graph = Arc::new(ProjectGraph::new());
        let project = MemoryProject::new("base");
        graph.add_project(project.clone());
        let ids = runtime_ids(&graph);
        let names = Arc::new(SingleProjectIndex::new(
            graph.clone(),
            UnqualifiedNameKey::new(ObjectType::ProductComponent),
            BuildOptions::sequential(),
        ));
        let updater = ChangeUpdater::builder(graph.clone())
            .handler(SingleProjectHandler::new(ids.clone()))
            .handler(SingleProjectHandler::new(names.clone()))
            .build();
        ids.get(project.id(), "id").unwrap();
        names.get(project.id(), "Policy").unwrap();

        let file = project.new_file("life.Policy", ObjectType::ProductComponent);
        file.set_property("runtimeId", "id");
        updater.apply(&ChangeBatch::new().added(file.clone()));

        assert_eq!(ids.get(project.id(), "id").unwrap().len(), 1);
        assert_eq!(names.get(project.id(), "Policy").unwrap().len(), 1);
    }
}
