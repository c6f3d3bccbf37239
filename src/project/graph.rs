//! Project dependency graph with cached reexport closures.
//!
//! Nodes are projects, edges are dependency edges weighted with their
//! reexport flag. The reexport closure of a project is the set of projects
//! reachable from it over reexported edges only; it is computed on demand,
//! cached per project and dropped wholesale whenever any edge changes.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;
use petgraph::Direction;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;

use super::{DependencyEdge, Project};
use crate::types::ProjectId;

/// Projects whose reexport closure may differ after a graph mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphChange {
    pub affected: Vec<ProjectId>,
}

impl GraphChange {
    pub fn is_empty(&self) -> bool {
        self.affected.is_empty()
    }
}

#[derive(Default)]
struct GraphInner {
    graph: StableDiGraph<ProjectId, bool>,
    node_map: HashMap<ProjectId, NodeIndex>,
    projects: HashMap<ProjectId, Arc<dyn Project>>,
    declared: HashMap<ProjectId, Vec<DependencyEdge>>,
}

impl GraphInner {
    fn node(&mut self, id: &ProjectId) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(id) {
            idx
        } else {
            let idx = self.graph.add_node(id.clone());
            self.node_map.insert(id.clone(), idx);
            idx
        }
    }

    /// Breadth-first walk from `start` following edges in `direction`,
    /// restricted to edges accepted by `follow`. Includes `start`.
    fn walk(
        &self,
        start: &ProjectId,
        direction: Direction,
        follow: impl Fn(bool) -> bool,
    ) -> Vec<ProjectId> {
        let Some(&start_idx) = self.node_map.get(start) else {
            return vec![start.clone()];
        };

        let mut visited = HashSet::new();
        let mut queue = VecDeque::new();
        let mut order = Vec::new();
        visited.insert(start_idx);
        queue.push_back(start_idx);

        while let Some(idx) = queue.pop_front() {
            order.push(self.graph[idx].clone());
            for edge in self.graph.edges_directed(idx, direction) {
                if !follow(*edge.weight()) {
                    continue;
                }
                let next = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        order
    }

    fn replace_edges(&mut self, id: &ProjectId, edges: Vec<DependencyEdge>) {
        let from = self.node(id);
        let outgoing: Vec<_> = self
            .graph
            .edges_directed(from, Direction::Outgoing)
            .map(|e| (e.id(), e.target()))
            .collect();
        for (edge, _) in &outgoing {
            self.graph.remove_edge(*edge);
        }
        for edge in &edges {
            let to = self.node(&edge.target);
            self.graph.add_edge(from, to, edge.reexported);
        }
        self.declared.insert(id.clone(), edges);

        for (_, target) in outgoing {
            self.prune(target);
        }
    }

    /// Drop `idx` if it is neither a registered project nor the target of
    /// any edge.
    fn prune(&mut self, idx: NodeIndex) {
        let Some(id) = self.graph.node_weight(idx).cloned() else {
            return;
        };
        if self.projects.contains_key(&id) {
            return;
        }
        if self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .next()
            .is_some()
        {
            return;
        }
        self.graph.remove_node(idx);
        self.node_map.remove(&id);
    }
}

/// Directed dependency graph over the workspace's projects.
///
/// Edges are mirrored from [`Project::dependency_edges`] when a project is
/// added and whenever [`ProjectGraph::sync_edges`] is called for it.
#[derive(Default)]
pub struct ProjectGraph {
    inner: RwLock<GraphInner>,
    closures: RwLock<HashMap<ProjectId, Arc<HashSet<ProjectId>>>>,
}

impl ProjectGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project and mirror its current dependency edges.
    pub fn add_project(&self, project: Arc<dyn Project>) -> GraphChange {
        let id = project.id().clone();
        let edges = project.dependency_edges();

        let mut inner = self.inner.write();
        inner.node(&id);
        inner.projects.insert(id.clone(), project);
        inner.replace_edges(&id, edges);
        self.closures.write().clear();

        let affected = inner.walk(&id, Direction::Incoming, |_| true);
        tracing::debug!("[graph] registered project {id}, {} affected", affected.len());
        GraphChange { affected }
    }

    /// Unregister a project and drop its outgoing edges.
    ///
    /// Edges other projects declare towards it stay in place so the project
    /// can be registered again later without resyncing its dependents.
    pub fn remove_project(&self, id: &ProjectId) -> GraphChange {
        let mut inner = self.inner.write();
        if inner.projects.remove(id).is_none() {
            return GraphChange::default();
        }

        let affected = inner.walk(id, Direction::Incoming, |_| true);
        inner.replace_edges(id, Vec::new());
        inner.declared.remove(id);

        if let Some(idx) = inner.node_map.get(id).copied() {
            inner.prune(idx);
        }
        self.closures.write().clear();

        tracing::debug!("[graph] removed project {id}, {} affected", affected.len());
        GraphChange { affected }
    }

    /// Re-read a project's dependency edges from its provider.
    ///
    /// Returns the projects whose closure may have changed: every project
    /// that reaches `id` over any edge, `id` included. Returns an empty change
    /// when the edges are unchanged or the project is unknown.
    pub fn sync_edges(&self, id: &ProjectId) -> GraphChange {
        let mut inner = self.inner.write();
        let Some(project) = inner.projects.get(id).cloned() else {
            return GraphChange::default();
        };

        let edges = project.dependency_edges();
        if inner.declared.get(id) == Some(&edges) {
            return GraphChange::default();
        }

        inner.replace_edges(id, edges);
        self.closures.write().clear();

        let affected = inner.walk(id, Direction::Incoming, |_| true);
        tracing::debug!(
            "[graph] dependency edges of {id} changed, {} projects affected",
            affected.len()
        );
        GraphChange { affected }
    }

    pub fn project(&self, id: &ProjectId) -> Option<Arc<dyn Project>> {
        self.inner.read().projects.get(id).cloned()
    }

    pub fn contains(&self, id: &ProjectId) -> bool {
        self.inner.read().projects.contains_key(id)
    }

    pub fn project_ids(&self) -> Vec<ProjectId> {
        let mut ids: Vec<_> = self.inner.read().projects.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Dependency edges as last mirrored from the provider.
    pub fn dependency_edges(&self, id: &ProjectId) -> Vec<DependencyEdge> {
        self.inner
            .read()
            .declared
            .get(id)
            .cloned()
            .unwrap_or_default()
    }

    /// The reexport closure of `id`: `id` plus everything reachable from it
    /// over reexported edges. Cycle-safe.
    pub fn reexport_closure(&self, id: &ProjectId) -> Arc<HashSet<ProjectId>> {
        if let Some(closure) = self.closures.read().get(id) {
            return closure.clone();
        }

        // Hold the graph read lock until the closure is published so a
        // concurrent edge change cannot interleave with the insert.
        let inner = self.inner.read();
        let closure: HashSet<_> = inner
            .walk(id, Direction::Outgoing, |reexported| reexported)
            .into_iter()
            .collect();
        let closure = Arc::new(closure);
        tracing::debug!("[graph] closure of {id}: {} projects", closure.len());
        self.closures.write().insert(id.clone(), closure.clone());
        closure
    }

    /// Every project whose reexport closure contains `id`, `id` included.
    pub fn visible_from(&self, id: &ProjectId) -> Vec<ProjectId> {
        self.inner
            .read()
            .walk(id, Direction::Incoming, |reexported| reexported)
    }

    /// Every project that reaches `id` over any edge, `id` included.
    pub fn dependents(&self, id: &ProjectId) -> Vec<ProjectId> {
        self.inner.read().walk(id, Direction::Incoming, |_| true)
    }

    /// Number of closures currently cached.
    pub fn cached_closures(&self) -> usize {
        self.closures.read().len()
    }
}
