//! Handler trait the change updater dispatches to.

use super::FileDelta;
use crate::types::ProjectId;

/// An index kept current by the [`super::ChangeUpdater`].
///
/// The updater calls the methods from a single thread, one batch at a time.
pub trait IndexHandler: Send + Sync {
    /// Handler name for logging.
    fn name(&self) -> &str;

    /// Apply the deltas of one project, in order.
    ///
    /// Returns the number of deltas that moved a file between buckets.
    fn apply(&self, project: &ProjectId, deltas: &[FileDelta]) -> usize;

    /// Dependency edges changed; `affected` lists every project whose
    /// reexport closure may differ now. Returns the number of caches dropped.
    fn graph_changed(&self, _affected: &[ProjectId]) -> usize {
        0
    }

    /// The project left the workspace.
    fn project_removed(&self, _project: &ProjectId) {}

    /// Force the next query for `project` to rescan.
    fn invalidate(&self, _project: &ProjectId) -> bool {
        false
    }
}
