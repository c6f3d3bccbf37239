//! Incremental maintenance of the indexes from change batches.
//!
//! # Architecture
//!
//! ```text
//! host notification source
//!   -- ChangeBatch --> crossbeam channel (owned by the caller)
//!                         |
//!                    pump / ChangeUpdater::apply
//!                      1. sync changed dependency edges into the graph
//!                      2. group file deltas by project
//!                      3. dispatch to every IndexHandler
//!                         |
//!            +------------+-------------+
//!            |                          |
//!  SingleProjectHandler        CrossProjectHandler
//! ```

mod batch;
mod dispatch;
mod handler;
pub mod handlers;

pub use crate::types::DeltaKind;
pub use batch::{ChangeBatch, FileDelta};
pub use dispatch::{ChangeUpdater, ChangeUpdaterBuilder, UpdateStats, pump};
pub use handler::IndexHandler;
pub use handlers::{CrossProjectHandler, SingleProjectHandler};
