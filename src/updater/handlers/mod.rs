//! Handler implementations for the change updater.

mod single;
mod usage;

pub use single::SingleProjectHandler;
pub use usage::CrossProjectHandler;
