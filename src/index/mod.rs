//! Lazily built, incrementally updated key to source-file indexes.
//!
//! # Architecture
//!
//! ```text
//! SingleProjectIndex<E>          CrossProjectIndex<E>
//!   ProjectCaches<E>               ProjectCaches<E>  (locals)
//!     KeyedIndexCache<E>           DashMap<ProjectId, aggregate>
//!       LazyBuckets ── build ──>     LazyBuckets ── union over reexport closure
//!         IndexBuckets<E::Key>          IndexBuckets<E::Key>
//! ```
//!
//! `E` is a [`KeyExtractor`]: it picks the object type an index covers and
//! derives each file's key. Caches build on the first query and are patched
//! by `apply_change` afterwards.

mod buckets;
mod build;
mod cache;
mod error;
mod extractor;
mod lazy;
mod registry;
mod single;
mod stats;
mod usage;

pub use buckets::{BucketChange, IndexBuckets};
pub use build::BuildOptions;
pub use cache::KeyedIndexCache;
pub use error::{IndexError, IndexResult};
pub use extractor::{FnKey, KeyExtractor, PropertyKey, UnqualifiedNameKey};
pub use registry::ProjectCaches;
pub use single::{RuntimeIdIndex, SingleProjectIndex, UnqualifiedNameIndex};
pub use stats::CacheStats;
pub use usage::{CrossProjectIndex, TableUsageIndex};
