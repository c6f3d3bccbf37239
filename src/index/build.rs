//! Parallelism policy for full rebuilds.

use std::sync::Arc;

use rayon::ThreadPool;
use rayon::prelude::*;

use crate::config::IndexConfig;

/// Decides whether a rebuild derives keys on a rayon pool.
///
/// Work below the threshold stays on the calling thread: small projects are
/// faster without the pool handoff. So does work started from a rayon worker.
/// A rebuild holds its cache lock while it waits on the pool, and a waiting
/// worker runs queued tasks from its own pool; one of those may be a reader of
/// the same cache.
///
/// The pool is private to the index. Its jobs only derive keys and never take
/// cache locks.
#[derive(Clone)]
pub struct BuildOptions {
    pool: Option<Arc<ThreadPool>>,
    parallel_threshold: usize,
}

impl BuildOptions {
    /// Everything on the calling thread.
    pub fn sequential() -> Self {
        Self {
            pool: None,
            parallel_threshold: usize::MAX,
        }
    }

    pub fn from_config(config: &IndexConfig) -> Self {
        let threads = match config.parallel_threads {
            0 => num_cpus::get(),
            n => n,
        };
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("modelindex-build-{i}"))
            .build()
        {
            Ok(pool) => Some(Arc::new(pool)),
            Err(e) => {
                tracing::warn!("[index] failed to create build pool, rebuilding sequentially: {e}");
                None
            }
        };

        Self {
            pool,
            parallel_threshold: config.parallel_threshold,
        }
    }

    /// Map `items` with `f`, in parallel when there are enough of them.
    pub fn map<T, R, F>(&self, items: &[T], f: F) -> Vec<R>
    where
        T: Sync,
        R: Send,
        F: Fn(&T) -> R + Sync + Send,
    {
        match &self.pool {
            Some(pool)
                if items.len() >= self.parallel_threshold
                    && rayon::current_thread_index().is_none() =>
            {
                pool.install(|| items.par_iter().map(f).collect())
            }
            _ => items.iter().map(f).collect(),
        }
    }

    pub fn is_parallel(&self) -> bool {
        self.pool.is_some()
    }
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self::sequential()
    }
}
