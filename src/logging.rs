//! Logging for the index subsystem.
//!
//! Compact timestamped output with per-target level configuration. Events
//! carry a `[handler]` prefix (`index`, `graph`, `updater` or an index name).
//!
//! # Configuration
//!
//! ```toml
//! [logging]
//! default = "warn"  # quiet by default
//!
//! [logging.modules]
//! "modelindex::updater" = "debug"  # batch summaries and skipped deltas
//! "modelindex::index" = "trace"    # every bucket move
//! ```
//!
//! # Environment Variable
//!
//! `RUST_LOG` takes precedence over config:
//! ```bash
//! RUST_LOG=modelindex=debug
//! ```
//!
//! Embedding hosts that install their own subscriber skip `init` entirely.

use std::sync::Once;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use crate::config::LoggingConfig;

static INIT: Once = Once::new();

/// Compact time format: HH:MM:SS.mmm
struct CompactTime;

impl FormatTime for CompactTime {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", chrono::Local::now().format("%H:%M:%S%.3f"))
    }
}

/// Filter directives for `config`: the default level followed by the
/// per-target overrides.
pub fn filter_directives(config: &LoggingConfig) -> String {
    let mut modules: Vec<_> = config.modules.iter().collect();
    modules.sort();

    let mut directives = config.default.clone();
    for (module, level) in modules {
        directives.push_str(&format!(",{module}={level}"));
    }
    directives
}

/// Initialize logging with configuration.
///
/// Safe to call multiple times; only the first call takes effect. A global
/// subscriber installed by the host wins over this one.
pub fn init_with_config(config: &LoggingConfig) {
    INIT.call_once(|| {
        // RUST_LOG env var takes precedence over config
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            EnvFilter::new(filter_directives(config))
        };

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_timer(CompactTime)
            .with_level(true)
            .with_filter(filter);

        if tracing_subscriber::registry()
            .with(fmt_layer)
            .try_init()
            .is_err()
        {
            tracing::debug!("[logging] subscriber already installed");
        }
    });
}

/// Initialize logging with `LoggingConfig::default()` (`warn`).
pub fn init() {
    init_with_config(&LoggingConfig::default());
}

/// Log an event with handler context.
///
/// # Examples
/// ```ignore
/// log_event!("updater", "batch applied", "{} deltas", stats.applied);
/// log_event!("index", "rebuilt");
/// ```
#[macro_export]
macro_rules! log_event {
    ($handler:expr, $event:expr) => {
        tracing::info!("[{}] {}", $handler, $event)
    };
    ($handler:expr, $event:expr, $($arg:tt)*) => {
        tracing::info!("[{}] {}: {}", $handler, $event, format!($($arg)*))
    };
}

/// Debug-only event logging.
///
/// # Examples
/// ```ignore
/// debug_event!("graph", "closure", "{id}: {} projects", closure.len());
/// ```
#[macro_export]
macro_rules! debug_event {
    ($handler:expr, $event:expr) => {
        tracing::debug!("[{}] {}", $handler, $event)
    };
    ($handler:expr, $event:expr, $($arg:tt)*) => {
        tracing::debug!("[{}] {}: {}", $handler, $event, format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_subscriber::layer::Context;

    use crate::index::{BuildOptions, KeyedIndexCache, PropertyKey};
    use crate::project::MemoryProject;
    use crate::types::ObjectType;

    struct CountEvents(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for CountEvents {
        fn on_event(&self, _event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    /// Events that pass the configured filter while a cache rebuilds.
    fn rebuild_events(config: &LoggingConfig) -> usize {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(
            CountEvents(count.clone()).with_filter(EnvFilter::new(filter_directives(config))),
        );

        tracing::subscriber::with_default(subscriber, || {
            let project = MemoryProject::new("base");
            project
                .new_file("p.A", ObjectType::ProductComponent)
                .set_property("runtimeId", "one");
            let cache = KeyedIndexCache::new(
                project,
                Arc::new(PropertyKey::new(
                    "runtime-id",
                    ObjectType::ProductComponent,
                    "runtimeId",
                )),
                BuildOptions::sequential(),
            );
            cache.get("one").unwrap();
        });
        count.load(Ordering::SeqCst)
    }

    #[test]
    fn test_module_override_matches_event_targets() {
        let quiet = LoggingConfig::default();
        assert_eq!(rebuild_events(&quiet), 0);

        let mut verbose = LoggingConfig::default();
        verbose
            .modules
            .insert("modelindex::index".to_string(), "debug".to_string());
        assert!(rebuild_events(&verbose) > 0);
    }

    #[test]
    fn test_filter_directives() {
        let mut config = LoggingConfig::default();
        config
            .modules
            .insert("modelindex::updater".to_string(), "debug".to_string());
        config
            .modules
            .insert("modelindex::index".to_string(), "trace".to_string());

        assert_eq!(
            filter_directives(&config),
            "warn,modelindex::index=trace,modelindex::updater=debug"
        );
    }

    #[test]
    fn test_init_twice() {
        init();
        init_with_config(&LoggingConfig::default());
    }
}
