//! Observability: tracing setup and in-process counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Install the global `fmt` subscriber.
///
/// `RUST_LOG` wins over `default_filter`. Calling this twice is harmless
/// (the second install is ignored), which keeps tests simple.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Run `f` with a temporary stderr subscriber.
///
/// Covers startup work (configuration loading) that runs before the
/// configured filter is known. `RUST_LOG` applies, else `info`.
pub fn with_bootstrap_tracing<T>(f: impl FnOnce() -> T) -> T {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    with_bootstrap_writer(std::io::stderr, filter, f)
}

fn with_bootstrap_writer<W, T>(writer: W, filter: EnvFilter, f: impl FnOnce() -> T) -> T
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .finish();
    tracing::subscriber::with_default(subscriber, f)
}

/// Metrics handle for recording counters
#[derive(Debug, Default)]
pub struct Metrics {
    logs_inserted: AtomicU64,
    logs_fetched: AtomicU64,
    tables_listed: AtomicU64,
    partitions_dropped: AtomicU64,
    store_failures: AtomicU64,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log_inserted(&self) {
        self.logs_inserted.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "logs_inserted", "Metric incremented");
    }

    pub fn logs_fetched(&self, count: usize) {
        self.logs_fetched.fetch_add(count as u64, Ordering::Relaxed);
        tracing::debug!(counter = "logs_fetched", count, "Metric incremented");
    }

    pub fn tables_listed(&self) {
        self.tables_listed.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "tables_listed", "Metric incremented");
    }

    pub fn partitions_dropped(&self, count: usize) {
        self.partitions_dropped
            .fetch_add(count as u64, Ordering::Relaxed);
        tracing::debug!(counter = "partitions_dropped", count, "Metric incremented");
    }

    pub fn store_failed(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(counter = "store_failures", "Metric incremented");
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            logs_inserted: self.logs_inserted.load(Ordering::Relaxed),
            logs_fetched: self.logs_fetched.load(Ordering::Relaxed),
            tables_listed: self.tables_listed.load(Ordering::Relaxed),
            partitions_dropped: self.partitions_dropped.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub logs_inserted: u64,
    pub logs_fetched: u64,
    pub tables_listed: u64,
    pub partitions_dropped: u64,
    pub store_failures: u64,
}
