//! Partitioned log repository
//!
//! Log rows live in a range-partitioned `log` table, one partition per
//! calendar minute (`log_YYYYMMDDHHMM`). The repository owns every
//! partition lifecycle decision:
//!
//! - inserts create the current minute's partition on demand (idempotent)
//! - reads go through the base table, which routes to the partitions
//! - pruning keeps the base table and the newest partition, drops the rest
//!
//! ## Self-logging
//!
//! Every read or administrative operation appends an audit row
//! (`Fetched N logs.`, `Fetched N tables.`, `Pruned N tables.`) in the same
//! transaction as its own work. Repeated reads therefore grow the table by
//! exactly one row per call.
//!
//! ## Transactions
//!
//! One public call = one connection = one transaction. A failing call
//! commits nothing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use logsink::repo::{LogRepository, PgLogRepo};
//!
//! let repo = PgLogRepo::new(StoreConnector::new(&config.database));
//! repo.ensure_schema().await?;
//! repo.insert_log("Server started.").await?;
//! let logs = repo.fetch_logs().await?;
//! ```

pub mod catalog;
pub mod error;
pub mod memory;
pub mod partitions;
pub mod postgres;
pub mod pruning;
pub mod sql;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

pub use catalog::{CatalogEntry, TableKind};
pub use error::{RepositoryError, Result};
pub use memory::InMemoryLogRepo;
pub use partitions::{BASE_TABLE, PARTITION_PREFIX, Partition, partition_name};
pub use postgres::PgLogRepo;
pub use pruning::{PrunePlan, plan_prune};

/// A stored log row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LogRecord {
    pub id: i32,
    pub created: NaiveDateTime,
    pub message: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.created.format("%Y-%m-%d %H:%M:%S"), self.message)
    }
}

/// Operations exposed to the request-handling layer
#[async_trait]
pub trait LogRepository: Send + Sync {
    /// Append one message, creating the current minute's partition if needed
    async fn insert_log(&self, message: &str) -> Result<()>;

    /// All rows ordered by `created`, then `id`; self-logs `Fetched N logs.`
    async fn fetch_logs(&self) -> Result<Vec<LogRecord>>;

    /// Names of the base table and its partitions; self-logs `Fetched N tables.`
    async fn fetch_tables(&self) -> Result<BTreeSet<String>>;

    /// Drop all but the first and last table by name; self-logs `Pruned N tables.`
    async fn prune_partitions(&self) -> Result<Vec<String>>;

    /// Whether the store is reachable. Does not self-log.
    async fn health(&self) -> bool;
}

pub(crate) fn fetched_logs_message(count: usize) -> String {
    format!("Fetched {count} logs.")
}

pub(crate) fn fetched_tables_message(count: usize) -> String {
    format!("Fetched {count} tables.")
}

pub(crate) fn pruned_tables_message(count: usize) -> String {
    format!("Pruned {count} tables.")
}

/// Source of `created` timestamps
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// UTC wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// Settable clock for tests and simulations
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_log_record_display() {
        let record = LogRecord {
            id: 7,
            created: NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_micro_opt(9, 5, 3, 250_000)
                .unwrap(),
            message: "Server started.".to_string(),
        };

        assert_eq!(record.to_string(), "2024-01-01 09:05:03 - Server started.");
    }

    #[test]
    fn test_self_log_messages() {
        assert_eq!(fetched_logs_message(3), "Fetched 3 logs.");
        assert_eq!(fetched_tables_message(1), "Fetched 1 tables.");
        assert_eq!(pruned_tables_message(0), "Pruned 0 tables.");
    }

    #[test]
    fn test_manual_clock_advances() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(9, 59, 30)
            .unwrap();
        let clock = ManualClock::new(start);
        let shared = clock.clone();

        shared.advance(Duration::seconds(45));
        assert_eq!(clock.now(), start + Duration::seconds(45));

        clock.set(start);
        assert_eq!(shared.now(), start);
    }
}
