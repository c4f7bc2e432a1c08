//! In-memory log repository.
//!
//! Mirrors the PostgreSQL layout (base table routing to minute partitions)
//! without a database, for tests and local development. Each call works on
//! a copy of the state and swaps it in only on success, which gives the same
//! all-or-nothing behavior as one store transaction.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::connector::ConnectionError;

use super::catalog::{CatalogEntry, TableKind};
use super::error::{RepositoryError, Result};
use super::partitions::{BASE_TABLE, Partition};
use super::pruning::plan_prune;
use super::{
    Clock, LogRecord, LogRepository, SystemClock, fetched_logs_message, fetched_tables_message,
    pruned_tables_message,
};

const OWNER: &str = "postgres";

#[derive(Debug, Clone)]
struct Table {
    kind: TableKind,
    rows: Vec<LogRecord>,
}

#[derive(Debug, Clone)]
struct MemoryState {
    tables: BTreeMap<String, Table>,
    next_id: i32,
}

impl Default for MemoryState {
    fn default() -> Self {
        let mut tables = BTreeMap::new();
        tables.insert(
            BASE_TABLE.to_string(),
            Table {
                kind: TableKind::PartitionedRoot,
                rows: Vec::new(),
            },
        );
        Self { tables, next_id: 1 }
    }
}

#[derive(Debug, Default)]
struct Faults {
    unavailable: bool,
    failing_drops: HashSet<String>,
}

/// Simulated partitioned store
#[derive(Clone)]
pub struct InMemoryLogRepo {
    state: Arc<Mutex<MemoryState>>,
    faults: Arc<Mutex<Faults>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryLogRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryLogRepo {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            faults: Arc::new(Mutex::new(Faults::default())),
            clock,
        }
    }

    /// Create an empty partition by name, as if left over from an earlier minute
    pub fn create_partition(&self, name: &str) -> Result<()> {
        Partition::from_name(name).ok_or_else(|| {
            RepositoryError::UnexpectedCatalog(format!("not a partition name: {name}"))
        })?;
        lock(&self.state)
            .tables
            .entry(name.to_string())
            .or_insert_with(|| Table {
                kind: TableKind::Partition,
                rows: Vec::new(),
            });
        Ok(())
    }

    /// Total rows across all partitions, without self-logging
    pub fn row_count(&self) -> usize {
        lock(&self.state).tables.values().map(|t| t.rows.len()).sum()
    }

    /// Table names, without self-logging
    pub fn table_names(&self) -> BTreeSet<String> {
        lock(&self.state).tables.keys().cloned().collect()
    }

    /// Make every subsequent call fail as if the store were unreachable
    pub fn set_unavailable(&self, unavailable: bool) {
        lock(&self.faults).unavailable = unavailable;
    }

    /// Make dropping `table` fail mid-prune
    pub fn fail_drop_of(&self, table: &str) {
        lock(&self.faults).failing_drops.insert(table.to_string());
    }

    /// Run `op` against a copy of the state and keep the result only on success
    fn transaction<T>(&self, op: impl FnOnce(&mut MemoryState) -> Result<T>) -> Result<T> {
        if lock(&self.faults).unavailable {
            return Err(simulated_outage().into());
        }

        let mut guard = lock(&self.state);
        let mut working = guard.clone();
        let value = op(&mut working)?;
        *guard = working;
        Ok(value)
    }

    fn insert_in(&self, state: &mut MemoryState, message: &str) -> Result<()> {
        let created = self.clock.now();
        let partition = Partition::for_timestamp(created)?;

        if !state.tables.contains_key(BASE_TABLE) {
            return Err(RepositoryError::UnknownTable(BASE_TABLE.to_string()));
        }

        let table = state
            .tables
            .entry(partition.name().to_string())
            .or_insert_with(|| {
                debug!(partition = partition.name(), "Creating partition");
                Table {
                    kind: TableKind::Partition,
                    rows: Vec::new(),
                }
            });

        table.rows.push(LogRecord {
            id: state.next_id,
            created,
            message: message.to_string(),
        });
        state.next_id += 1;
        Ok(())
    }

    fn catalog(state: &MemoryState) -> Vec<CatalogEntry> {
        state
            .tables
            .iter()
            .map(|(name, table)| CatalogEntry::new(name.as_str(), table.kind, OWNER))
            .collect()
    }
}

#[async_trait]
impl LogRepository for InMemoryLogRepo {
    async fn insert_log(&self, message: &str) -> Result<()> {
        self.transaction(|state| self.insert_in(state, message))
    }

    async fn fetch_logs(&self) -> Result<Vec<LogRecord>> {
        self.transaction(|state| {
            let mut logs: Vec<LogRecord> = state
                .tables
                .values()
                .flat_map(|t| t.rows.iter().cloned())
                .collect();
            logs.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));

            self.insert_in(state, &fetched_logs_message(logs.len()))?;
            Ok(logs)
        })
    }

    async fn fetch_tables(&self) -> Result<BTreeSet<String>> {
        self.transaction(|state| {
            let tables: BTreeSet<String> = Self::catalog(state)
                .into_iter()
                .map(|entry| entry.name)
                .collect();

            self.insert_in(state, &fetched_tables_message(tables.len()))?;
            Ok(tables)
        })
    }

    async fn prune_partitions(&self) -> Result<Vec<String>> {
        let failing = lock(&self.faults).failing_drops.clone();

        let dropped = self.transaction(|state| {
            let plan = plan_prune(&Self::catalog(state));

            for table in &plan.drop {
                if failing.contains(table) {
                    return Err(sqlx::Error::Protocol(format!(
                        "simulated failure dropping {table}"
                    ))
                    .into());
                }
                state
                    .tables
                    .remove(table)
                    .ok_or_else(|| RepositoryError::UnknownTable(table.clone()))?;
                debug!(table = %table, "Dropped partition");
            }

            self.insert_in(state, &pruned_tables_message(plan.drop.len()))?;
            Ok(plan.drop)
        })?;

        info!(count = dropped.len(), "Pruned partitions");
        Ok(dropped)
    }

    async fn health(&self) -> bool {
        !lock(&self.faults).unavailable
    }
}

fn simulated_outage() -> ConnectionError {
    ConnectionError::Exhausted {
        target: "memory".to_string(),
        attempts: 1,
        source: sqlx::Error::Io(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "simulated outage",
        )),
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
