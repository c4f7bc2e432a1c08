use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::Connection;
use sqlx::postgres::PgConnection;
use tracing::{debug, info, warn};

use crate::connector::StoreConnector;

use super::catalog::CatalogEntry;
use super::error::Result;
use super::partitions::{Partition, is_log_table};
use super::pruning::plan_prune;
use super::sql;
use super::{
    Clock, LogRecord, LogRepository, SystemClock, fetched_logs_message, fetched_tables_message,
    pruned_tables_message,
};

/// Partitioned log repository over PostgreSQL
#[derive(Clone)]
pub struct PgLogRepo {
    connector: StoreConnector,
    clock: Arc<dyn Clock>,
}

impl PgLogRepo {
    pub fn new(connector: StoreConnector) -> Self {
        Self::with_clock(connector, Arc::new(SystemClock))
    }

    pub fn with_clock(connector: StoreConnector, clock: Arc<dyn Clock>) -> Self {
        Self { connector, clock }
    }

    /// Create the partitioned base table if it does not exist yet
    pub async fn ensure_schema(&self) -> Result<()> {
        let mut conn = self.connector.connect().await?;
        sqlx::query(sql::CREATE_BASE_TABLE)
            .execute(&mut conn)
            .await?;
        close(conn).await;
        info!(target_db = self.connector.target(), "Log table ready");
        Ok(())
    }

    /// Ensure the partition for `now` and insert one row through the base table
    async fn append(&self, conn: &mut PgConnection, message: &str) -> Result<()> {
        let created = self.clock.now();
        let partition = Partition::for_timestamp(created)?;

        // Concurrent first inserts of a minute would otherwise race on
        // CREATE TABLE IF NOT EXISTS and fail with a duplicate type error.
        sqlx::query(sql::LOCK_PARTITION)
            .bind(partition.name())
            .execute(&mut *conn)
            .await?;
        sqlx::query(&sql::ensure_partition(&partition))
            .execute(&mut *conn)
            .await?;
        sqlx::query(sql::INSERT_LOG)
            .bind(created)
            .bind(message)
            .execute(&mut *conn)
            .await?;

        debug!(partition = partition.name(), "Inserted log");
        Ok(())
    }

    async fn catalog(conn: &mut PgConnection) -> Result<Vec<CatalogEntry>> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(sql::LIST_TABLES)
            .fetch_all(&mut *conn)
            .await?;

        rows.into_iter()
            .filter(|(name, _, _)| is_log_table(name))
            .map(|(name, kind, owner)| -> Result<CatalogEntry> {
                Ok(CatalogEntry::new(name, kind.parse()?, owner))
            })
            .collect()
    }
}

#[async_trait]
impl LogRepository for PgLogRepo {
    async fn insert_log(&self, message: &str) -> Result<()> {
        let mut conn = self.connector.connect().await?;
        let mut tx = conn.begin().await?;

        self.append(&mut tx, message).await?;

        tx.commit().await?;
        close(conn).await;
        Ok(())
    }

    async fn fetch_logs(&self) -> Result<Vec<LogRecord>> {
        let mut conn = self.connector.connect().await?;
        let mut tx = conn.begin().await?;

        let logs: Vec<LogRecord> = sqlx::query_as(sql::SELECT_LOGS)
            .fetch_all(&mut *tx)
            .await?;
        self.append(&mut tx, &fetched_logs_message(logs.len()))
            .await?;

        tx.commit().await?;
        close(conn).await;
        debug!(count = logs.len(), "Fetched logs");
        Ok(logs)
    }

    async fn fetch_tables(&self) -> Result<BTreeSet<String>> {
        let mut conn = self.connector.connect().await?;
        let mut tx = conn.begin().await?;

        let tables: BTreeSet<String> = Self::catalog(&mut tx)
            .await?
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        self.append(&mut tx, &fetched_tables_message(tables.len()))
            .await?;

        tx.commit().await?;
        close(conn).await;
        debug!(count = tables.len(), "Fetched tables");
        Ok(tables)
    }

    async fn prune_partitions(&self) -> Result<Vec<String>> {
        let mut conn = self.connector.connect().await?;
        let mut tx = conn.begin().await?;

        let plan = plan_prune(&Self::catalog(&mut tx).await?);
        debug!(reserved = ?plan.reserved, "Planned prune");

        for table in &plan.drop {
            sqlx::query(&sql::drop_partition(table))
                .execute(&mut *tx)
                .await?;
            debug!(table = %table, "Dropped partition");
        }
        self.append(&mut tx, &pruned_tables_message(plan.drop.len()))
            .await?;

        tx.commit().await?;
        close(conn).await;
        info!(count = plan.drop.len(), "Pruned partitions");
        Ok(plan.drop)
    }

    async fn health(&self) -> bool {
        let mut conn = match self.connector.connect().await {
            Ok(conn) => conn,
            Err(err) => {
                warn!(error = %err, "Store health check failed");
                return false;
            }
        };

        let ok = sqlx::query(sql::PING).execute(&mut conn).await.is_ok();
        close(conn).await;
        ok
    }
}

/// Graceful close; the work is already committed, so failures are only logged
async fn close(conn: PgConnection) {
    if let Err(err) = conn.close().await {
        warn!(error = %err, "Failed to close store session");
    }
}
