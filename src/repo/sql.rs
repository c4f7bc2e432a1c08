//! SQL statements for the partitioned log table.
//!
//! All statements are unqualified; the session's `search_path` selects the schema.
//! DDL cannot take bind parameters, so partition names and bounds are
//! formatted in. Names are always quoted through [`quote_ident`].

use super::partitions::Partition;

pub const CREATE_BASE_TABLE: &str = "\
CREATE TABLE IF NOT EXISTS log (
    id SERIAL,
    created TIMESTAMP NOT NULL,
    message TEXT NOT NULL
) PARTITION BY RANGE (created)";

/// Serializes partition creation per name until the transaction ends
pub const LOCK_PARTITION: &str = "SELECT pg_advisory_xact_lock(hashtext($1))";

pub const INSERT_LOG: &str = "INSERT INTO log (created, message) VALUES ($1, $2)";

pub const SELECT_LOGS: &str = "SELECT id, created, message FROM log ORDER BY created, id";

/// Base table plus well-formed partitions in the current schema.
///
/// Sorting happens in Rust so the order is byte-wise, not collation-dependent.
pub const LIST_TABLES: &str = r"
SELECT c.relname::text AS name,
       CASE c.relkind WHEN 'p' THEN 'partitioned table' ELSE 'table' END AS kind,
       pg_catalog.pg_get_userbyid(c.relowner)::text AS owner
FROM pg_catalog.pg_class c
JOIN pg_catalog.pg_namespace n ON n.oid = c.relnamespace
WHERE n.nspname = current_schema()
  AND c.relkind IN ('r', 'p')
  AND (c.relname = 'log' OR c.relname ~ '^log_[0-9]{12}$')";

pub const PING: &str = "SELECT 1";

/// `CREATE TABLE IF NOT EXISTS <partition> PARTITION OF log ...`
pub fn ensure_partition(partition: &Partition) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} PARTITION OF log FOR VALUES FROM ('{}') TO ('{}')",
        quote_ident(partition.name()),
        partition.start_literal(),
        partition.end_literal(),
    )
}

pub fn drop_partition(table: &str) -> String {
    format!("DROP TABLE {}", quote_ident(table))
}

/// Double-quote an identifier, doubling embedded quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
