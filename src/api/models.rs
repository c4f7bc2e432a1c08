//! API models for the logsink HTTP surface.
//!
//! - `GET /logs` returns [`LogLinesResponse`] (or [`LogsResponse`] with `?format=records`)
//! - `POST /logs` accepts an [`InsertLogRequest`]
//! - `GET /tables` returns [`TablesResponse`]
//! - `DELETE /tables` returns [`PruneResponse`]

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::observability::MetricsSnapshot;
use crate::repo::LogRecord;

#[derive(Debug, Deserialize, Clone)]
pub struct InsertLogRequest {
    pub message: String,
}

/// Query string of `GET /logs`
#[derive(Debug, Deserialize, Default)]
pub struct LogsQuery {
    #[serde(default)]
    pub format: LogsFormat,
}

#[derive(Debug, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogsFormat {
    /// One rendered `YYYY-MM-DD HH:MM:SS - message` string per record
    #[default]
    Lines,
    /// Structured records
    Records,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogsResponse {
    pub logs: Vec<LogRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogLinesResponse {
    pub logs: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TablesResponse {
    pub tables: BTreeSet<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PruneResponse {
    pub dropped_tables: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub components: HashMap<String, String>,
    pub version: String,
    pub metrics: MetricsSnapshot,
}
