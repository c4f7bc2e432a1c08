use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use http_body_util::{BodyExt, LengthLimitError, Limited};
use std::collections::HashMap;
use tracing::warn;

use super::{
    error::ApiError,
    models::{
        HealthResponse, InsertLogRequest, LogLinesResponse, LogsFormat, LogsQuery, LogsResponse,
        PruneResponse, TablesResponse,
    },
    state::AppState,
};
use crate::repo::RepositoryError;

/// List all logs (GET /logs)
///
/// Reading is not side-effect free: the repository appends a
/// `Fetched N logs.` entry in the same transaction, so the next call
/// returns one more record.
///
/// Each record is rendered as `YYYY-MM-DD HH:MM:SS - message`;
/// `?format=records` returns `{id, created, message}` objects instead.
pub async fn get_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Response, ApiError> {
    let logs = state
        .repo
        .fetch_logs()
        .await
        .map_err(|e| store_error(&state, e))?;
    state.metrics.logs_fetched(logs.len());

    let response = match query.format {
        LogsFormat::Records => Json(LogsResponse { logs }).into_response(),
        LogsFormat::Lines => Json(LogLinesResponse {
            logs: logs.iter().map(ToString::to_string).collect(),
        })
        .into_response(),
    };

    Ok(response)
}

/// Append a log message (POST /logs)
///
/// ## Flow:
/// 1. Require `Content-Type: application/json`
/// 2. Read the body (gzip decoded by middleware), stopping at the size limit
/// 3. Parse `{"message": "..."}` and reject empty or NUL-bearing text
/// 4. Insert through the repository, which creates the minute's partition if needed
/// 5. Return 201 Created
pub async fn insert_log(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Body,
) -> Result<impl IntoResponse, ApiError> {
    let content_type = headers
        .get(axum::http::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidPayload("missing Content-Type header".into()))?;
    super::utils::parse_content_type(content_type)?;

    let body_bytes = read_body(body, state.config.server.max_message_bytes).await?;

    let request: InsertLogRequest = serde_json::from_slice(&body_bytes)?;
    super::utils::validate_message(&request.message)?;

    state
        .repo
        .insert_log(&request.message)
        .await
        .map_err(|e| store_error(&state, e))?;
    state.metrics.log_inserted();

    Ok(StatusCode::CREATED)
}

/// List the base table and its partitions (GET /tables)
///
/// Self-logs `Fetched N tables.`
pub async fn get_tables(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let tables = state
        .repo
        .fetch_tables()
        .await
        .map_err(|e| store_error(&state, e))?;
    state.metrics.tables_listed();

    Ok((StatusCode::OK, Json(TablesResponse { tables })))
}

/// Drop every partition except the newest (DELETE /tables)
///
/// The base table is never dropped. Returns the dropped names in
/// ascending order and self-logs `Pruned N tables.`
pub async fn prune_tables(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let dropped_tables = state
        .repo
        .prune_partitions()
        .await
        .map_err(|e| store_error(&state, e))?;
    state.metrics.partitions_dropped(dropped_tables.len());

    Ok((StatusCode::OK, Json(PruneResponse { dropped_tables })))
}

/// Health check endpoint (GET /health)
///
/// Returns 503 Service Unavailable if the store cannot be reached.
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let mut components = HashMap::new();
    components.insert("api".to_string(), "healthy".to_string());

    let store_status = if state.repo.health().await {
        "healthy"
    } else {
        "unhealthy"
    };
    components.insert("store".to_string(), store_status.to_string());

    let all_healthy = components.values().all(|status| status == "healthy");
    let (overall_status, status_code) = if all_healthy {
        ("healthy", StatusCode::OK)
    } else {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    };

    let response = HealthResponse {
        status: overall_status.to_string(),
        components,
        version: env!("CARGO_PKG_VERSION").to_string(),
        metrics: state.metrics.snapshot(),
    };

    (status_code, Json(response))
}

/// Fallback for unknown routes
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("unknown resource \"{}\"", uri.path()))
}

/// Reads the request body, refusing to buffer more than `max_size` bytes.
///
/// The limit applies to the decoded stream, so a small gzip body that
/// inflates past it is cut off as soon as the limit is crossed.
async fn read_body(body: axum::body::Body, max_size: usize) -> Result<Vec<u8>, ApiError> {
    let data = Limited::new(body, max_size)
        .collect()
        .await
        .map_err(|err| {
            if err.downcast_ref::<LengthLimitError>().is_some() {
                ApiError::PayloadTooLarge(max_size)
            } else {
                ApiError::InvalidPayload(format!("unreadable body: {err}"))
            }
        })?
        .to_bytes()
        .to_vec();

    Ok(data)
}

fn store_error(state: &AppState, err: RepositoryError) -> ApiError {
    state.metrics.store_failed();
    warn!(error = %err, "Store operation failed");
    err.into()
}
