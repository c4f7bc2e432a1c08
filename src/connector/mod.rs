//! Store connector: opens one PostgreSQL session per call.
//!
//! There is no pool. Every [`StoreConnector::connect`] performs a fresh
//! handshake, retried according to the configured [`RetryPolicy`]; the
//! caller owns the returned connection and closes it (dropping it also
//! closes the socket).

pub mod backoff;

use sqlx::Connection;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use thiserror::Error;
use tracing::debug;

use crate::config::DatabaseConfig;

pub use backoff::{Backoff, RetryExhausted, RetryPolicy, retry};

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("store {target} unreachable after {attempts} attempt(s): {source}")]
    Exhausted {
        target: String,
        attempts: u32,
        #[source]
        source: sqlx::Error,
    },
}

/// Session factory for the log database
#[derive(Debug, Clone)]
pub struct StoreConnector {
    options: PgConnectOptions,
    policy: RetryPolicy,
    target: String,
}

impl StoreConnector {
    pub fn new(config: &DatabaseConfig) -> Self {
        let mut options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.username)
            .database(&config.name)
            .options([("search_path", config.schema.as_str())]);
        if let Some(password) = &config.password {
            options = options.password(password);
        }

        Self {
            options,
            policy: config.retry,
            target: format!("{}:{}/{}", config.host, config.port, config.name),
        }
    }

    /// Human-readable `host:port/database`, without credentials
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub async fn connect(&self) -> Result<PgConnection, ConnectionError> {
        let conn = retry(&self.policy, move |attempt| {
            debug!(target_db = %self.target, attempt, "Opening store session");
            PgConnection::connect_with(&self.options)
        })
        .await
        .map_err(|exhausted| ConnectionError::Exhausted {
            target: self.target.clone(),
            attempts: exhausted.attempts,
            source: exhausted.error,
        })?;

        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> DatabaseConfig {
        DatabaseConfig {
            host: "127.0.0.1".to_string(),
            // Reserved port, nothing listens here
            port: 1,
            retry: RetryPolicy::immediate(2),
            ..DatabaseConfig::default()
        }
    }

    #[test]
    fn test_target_omits_credentials() {
        let config = DatabaseConfig {
            password: Some("hunter2".to_string()),
            ..DatabaseConfig::default()
        };
        let connector = StoreConnector::new(&config);

        assert_eq!(connector.target(), "localhost:5432/logs");
        assert!(!connector.target().contains("hunter2"));
    }

    #[tokio::test]
    async fn test_connect_reports_exhausted_attempts() {
        let connector = StoreConnector::new(&unreachable_config());

        let err = connector.connect().await.unwrap_err();
        match err {
            ConnectionError::Exhausted { attempts, target, .. } => {
                assert_eq!(attempts, 2);
                assert_eq!(target, "127.0.0.1:1/logs");
            }
        }
    }
}
