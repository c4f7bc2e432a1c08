use chrono::NaiveDateTime;
use thiserror::Error;

use crate::connector::ConnectionError;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Timestamp {0} cannot be mapped to a fixed-width partition name")]
    TimestampOutOfRange(NaiveDateTime),

    #[error("Unexpected catalog entry: {0}")]
    UnexpectedCatalog(String),

    #[error("Table not found: {0}")]
    UnknownTable(String),
}

impl RepositoryError {
    /// Whether the store could not be reached at all
    pub fn is_connection(&self) -> bool {
        matches!(self, RepositoryError::Connection(_))
    }
}

pub type Result<T> = std::result::Result<T, RepositoryError>;
