use super::models::Config;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Database {field} must not be empty")]
    EmptyDatabaseField { field: &'static str },

    #[error("Port must be non-zero: {field}")]
    ZeroPort { field: &'static str },

    #[error("Schema '{0}' is not a plain SQL identifier")]
    InvalidSchema(String),

    #[error("Retry policy needs at least one attempt")]
    NoAttempts,

    #[error("Retry multiplier must be at least 1")]
    InvalidMultiplier,

    #[error("Retry base delay ({base_ms}ms) exceeds max delay ({max_ms}ms)")]
    DelayExceedsCap { base_ms: u64, max_ms: u64 },

    #[error("max_message_bytes must be positive")]
    InvalidMessageLimit,
}

/// Validate the entire configuration
pub fn validate(config: &Config) -> Result<(), ValidationError> {
    validate_server(config)?;
    validate_database(config)?;
    validate_retry(config)?;
    Ok(())
}

fn validate_server(config: &Config) -> Result<(), ValidationError> {
    if config.server.max_message_bytes == 0 {
        return Err(ValidationError::InvalidMessageLimit);
    }
    Ok(())
}

fn validate_database(config: &Config) -> Result<(), ValidationError> {
    let db = &config.database;

    for (field, value) in [
        ("host", &db.host),
        ("username", &db.username),
        ("name", &db.name),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyDatabaseField { field });
        }
    }

    if db.port == 0 {
        return Err(ValidationError::ZeroPort {
            field: "database.port",
        });
    }

    if !is_plain_identifier(&db.schema) {
        return Err(ValidationError::InvalidSchema(db.schema.clone()));
    }

    Ok(())
}

fn validate_retry(config: &Config) -> Result<(), ValidationError> {
    let retry = &config.database.retry;

    if retry.max_attempts == 0 {
        return Err(ValidationError::NoAttempts);
    }
    if retry.multiplier == 0 {
        return Err(ValidationError::InvalidMultiplier);
    }
    if retry.base_delay_ms > retry.max_delay_ms {
        return Err(ValidationError::DelayExceedsCap {
            base_ms: retry.base_delay_ms,
            max_ms: retry.max_delay_ms,
        });
    }

    Ok(())
}

/// `[A-Za-z_][A-Za-z0-9_]*`, safe to use unquoted in `search_path`
fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connector::RetryPolicy;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_empty_database_name() {
        let mut config = Config::default();
        config.database.name = "  ".to_string();

        let result = validate(&config);
        assert!(matches!(
            result,
            Err(ValidationError::EmptyDatabaseField { field: "name" })
        ));
    }

    #[test]
    fn test_zero_port() {
        let mut config = Config::default();
        config.database.port = 0;

        assert!(matches!(
            validate(&config),
            Err(ValidationError::ZeroPort { .. })
        ));
    }

    #[test]
    fn test_schema_must_be_identifier() {
        let mut config = Config::default();

        for bad in ["", "1ops", "ops; DROP TABLE log", "o-ps"] {
            config.database.schema = bad.to_string();
            assert!(
                matches!(validate(&config), Err(ValidationError::InvalidSchema(_))),
                "accepted {bad:?}"
            );
        }

        config.database.schema = "_ops2".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_retry_policy_checks() {
        let mut config = Config::default();

        config.database.retry = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert!(matches!(validate(&config), Err(ValidationError::NoAttempts)));

        config.database.retry = RetryPolicy {
            multiplier: 0,
            ..RetryPolicy::default()
        };
        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidMultiplier)
        ));

        config.database.retry = RetryPolicy {
            base_delay_ms: 20_000,
            max_delay_ms: 1_000,
            ..RetryPolicy::default()
        };
        assert!(matches!(
            validate(&config),
            Err(ValidationError::DelayExceedsCap { .. })
        ));
    }

    #[test]
    fn test_zero_message_limit() {
        let mut config = Config::default();
        config.server.max_message_bytes = 0;

        assert!(matches!(
            validate(&config),
            Err(ValidationError::InvalidMessageLimit)
        ));
    }
}
