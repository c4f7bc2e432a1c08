//! API utility functions
//!
//! Pure, stateless helpers for request validation, kept out of
//! `services.rs` so they can be unit tested on their own.

use crate::api::error::ApiError;

/// Parses and validates Content-Type header for application/json
///
/// Accepts `application/json`, optionally with a charset parameter.
/// Rejects look-alikes such as `application/jsonp` or `text/json`.
pub fn parse_content_type(content_type: &str) -> Result<mime::Mime, ApiError> {
    let media_type: mime::Mime = content_type.parse().map_err(|_| {
        ApiError::InvalidPayload(format!("invalid Content-Type: {}", content_type))
    })?;

    if media_type.type_() != mime::APPLICATION || media_type.subtype() != mime::JSON {
        return Err(ApiError::InvalidPayload(format!(
            "Content-Type must be application/json, got: {}/{}",
            media_type.type_(),
            media_type.subtype()
        )));
    }

    Ok(media_type)
}

/// A log message must carry text and fit in a PostgreSQL `TEXT` column
pub fn validate_message(message: &str) -> Result<(), ApiError> {
    if message.trim().is_empty() {
        return Err(ApiError::InvalidPayload("message must not be empty".into()));
    }
    if message.contains('\0') {
        return Err(ApiError::InvalidPayload(
            "message must not contain NUL characters".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_content_types() {
        for accepted in ["application/json", "application/json; charset=utf-8"] {
            assert!(parse_content_type(accepted).is_ok(), "{accepted}");
        }
        for rejected in ["application/jsonp", "text/json", "text/plain", ""] {
            assert!(parse_content_type(rejected).is_err(), "{rejected}");
        }
    }

    #[test]
    fn test_validate_message() {
        assert!(validate_message("Server started.").is_ok());
        assert!(validate_message("").is_err());
        assert!(validate_message("   \n").is_err());
        assert!(validate_message("nul\0byte").is_err());
    }
}
