//! Validation helpers for DTOs.

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use validator::ValidationError;

/// Validates that a player identifier is not blank.
pub fn validate_player_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        let mut err = ValidationError::new("player_id_blank");
        err.message = Some("Player ID is required".into());
        return Err(err);
    }
    Ok(())
}

/// Validates that every entry of a player list is a non-blank identifier.
///
/// Size, uniqueness and roster membership are checked by the game itself.
pub fn validate_player_ids(ids: &[String]) -> Result<(), ValidationError> {
    if ids.iter().any(|id| id.trim().is_empty()) {
        let mut err = ValidationError::new("player_ids_blank");
        err.message = Some("Player IDs must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Validates that a timestamp is RFC 3339.
///
/// # Examples
///
/// ```ignore
/// validate_timestamp("2025-03-01T18:30:00Z")      // Ok
/// validate_timestamp("2025-03-01T18:30:00+01:00") // Ok
/// validate_timestamp("2025-03-01")                // Err - no time
/// ```
pub fn validate_timestamp(value: &str) -> Result<(), ValidationError> {
    if OffsetDateTime::parse(value, &Rfc3339).is_err() {
        let mut err = ValidationError::new("timestamp_format");
        err.message = Some(format!("Invalid timestamp: {value}").into());
        return Err(err);
    }
    Ok(())
}
