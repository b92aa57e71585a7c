//! Plain serde types exchanged with the use-case layer.

use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::state::error::ValidationError;

pub mod common;
pub mod game;
pub mod stats;
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

fn parse_system_time(field: &'static str, value: &str) -> Result<SystemTime, ValidationError> {
    OffsetDateTime::parse(value, &Rfc3339)
        .map(SystemTime::from)
        .map_err(|_| ValidationError::new(field, format!("Invalid timestamp: {value}")))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn timestamps_use_rfc3339() {
        let time = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let formatted = format_system_time(time);
        assert_eq!(formatted, "2023-11-14T22:13:20Z");
        assert_eq!(parse_system_time("scheduled_at", &formatted).unwrap(), time);
    }

    #[test]
    fn rejects_garbage_timestamps() {
        let err = parse_system_time("scheduled_at", "tomorrow").unwrap_err();
        assert_eq!(err.to_string(), "Invalid timestamp: tomorrow");
    }
}
