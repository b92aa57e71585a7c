use serde::Serialize;

use crate::error::ServiceError;

/// `{success, data | error}` envelope handed back to callers.
///
/// `error` carries the exact domain message.
#[derive(Debug, Serialize)]
pub struct Outcome<T> {
    /// Whether the operation applied.
    pub success: bool,
    /// Payload of a successful operation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Failure message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> From<Result<T, ServiceError>> for Outcome<T> {
    fn from(result: Result<T, ServiceError>) -> Self {
        match result {
            Ok(data) => Self {
                success: true,
                data: Some(data),
                error: None,
            },
            Err(err) => Self {
                success: false,
                data: None,
                error: Some(err.to_string()),
            },
        }
    }
}
