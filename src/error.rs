use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::storage::StorageError,
    state::error::{DomainError, StateError, ValidationError},
};

/// Errors that can occur in service layer operations.
///
/// Apart from [`ServiceError::Unavailable`], the display string is the bare
/// domain message callers match on.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Invalid input provided by the caller.
    #[error("{0}")]
    InvalidInput(String),
    /// Operation cannot be performed in the current state.
    #[error("{0}")]
    InvalidState(String),
    /// Requested resource was not found for this owner.
    #[error("{0}")]
    NotFound(String),
    /// The entity changed concurrently or already exists.
    #[error("{0}")]
    Conflict(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::VersionConflict { .. } | StorageError::Duplicate { .. } => {
                ServiceError::Conflict(err.to_string())
            }
            StorageError::OwnerMismatch { .. } => ServiceError::NotFound(err.to_string()),
            StorageError::MissingGame { .. } => ServiceError::NotFound("Match not found".into()),
            StorageError::Unavailable { .. } => ServiceError::Unavailable(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::InvalidInput(err.to_string())
    }
}

impl From<StateError> for ServiceError {
    fn from(err: StateError) -> Self {
        ServiceError::InvalidState(err.to_string())
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(err) => err.into(),
            DomainError::State(err) => err.into(),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        let mut fields: Vec<_> = err.field_errors().into_iter().collect();
        fields.sort_by(|(a, _), (b, _)| a.cmp(b));

        let message = fields
            .into_iter()
            .find_map(|(field, errors)| {
                errors.first().map(|error| {
                    error
                        .message
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_else(|| format!("{field} is invalid"))
                })
            })
            .unwrap_or_else(|| format!("validation failed: {err}"));
        ServiceError::InvalidInput(message)
    }
}
