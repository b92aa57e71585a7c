use std::error::Error;
use thiserror::Error;
use uuid::Uuid;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not be reached.
    #[error("storage unavailable: {message}")]
    Unavailable {
        /// What the store was doing.
        message: String,
        /// Backend failure.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The entity changed since it was loaded.
    #[error("entity `{id}` changed concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        /// Entity identifier.
        id: Uuid,
        /// Version carried by the write.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },
    /// A uniqueness rule of the store was violated.
    #[error("duplicate entity: {message}")]
    Duplicate {
        /// Which rule was violated.
        message: String,
    },
    /// A ledger or substitution refers to a game that is not stored.
    #[error("game `{id}` does not exist")]
    MissingGame {
        /// Game identifier.
        id: Uuid,
    },
    /// The id exists but belongs to another owner.
    #[error("entity `{id}` belongs to another owner")]
    OwnerMismatch {
        /// Entity identifier.
        id: Uuid,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}
