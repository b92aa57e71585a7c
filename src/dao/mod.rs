/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Persistence ports and the in-memory adapter.
pub mod store;
