/// Store errors
///
/// "Not found" is never an error at this layer: lookups return `Ok(None)` or
/// omit missing rows. A `StoreError` means the store itself could not answer.

use thiserror::Error;

/// Failure of the persistence layer
#[derive(Debug, Error)]
pub enum StoreError {
    /// The database rejected or failed the query
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness constraint was violated
    #[error("Duplicate {0}")]
    Duplicate(String),
}

/// Result alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// Maps a unique-constraint violation to `Duplicate`, anything else to `Database`
    pub fn from_insert(error: sqlx::Error, what: &str) -> Self {
        match &error {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Duplicate(what.to_string())
            }
            _ => StoreError::Database(error),
        }
    }
}
