//! Storage error types
//!
//! Defines all errors that can occur in the storage layer.

use thiserror::Error;

/// Errors that can occur in a log store
#[derive(Error, Debug)]
pub enum StorageError {
    /// The database rejected or failed a statement
    #[error("Database error: {0}")]
    Database(String),

    /// I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Lock acquisition failed
    #[error("Lock error: {0}")]
    Lock(String),

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Input could not be stored as given
    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Database(err.to_string())
    }
}

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = StorageError::NotFound("nutrition for FDC id 42".to_string());
        assert_eq!(err.to_string(), "Not found: nutrition for FDC id 42");

        let err = StorageError::Invalid("bad timestamp".to_string());
        assert_eq!(err.to_string(), "Invalid input: bad timestamp");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let storage_err: StorageError = io_err.into();
        assert!(matches!(storage_err, StorageError::Io(_)));
    }

    #[test]
    fn test_sqlite_error_conversion() {
        let storage_err: StorageError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(storage_err, StorageError::Database(_)));
    }
}
