use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while opening or migrating the database
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of nightdeck appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Classify a sqlx error, mapping lock conditions to `InstanceLocked`
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if is_lock_message(&err.to_string()) {
            return DatabaseError::InstanceLocked;
        }
        DatabaseError::Other(err)
    }
}

/// SQLITE_BUSY, SQLITE_LOCKED and SQLITE_CANTOPEN all surface as one of these.
pub(crate) fn is_lock_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("database is locked")
        || message.contains("database table is locked")
        || message.contains("sqlite_busy")
        || message.contains("sqlite_locked")
        || message.contains("unable to open database file")
}

/// Errors from reading or writing a key/value blob
#[derive(Debug, Error)]
pub enum StorageError {
    /// The store could not be read or written
    #[error("storage unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    /// A stored value is not valid JSON for the requested type
    #[error("stored value is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_messages_are_detected() {
        assert!(is_lock_message("error returned from database: database is locked"));
        assert!(is_lock_message("SQLITE_BUSY"));
        assert!(is_lock_message("(code: 14) unable to open database file"));
        assert!(!is_lock_message("no such table: kv_store"));
    }

    #[test]
    fn test_pool_closed_is_not_instance_lock() {
        let err = DatabaseError::from_sqlx(sqlx::Error::PoolClosed);
        assert!(matches!(err, DatabaseError::Other(_)));
    }
}
