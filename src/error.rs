use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    /// Persistence failure after retries are exhausted. Never retried further.
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Whether the retry wrapper may retry this error. I/O, pool, database,
    /// and malformed-document failures are retryable; logical failures
    /// (validation, missing records, denied access) and already-exhausted
    /// storage errors are final.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CoreError::Database(_) | CoreError::Pool(_) | CoreError::Io(_) | CoreError::Json(_)
        )
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
