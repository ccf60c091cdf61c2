//! Execution errors.
//!
//! Every variant displays a generic message; the driver detail stays in
//! `source()` and in the logs.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("query execution failed")]
    Backend(#[from] rusqlite::Error),

    #[error("query execution failed")]
    Pool(#[from] deadpool_sqlite::PoolError),

    #[error("query execution failed")]
    CreatePool(#[from] deadpool_sqlite::CreatePoolError),

    #[error("query execution failed")]
    Interact { detail: String },

    #[error("query execution timed out")]
    Timeout { after: Duration },

    #[error("query execution failed")]
    Decode { column: String, detail: String },
}

pub type ExecutionResult<T> = Result<T, ExecutionError>;

impl ExecutionError {
    /// Full internal description, for logs only.
    pub fn detail(&self) -> String {
        match self {
            ExecutionError::Backend(e) => format!("sqlite: {}", e),
            ExecutionError::Pool(e) => format!("pool: {}", e),
            ExecutionError::CreatePool(e) => format!("pool setup: {}", e),
            ExecutionError::Interact { detail } => format!("worker: {}", detail),
            ExecutionError::Timeout { after } => format!("timed out after {:?}", after),
            ExecutionError::Decode { column, detail } => {
                format!("decoding column {}: {}", column, detail)
            }
        }
    }

    /// Whether running the same statement again may succeed.
    ///
    /// Lock contention and pool exhaustion are transient. Timeouts are not:
    /// the statement already used its whole budget.
    pub fn is_transient(&self) -> bool {
        match self {
            ExecutionError::Backend(rusqlite::Error::SqliteFailure(e, _)) => matches!(
                e.code,
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
            ),
            ExecutionError::Pool(deadpool_sqlite::PoolError::Timeout(_)) => true,
            _ => false,
        }
    }
}
