//! Crate-level error taxonomy.
//!
//! Client-caused failures (validation, resolution, plan) are separated from
//! server-caused ones (execution, internal) so surfaces can map them to
//! 4xx/5xx without inspecting messages.

use thiserror::Error;

use crate::config::SettingsError;
use crate::execution::ExecutionError;
use crate::loader::LoadError;
use crate::planner::PlanError;
use crate::request::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Resolution,
    Plan,
    Execution,
    Internal,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Execution(#[from] ExecutionError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::Plan(e) if e.is_resolution() => ErrorKind::Resolution,
            Error::Plan(_) => ErrorKind::Plan,
            Error::Execution(_) => ErrorKind::Execution,
            Error::Load(LoadError::Execution(_)) => ErrorKind::Execution,
            Error::Load(_) | Error::Settings(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller can fix this by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Validation | ErrorKind::Resolution | ErrorKind::Plan
        )
    }
}
