//! Error types for dispatcher operations.

use std::io;

use thiserror::Error;

/// Raw OS code for "too many open files" on unix targets.
#[cfg(unix)]
const TOO_MANY_OPEN_FILES: Option<i32> = Some(libc::EMFILE);

/// `ERROR_TOO_MANY_OPEN_FILES` from the Win32 error table.
#[cfg(windows)]
const TOO_MANY_OPEN_FILES: Option<i32> = Some(4);

#[cfg(not(any(unix, windows)))]
const TOO_MANY_OPEN_FILES: Option<i32> = None;

/// Errors reported by an operation provider while running a work unit.
#[derive(Debug, Error)]
pub enum OperationError {
    /// Underlying I/O failure, passed through verbatim.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The provider ran out of OS handles.
    #[error("too many open handles")]
    ResourceExhausted,
    /// The unit panicked while starting or running.
    #[error("operation panicked: {0}")]
    Panicked(String),
    /// Provider-specific failure with context.
    #[error("{0}")]
    Other(String),
}

impl OperationError {
    /// Whether this error means the OS handle table is full.
    ///
    /// Such errors trigger a budget shrink and a retry instead of reaching the caller.
    #[must_use]
    pub fn is_resource_exhausted(&self) -> bool {
        match self {
            Self::ResourceExhausted => true,
            Self::Io(err) => {
                TOO_MANY_OPEN_FILES.is_some() && err.raw_os_error() == TOO_MANY_OPEN_FILES
            }
            Self::Panicked(_) | Self::Other(_) => false,
        }
    }
}

/// Errors surfaced to callers of the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A ceiling that is NaN, infinite, or below one was rejected.
    #[error("invalid handle limit: {0}")]
    InvalidLimit(f64),
    /// Exhaustion was reported with no other unit left in flight.
    #[error("handle table exhausted with no outstanding units left to shrink to")]
    BudgetExhausted,
    /// The caller cancelled the unit before it was admitted.
    #[error("operation cancelled before admission")]
    Cancelled,
    /// The operation failed with a non-exhaustion error.
    #[error("operation failed: {0}")]
    OperationFailed(#[from] OperationError),
    /// The driving task went away without delivering a result.
    #[error("operation abandoned before completion")]
    Abandoned,
    /// A request did not describe a known operation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// Configuration could not be turned into a dispatcher.
    #[error("config invalid: {0}")]
    Config(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
