//! Error types for backend dispatch

use casemap_edit::{OperationError, UnresolvedTarget};

/// A backend call failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BackendError {
    /// The backend refused the write
    #[error("backend rejected the request: {message}")]
    Rejected {
        /// Message the backend returned, possibly empty
        message: String,
    },

    /// Referenced entity does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// Request never completed
    #[error("transport failure: {0}")]
    Transport(String),
}

impl BackendError {
    /// Rejection with a message
    #[inline]
    #[must_use]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Text for the transient notice, falling back to `default`
    #[must_use]
    pub fn user_message<'a>(&'a self, default: &'a str) -> &'a str {
        match self {
            Self::Rejected { message } if !message.trim().is_empty() => message,
            _ => default,
        }
    }
}

/// Outcome of a dispatcher entry point that did not fully succeed
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A backend mutation failed (notice already shown)
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// The widget payload could not be decoded (ignored)
    #[error(transparent)]
    Operation(#[from] OperationError),

    /// A move had no resolvable target module (nothing was sent)
    #[error(transparent)]
    UnresolvedTarget(#[from] UnresolvedTarget),

    /// No graph document is loaded
    #[error("no graph document is loaded")]
    NotLoaded,
}

impl SyncError {
    /// Whether a backend call was made and failed
    #[inline]
    #[must_use]
    pub fn is_backend(&self) -> bool {
        matches!(self, Self::Backend(_))
    }
}
