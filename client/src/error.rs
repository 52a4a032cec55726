//! Backend error types.

use std::fmt;

use thiserror::Error;

/// Backend operation that produced an error, for messages and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Initialize,
    RandomCar,
    SubmitVote,
}

impl Operation {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::RandomCar => "random car",
            Self::SubmitVote => "submit vote",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors from the car rating backend.
///
/// `StoreEmpty` and `AlreadyInitialized` are structured signals derived from
/// status codes and response fields; callers match on them instead of
/// inspecting message text.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The store holds no cars yet.
    #[error("car store is empty")]
    StoreEmpty,
    /// Initialization was refused because the store already has data.
    #[error("car store already initialized: {message}")]
    AlreadyInitialized { message: String },
    #[error("{operation} failed with HTTP {status}: {detail}")]
    Status {
        operation: Operation,
        status: u16,
        detail: String,
    },
    #[error("{operation} request failed: {source}")]
    Transport {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid {operation} response: {reason}")]
    InvalidResponse { operation: Operation, reason: String },
}

impl ApiError {
    pub(crate) fn transport(operation: Operation) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Transport { operation, source }
    }

    pub(crate) fn invalid(operation: Operation, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            operation,
            reason: reason.into(),
        }
    }
}
