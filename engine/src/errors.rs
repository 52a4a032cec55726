//! Session failure kinds and user-facing messages.

use std::fmt;

/// Shown for every fatal session failure; details go to the log.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Something went wrong while talking to the car server.";

pub const RESTART_HINT: &str = "Restart the session to try again.";

/// Which step of the session failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Seeding an empty store failed.
    Init,
    /// Fetching a car failed, including an empty store after seeding.
    Fetch,
    /// Recording a vote failed.
    Vote,
}

impl FailureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Fetch => "fetch",
            Self::Vote => "vote",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fatal failure carried by `SessionPhase::Failed`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFailure {
    pub kind: FailureKind,
    /// Diagnostic text for logs; never shown to the user.
    pub detail: String,
}

impl SessionFailure {
    pub fn new(kind: FailureKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
        }
    }

    #[must_use]
    pub fn user_message(&self) -> &'static str {
        GENERIC_FAILURE_MESSAGE
    }

    #[must_use]
    pub fn restart_hint(&self) -> &'static str {
        RESTART_HINT
    }
}

impl fmt::Display for SessionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.kind, self.detail)
    }
}
