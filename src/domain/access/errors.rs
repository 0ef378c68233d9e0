//! Access resolution errors.

use thiserror::Error;

use crate::domain::foundation::UserId;

use super::AccessDecision;

/// Errors surfaced by access resolution.
///
/// Unauthenticated callers and missing records are not errors: both fold
/// into [`AccessDecision::no_access`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The subscriber store could not be reached. Never defaults to access.
    #[error("Access status unavailable: {0}")]
    StatusUnavailable(String),

    /// The stored record could not be interpreted.
    #[error("Malformed subscriber record for {user_id}: {reason}")]
    MalformedRecord { user_id: UserId, reason: String },
}

impl AccessError {
    /// Creates a status unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::StatusUnavailable(message.into())
    }

    /// Creates a malformed record error.
    pub fn malformed(user_id: UserId, reason: impl Into<String>) -> Self {
        Self::MalformedRecord {
            user_id,
            reason: reason.into(),
        }
    }

    /// Returns true if retrying the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, AccessError::StatusUnavailable(_))
    }

    /// Decision a caller may act on despite the error.
    ///
    /// Malformed data locks the user out. An unavailable store has no
    /// fallback: the caller keeps whatever it last knew.
    pub fn fail_closed_decision(&self) -> Option<AccessDecision> {
        match self {
            AccessError::MalformedRecord { .. } => Some(AccessDecision::no_access()),
            AccessError::StatusUnavailable(_) => None,
        }
    }
}
