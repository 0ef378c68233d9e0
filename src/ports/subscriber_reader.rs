//! Subscriber reader port (read side).
//!
//! The only collaborator access resolution talks to. Implementations must be
//! side-effect free and must distinguish "no record" from "could not look".

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::access::SubscriberRecord;
use crate::domain::foundation::UserId;

/// Failure to fetch a subscriber record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The store could not be reached or timed out.
    #[error("Subscriber store unavailable: {0}")]
    Unavailable(String),

    /// A row exists but a column could not be decoded.
    #[error("Malformed subscriber field '{field}': {reason}")]
    Malformed { field: String, reason: String },
}

impl LookupError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    pub fn malformed(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Read access to subscriber records.
#[async_trait]
pub trait SubscriberReader: Send + Sync {
    /// Fetch the record for `user_id`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(record))` - record exists
    /// * `Ok(None)` - user was never provisioned
    /// * `Err(LookupError)` - transient failure or undecodable row
    async fn get_subscriber(&self, user_id: &UserId)
        -> Result<Option<SubscriberRecord>, LookupError>;
}
