//! Subscriber repository port (write side).
//!
//! Used by trial provisioning, the payment webhook relay and the admin
//! action. Access resolution never depends on this port.

use async_trait::async_trait;

use crate::domain::access::SubscriberRecord;
use crate::domain::foundation::{DomainError, UserId};

/// Repository port for subscriber persistence.
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Find a subscriber by user id.
    async fn find_by_user_id(&self, user_id: &UserId)
        -> Result<Option<SubscriberRecord>, DomainError>;

    /// Find a subscriber by e-mail, compared case-insensitively.
    async fn find_by_email(&self, email: &str) -> Result<Option<SubscriberRecord>, DomainError>;

    /// Insert `record` unless one already exists for its user.
    ///
    /// Returns `true` if the record was inserted, `false` if one was present.
    async fn insert_if_absent(&self, record: &SubscriberRecord) -> Result<bool, DomainError>;

    /// Persist subscription fields of an existing record.
    ///
    /// # Errors
    ///
    /// Returns `SubscriberNotFound` if no record exists for the user.
    async fn update(&self, record: &SubscriberRecord) -> Result<(), DomainError>;
}
