//! AccessStatusResolver - Query handler computing a user's access decision.
//!
//! Inputs are explicit: an optional user id and the instant to evaluate at.
//! The resolver holds no per-user state and never writes.

use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::domain::access::{AccessDecision, AccessError};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{LookupError, SubscriberReader};

/// Resolves access decisions from subscriber records.
pub struct AccessStatusResolver {
    reader: Arc<dyn SubscriberReader>,
}

impl AccessStatusResolver {
    pub fn new(reader: Arc<dyn SubscriberReader>) -> Self {
        Self { reader }
    }

    /// Compute the decision for `user_id` at `now`.
    ///
    /// Anonymous callers and unprovisioned users get
    /// [`AccessDecision::no_access`]. Anonymous callers never reach the store.
    ///
    /// # Errors
    ///
    /// - `StatusUnavailable` - the store could not be reached
    /// - `MalformedRecord` - the stored row could not be decoded
    pub async fn resolve(
        &self,
        user_id: Option<&UserId>,
        now: Timestamp,
    ) -> Result<AccessDecision, AccessError> {
        let Some(user_id) = user_id else {
            debug!("Anonymous access check, denying");
            return Ok(AccessDecision::no_access());
        };

        let record = self
            .reader
            .get_subscriber(user_id)
            .await
            .map_err(|e| lookup_failure(user_id, e))?;

        let decision = AccessDecision::evaluate(record.as_ref(), now);

        debug!(
            user_id = %user_id,
            found = record.is_some(),
            is_premium = decision.is_premium,
            is_in_trial = decision.is_in_trial,
            trial_days_left = decision.trial_days_left,
            "Access resolved"
        );

        Ok(decision)
    }

    /// Re-resolve after a known state change. Same contract as [`resolve`](Self::resolve).
    pub async fn refresh(
        &self,
        user_id: Option<&UserId>,
        now: Timestamp,
    ) -> Result<AccessDecision, AccessError> {
        self.resolve(user_id, now).await
    }
}

fn lookup_failure(user_id: &UserId, err: LookupError) -> AccessError {
    match err {
        LookupError::Unavailable(message) => {
            error!(user_id = %user_id, error = %message, "Subscriber lookup failed");
            AccessError::StatusUnavailable(message)
        }
        LookupError::Malformed { field, reason } => {
            warn!(
                user_id = %user_id,
                field = %field,
                reason = %reason,
                "Malformed subscriber record, failing closed"
            );
            AccessError::malformed(user_id.clone(), format!("{}: {}", field, reason))
        }
    }
}
