//! Subscriber record entity.
//!
//! One row per user describing subscription and trial state. The record is
//! flat on purpose: it mirrors the persisted `subscribers` table. Readers that
//! need to reason about it go through [`SubscriberState`](super::SubscriberState).
//!
//! # Writers
//!
//! - Trial provisioning creates the record on first sign-in.
//! - The payment webhook relay and the admin action mutate it.
//! - Access resolution never writes it.

use crate::domain::foundation::{Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Default trial length granted on first sign-in.
pub const DEFAULT_TRIAL_DAYS: i64 = 30;

/// Persisted subscription/trial state for one user.
///
/// # Invariants
///
/// - `user_id` is unique
/// - when both are present, `trial_started_at <= trial_ends_at`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberRecord {
    /// User who owns this record.
    pub user_id: UserId,

    /// E-mail the user signed in with. Used to match payment events.
    pub email: Option<String>,

    /// True while a paid subscription exists. May be stale; see `subscription_end`.
    pub subscribed: bool,

    /// End of the paid period, if the subscription has one.
    pub subscription_end: Option<Timestamp>,

    /// True if the user was ever granted a trial.
    pub is_trial: bool,

    /// Start of the trial window.
    pub trial_started_at: Option<Timestamp>,

    /// End of the trial window (exclusive).
    pub trial_ends_at: Option<Timestamp>,
}

impl SubscriberRecord {
    /// Create the record a first sign-in provisions: trial over `[now, now + trial_days)`.
    pub fn new_trial(
        user_id: UserId,
        email: Option<String>,
        now: Timestamp,
        trial_days: i64,
    ) -> Self {
        Self {
            user_id,
            email,
            subscribed: false,
            subscription_end: None,
            is_trial: true,
            trial_started_at: Some(now),
            trial_ends_at: Some(now.add_days(trial_days)),
        }
    }

    /// Mark the subscription as paid until `ends_at` (`None` = open-ended).
    pub fn activate_subscription(&mut self, ends_at: Option<Timestamp>) {
        self.subscribed = true;
        self.subscription_end = ends_at;
    }

    /// End the subscription effective `now`.
    pub fn revoke_subscription(&mut self, now: Timestamp) {
        self.subscribed = false;
        self.subscription_end = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserId {
        UserId::new("user-123").unwrap()
    }

    fn now() -> Timestamp {
        Timestamp::parse_rfc3339("2025-03-01T08:00:00Z").unwrap()
    }

    #[test]
    fn new_trial_opens_window_of_requested_length() {
        let record = SubscriberRecord::new_trial(user(), None, now(), DEFAULT_TRIAL_DAYS);

        assert!(record.is_trial);
        assert!(!record.subscribed);
        assert!(record.subscription_end.is_none());
        assert_eq!(record.trial_started_at, Some(now()));
        assert_eq!(record.trial_ends_at, Some(now().add_days(30)));
    }

    #[test]
    fn activate_then_revoke() {
        let mut record = SubscriberRecord::new_trial(user(), None, now(), 30);

        record.activate_subscription(Some(now().add_days(365)));
        assert!(record.subscribed);
        assert_eq!(record.subscription_end, Some(now().add_days(365)));

        record.revoke_subscription(now());
        assert!(!record.subscribed);
        assert_eq!(record.subscription_end, Some(now()));
    }

    #[test]
    fn activation_without_end_clears_previous_end() {
        let mut record = SubscriberRecord::new_trial(user(), None, now(), 30);
        record.revoke_subscription(now());

        record.activate_subscription(None);
        assert!(record.subscribed);
        assert!(record.subscription_end.is_none());
    }

    #[test]
    fn trial_fields_survive_subscription_changes() {
        let mut record = SubscriberRecord::new_trial(user(), None, now(), 30);
        record.activate_subscription(None);

        assert!(record.is_trial);
        assert_eq!(record.trial_ends_at, Some(now().add_days(30)));
    }
}
