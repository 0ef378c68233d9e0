//! Subscriber state classification.
//!
//! The persisted record is a bag of booleans and optional timestamps. This
//! module folds it, for one instant `now`, into a tagged variant so that every
//! "has this window closed yet?" comparison lives in exactly one place.
//!
//! ```text
//! NoRecord ──provision──▶ Trialing ──pay──▶ Subscribed ◀──renew──┐
//!                            │                  │                │
//!                            └──trial ends──▶ Expired ◀──end passes
//! ```
//!
//! Transitions are driven by provisioning, the payment webhook and admins.
//! Classification only observes where `now` falls relative to the stored
//! window ends.

use crate::domain::foundation::Timestamp;

use super::SubscriberRecord;

/// Where a subscriber stands at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    /// No subscriber record exists (not yet provisioned).
    NoRecord,

    /// Trial window still open, no live subscription.
    Trialing { ends_at: Timestamp },

    /// Live paid subscription. `trial_ends_at` is set when a trial window
    /// overlaps the subscription and is still open.
    Subscribed {
        ends_at: Option<Timestamp>,
        trial_ends_at: Option<Timestamp>,
    },

    /// Neither a live subscription nor an open trial.
    Expired,
}

impl SubscriberState {
    /// Classify `record` at instant `now`.
    ///
    /// A stored `subscribed = true` is not trusted on its own: a
    /// `subscription_end` at or before `now` makes the subscription expired.
    pub fn classify(record: Option<&SubscriberRecord>, now: Timestamp) -> Self {
        let Some(record) = record else {
            return SubscriberState::NoRecord;
        };

        let open_trial_end = record
            .trial_ends_at
            .filter(|end| record.is_trial && window_open(end, now));

        let subscription_live =
            record.subscribed && record.subscription_end.map_or(true, |end| window_open(&end, now));

        match (subscription_live, open_trial_end) {
            (true, trial_ends_at) => SubscriberState::Subscribed {
                ends_at: record.subscription_end,
                trial_ends_at,
            },
            (false, Some(ends_at)) => SubscriberState::Trialing { ends_at },
            (false, None) => SubscriberState::Expired,
        }
    }

    /// True for a live paid subscription.
    pub fn is_premium(&self) -> bool {
        matches!(self, SubscriberState::Subscribed { .. })
    }

    /// End of the open trial window, if any.
    pub fn open_trial_end(&self) -> Option<Timestamp> {
        match self {
            SubscriberState::Trialing { ends_at } => Some(*ends_at),
            SubscriberState::Subscribed { trial_ends_at, .. } => *trial_ends_at,
            SubscriberState::NoRecord | SubscriberState::Expired => None,
        }
    }
}

/// Window ends are exclusive: open only while `end` is strictly after `now`.
fn window_open(end: &Timestamp, now: Timestamp) -> bool {
    end.is_after(&now)
}
