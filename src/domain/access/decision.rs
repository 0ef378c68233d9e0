//! Access decision value object.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::{SubscriberRecord, SubscriberState};

/// What a user may see right now.
///
/// Computed per request and never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Live paid subscription.
    pub is_premium: bool,
    /// Trial window open.
    pub is_in_trial: bool,
    /// Whole days left in the trial, rounded up. 0 when not in trial.
    pub trial_days_left: u32,
    /// `is_premium || is_in_trial`.
    pub has_access: bool,
}

impl AccessDecision {
    /// The decision for anonymous users, missing records, and fail-closed paths.
    pub const fn no_access() -> Self {
        Self {
            is_premium: false,
            is_in_trial: false,
            trial_days_left: 0,
            has_access: false,
        }
    }

    /// Derive the decision from a classified state. `now` must be the same
    /// instant the state was classified at.
    pub fn from_state(state: &SubscriberState, now: Timestamp) -> Self {
        let is_premium = state.is_premium();
        let trial_end = state.open_trial_end();
        let is_in_trial = trial_end.is_some();
        let trial_days_left = trial_end.map_or(0, |end| days_remaining(end, now));

        Self {
            is_premium,
            is_in_trial,
            trial_days_left,
            has_access: is_premium || is_in_trial,
        }
    }

    /// Classify `record` and derive the decision using a single `now`.
    pub fn evaluate(record: Option<&SubscriberRecord>, now: Timestamp) -> Self {
        let state = SubscriberState::classify(record, now);
        Self::from_state(&state, now)
    }
}

impl Default for AccessDecision {
    fn default() -> Self {
        Self::no_access()
    }
}

/// Ceiling of `(end - now)` in days, 0 once `end` has passed.
fn days_remaining(end: Timestamp, now: Timestamp) -> u32 {
    let remaining = end.duration_since(&now);
    if remaining <= Duration::zero() {
        return 0;
    }

    let whole = remaining.num_days();
    let days = if remaining > Duration::days(whole) {
        whole + 1
    } else {
        whole
    };
    u32::try_from(days).unwrap_or(u32::MAX)
}
