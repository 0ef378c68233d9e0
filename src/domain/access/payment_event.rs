//! Payment provider webhook events.
//!
//! Only the fields the relay acts on are modeled:
//!
//! ```json
//! {
//!   "event": "payment_approved",
//!   "customer": { "email": "someone@example.com" },
//!   "product": { "id": "prod_123" },
//!   "subscription": { "interval": "yearly" }
//! }
//! ```
//!
//! Unknown event names and intervals deserialize into catch-all variants so
//! that new provider values are acknowledged instead of rejected.

use serde::Deserialize;

use crate::domain::foundation::{normalize_email, Timestamp};

/// A webhook event as delivered by the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentEvent {
    pub event: PaymentEventKind,
    pub customer: PaymentCustomer,
    #[serde(default)]
    pub product: Option<PaymentProduct>,
    #[serde(default)]
    pub subscription: Option<PaymentSubscription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentCustomer {
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentProduct {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentSubscription {
    #[serde(default)]
    pub interval: Option<BillingInterval>,
}

/// Event names the relay distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentEventKind {
    PaymentApproved,
    SubscriptionRenewed,
    SubscriptionCanceled,
    PaymentRefunded,
    Chargeback,
    #[serde(other)]
    Other,
}

/// What an event does to the subscriber record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionEffect {
    Activate,
    Revoke,
}

impl PaymentEventKind {
    /// Effect on the subscriber, or `None` for events the relay ignores.
    pub fn effect(&self) -> Option<SubscriptionEffect> {
        match self {
            PaymentEventKind::PaymentApproved | PaymentEventKind::SubscriptionRenewed => {
                Some(SubscriptionEffect::Activate)
            }
            PaymentEventKind::SubscriptionCanceled
            | PaymentEventKind::PaymentRefunded
            | PaymentEventKind::Chargeback => Some(SubscriptionEffect::Revoke),
            PaymentEventKind::Other => None,
        }
    }
}

/// Billing interval of the purchased plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingInterval {
    Monthly,
    Quarterly,
    Semiannual,
    #[serde(alias = "annual")]
    Yearly,
    Lifetime,
    #[serde(other)]
    Unrecognized,
}

/// How long an activation lasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionTerm {
    Days(i64),
    Lifetime,
}

impl BillingInterval {
    /// Term granted by this interval; `None` when the interval is unknown.
    pub fn term(&self) -> Option<SubscriptionTerm> {
        match self {
            BillingInterval::Monthly => Some(SubscriptionTerm::Days(30)),
            BillingInterval::Quarterly => Some(SubscriptionTerm::Days(90)),
            BillingInterval::Semiannual => Some(SubscriptionTerm::Days(180)),
            BillingInterval::Yearly => Some(SubscriptionTerm::Days(365)),
            BillingInterval::Lifetime => Some(SubscriptionTerm::Lifetime),
            BillingInterval::Unrecognized => None,
        }
    }
}

impl SubscriptionTerm {
    /// Subscription end for a term starting at `now`. Lifetime has no end.
    pub fn ends_at(&self, now: Timestamp) -> Option<Timestamp> {
        match self {
            SubscriptionTerm::Days(days) => Some(now.add_days(*days)),
            SubscriptionTerm::Lifetime => None,
        }
    }
}

impl PaymentEvent {
    /// Customer e-mail normalized for matching.
    pub fn customer_email(&self) -> String {
        normalize_email(&self.customer.email)
    }

    pub fn product_id(&self) -> Option<&str> {
        self.product.as_ref().map(|p| p.id.as_str())
    }

    pub fn interval(&self) -> Option<BillingInterval> {
        self.subscription.as_ref().and_then(|s| s.interval)
    }

    /// Term to activate. A missing interval means a one-off lifetime purchase.
    pub fn term(&self) -> Option<SubscriptionTerm> {
        match self.interval() {
            Some(interval) => interval.term(),
            None => Some(SubscriptionTerm::Lifetime),
        }
    }
}
