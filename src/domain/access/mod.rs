//! Access domain - Premium/trial gating.
//!
//! Decides, for one user at one instant, whether gated content is available.
//! Also models the payment provider events that move subscribers between
//! states.

mod decision;
mod errors;
mod payment_event;
mod state;
mod subscriber;
mod webhook_errors;
mod webhook_verifier;

pub use decision::AccessDecision;
pub use errors::AccessError;
pub use payment_event::{
    BillingInterval, PaymentCustomer, PaymentEvent, PaymentEventKind, PaymentProduct,
    PaymentSubscription, SubscriptionEffect, SubscriptionTerm,
};
pub use state::SubscriberState;
pub use subscriber::{SubscriberRecord, DEFAULT_TRIAL_DAYS};
pub use webhook_errors::WebhookError;
pub use webhook_verifier::{PaymentWebhookVerifier, SIGNATURE_HEADER};

#[cfg(test)]
pub use webhook_verifier::compute_test_signature;
