//! Access command and query handlers.

mod access_cache;
mod handle_payment_webhook;
mod provision_trial;
mod resolve_access;
mod set_subscription;

pub use access_cache::{AccessStatusCache, CachedDecision};
pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, HandlePaymentWebhookResult,
    IgnoredReason,
};
pub use provision_trial::{ProvisionTrialCommand, ProvisionTrialHandler, ProvisionTrialResult};
pub use resolve_access::AccessStatusResolver;
pub use set_subscription::{SetSubscriptionCommand, SetSubscriptionHandler, SetSubscriptionResult};
