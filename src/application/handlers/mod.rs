//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod access;

pub use access::{
    AccessStatusCache, AccessStatusResolver, CachedDecision, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, HandlePaymentWebhookResult, IgnoredReason,
    ProvisionTrialCommand, ProvisionTrialHandler, ProvisionTrialResult, SetSubscriptionCommand,
    SetSubscriptionHandler, SetSubscriptionResult,
};
