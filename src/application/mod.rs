//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Queries (access resolution) only read; commands (provisioning, webhooks,
//! admin changes) go through the write-side repository.

pub mod handlers;

pub use handlers::{
    AccessStatusCache, AccessStatusResolver, CachedDecision, HandlePaymentWebhookCommand,
    HandlePaymentWebhookHandler, HandlePaymentWebhookResult, IgnoredReason,
    ProvisionTrialCommand, ProvisionTrialHandler, ProvisionTrialResult, SetSubscriptionCommand,
    SetSubscriptionHandler, SetSubscriptionResult,
};
