//! HTTP DTOs for access endpoints.
//!
//! Access responses use camelCase field names because the web client reads
//! them directly.

use serde::{Deserialize, Serialize};

use crate::application::handlers::access::{HandlePaymentWebhookResult, IgnoredReason};
use crate::domain::access::{AccessDecision, SubscriberRecord};
use crate::domain::foundation::Timestamp;

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Admin request to set a subscription.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetSubscriptionRequest {
    pub subscribed: bool,
    /// RFC 3339. Omit for an open-ended subscription.
    #[serde(default)]
    pub subscription_end: Option<Timestamp>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Current access status for the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessStatusResponse {
    pub is_premium: bool,
    pub is_in_trial: bool,
    pub trial_days_left: u32,
    pub has_access: bool,
}

impl From<AccessDecision> for AccessStatusResponse {
    fn from(d: AccessDecision) -> Self {
        Self {
            is_premium: d.is_premium,
            is_in_trial: d.is_in_trial,
            trial_days_left: d.trial_days_left,
            has_access: d.has_access,
        }
    }
}

/// Subscriber record as shown to admins.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberResponse {
    pub user_id: String,
    pub email: Option<String>,
    pub subscribed: bool,
    pub subscription_end: Option<String>,
    pub is_trial: bool,
    pub trial_started_at: Option<String>,
    pub trial_ends_at: Option<String>,
}

impl From<SubscriberRecord> for SubscriberResponse {
    fn from(r: SubscriberRecord) -> Self {
        Self {
            user_id: r.user_id.to_string(),
            email: r.email,
            subscribed: r.subscribed,
            subscription_end: r.subscription_end.map(|t| t.to_string()),
            is_trial: r.is_trial,
            trial_started_at: r.trial_started_at.map(|t| t.to_string()),
            trial_ends_at: r.trial_ends_at.map(|t| t.to_string()),
        }
    }
}

/// Acknowledgement returned to the payment provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAckResponse {
    pub received: bool,
    pub outcome: String,
}

impl From<&HandlePaymentWebhookResult> for WebhookAckResponse {
    fn from(result: &HandlePaymentWebhookResult) -> Self {
        let outcome = match result {
            HandlePaymentWebhookResult::SubscriptionActivated { .. } => "activated",
            HandlePaymentWebhookResult::SubscriptionRevoked { .. } => "revoked",
            HandlePaymentWebhookResult::UnknownCustomer => "unknown_customer",
            HandlePaymentWebhookResult::Ignored(IgnoredReason::UnhandledEvent) => "ignored",
            HandlePaymentWebhookResult::Ignored(IgnoredReason::ProductNotAccepted) => {
                "ignored_product"
            }
            HandlePaymentWebhookResult::Ignored(IgnoredReason::UnrecognizedInterval) => {
                "ignored_interval"
            }
        };
        Self {
            received: true,
            outcome: outcome.to_string(),
        }
    }
}

/// Liveness response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}
