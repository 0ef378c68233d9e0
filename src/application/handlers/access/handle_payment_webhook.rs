//! HandlePaymentWebhookHandler - Command handler relaying payment events to subscriber records.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::access::{
    PaymentEvent, PaymentWebhookVerifier, SubscriptionEffect, WebhookError,
};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{Clock, SubscriberRepository};

/// Command to handle a payment webhook.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    /// Raw webhook payload.
    pub payload: Vec<u8>,
    /// Signature header, if sent.
    pub signature: Option<String>,
}

/// Why an event was acknowledged without changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoredReason {
    /// Event name the relay does not act on.
    UnhandledEvent,
    /// Product is not in the accepted list.
    ProductNotAccepted,
    /// Billing interval could not be mapped to a term.
    UnrecognizedInterval,
}

/// Result of webhook processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlePaymentWebhookResult {
    /// Subscription activated or renewed.
    SubscriptionActivated {
        user_id: UserId,
        ends_at: Option<Timestamp>,
    },
    /// Subscription canceled, refunded or charged back.
    SubscriptionRevoked { user_id: UserId },
    /// No subscriber matches the customer e-mail.
    UnknownCustomer,
    /// Event acknowledged, nothing changed.
    Ignored(IgnoredReason),
}

/// Handler for payment provider webhooks.
pub struct HandlePaymentWebhookHandler {
    repository: Arc<dyn SubscriberRepository>,
    verifier: Arc<PaymentWebhookVerifier>,
    clock: Arc<dyn Clock>,
    accepted_products: Vec<String>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        repository: Arc<dyn SubscriberRepository>,
        verifier: Arc<PaymentWebhookVerifier>,
        clock: Arc<dyn Clock>,
        accepted_products: Vec<String>,
    ) -> Self {
        Self {
            repository,
            verifier,
            clock,
            accepted_products,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandlePaymentWebhookCommand,
    ) -> Result<HandlePaymentWebhookResult, WebhookError> {
        let event = self
            .verifier
            .verify_and_parse(&cmd.payload, cmd.signature.as_deref())
            .map_err(|e| {
                warn!(error = %e, "Rejected payment webhook");
                e
            })?;

        let Some(effect) = event.event.effect() else {
            info!(event = ?event.event, "Ignoring unhandled payment event");
            return Ok(HandlePaymentWebhookResult::Ignored(IgnoredReason::UnhandledEvent));
        };

        if !self.product_accepted(&event) {
            info!(product_id = ?event.product_id(), "Ignoring payment event for other product");
            return Ok(HandlePaymentWebhookResult::Ignored(IgnoredReason::ProductNotAccepted));
        }

        let now = self.clock.now();
        let ends_at = match effect {
            SubscriptionEffect::Activate => match event.term() {
                Some(term) => term.ends_at(now),
                None => {
                    warn!(interval = ?event.interval(), "Unrecognized billing interval");
                    return Ok(HandlePaymentWebhookResult::Ignored(
                        IgnoredReason::UnrecognizedInterval,
                    ));
                }
            },
            SubscriptionEffect::Revoke => Some(now),
        };

        let email = event.customer_email();
        let Some(mut record) = self
            .repository
            .find_by_email(&email)
            .await
            .map_err(|e| WebhookError::Database(e.to_string()))?
        else {
            warn!(event = ?event.event, "Payment event for unknown customer");
            return Ok(HandlePaymentWebhookResult::UnknownCustomer);
        };

        match effect {
            SubscriptionEffect::Activate => record.activate_subscription(ends_at),
            SubscriptionEffect::Revoke => record.revoke_subscription(now),
        }

        self.repository
            .update(&record)
            .await
            .map_err(|e| WebhookError::Database(e.to_string()))?;

        let user_id = record.user_id;
        match effect {
            SubscriptionEffect::Activate => {
                info!(user_id = %user_id, ends_at = ?ends_at, "Subscription activated");
                Ok(HandlePaymentWebhookResult::SubscriptionActivated { user_id, ends_at })
            }
            SubscriptionEffect::Revoke => {
                info!(user_id = %user_id, event = ?event.event, "Subscription revoked");
                Ok(HandlePaymentWebhookResult::SubscriptionRevoked { user_id })
            }
        }
    }

    fn product_accepted(&self, event: &PaymentEvent) -> bool {
        if self.accepted_products.is_empty() {
            return true;
        }
        event
            .product_id()
            .is_some_and(|id| self.accepted_products.iter().any(|p| p == id))
    }
}
