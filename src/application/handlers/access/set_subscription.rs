//! SetSubscriptionHandler - Admin command to grant or revoke a subscription.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::access::SubscriberRecord;
use crate::domain::foundation::{AuthenticatedUser, DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{Clock, SubscriberRepository};

/// Command to set a user's subscription.
#[derive(Debug, Clone)]
pub struct SetSubscriptionCommand {
    /// Admin performing the change.
    pub actor: AuthenticatedUser,
    pub user_id: UserId,
    pub subscribed: bool,
    /// End of the paid period. With `subscribed = false`, when the revocation
    /// takes effect (defaults to now).
    pub subscription_end: Option<Timestamp>,
}

/// Result of the admin change.
#[derive(Debug, Clone)]
pub struct SetSubscriptionResult {
    pub record: SubscriberRecord,
}

/// Handler for admin subscription changes.
pub struct SetSubscriptionHandler {
    repository: Arc<dyn SubscriberRepository>,
    clock: Arc<dyn Clock>,
    admin_emails: Vec<String>,
}

impl SetSubscriptionHandler {
    pub fn new(
        repository: Arc<dyn SubscriberRepository>,
        clock: Arc<dyn Clock>,
        admin_emails: Vec<String>,
    ) -> Self {
        Self {
            repository,
            clock,
            admin_emails,
        }
    }

    /// True if `user` may change subscriptions.
    pub fn is_admin(&self, user: &AuthenticatedUser) -> bool {
        self.admin_emails.iter().any(|admin| user.has_email(admin))
    }

    pub async fn handle(
        &self,
        cmd: SetSubscriptionCommand,
    ) -> Result<SetSubscriptionResult, DomainError> {
        if !self.is_admin(&cmd.actor) {
            warn!(actor = %cmd.actor.id, "Non-admin attempted subscription change");
            return Err(DomainError::new(
                ErrorCode::Forbidden,
                "Only admins can change subscriptions",
            ));
        }

        let mut record = self
            .repository
            .find_by_user_id(&cmd.user_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::SubscriberNotFound,
                    format!("No subscriber for user {}", cmd.user_id),
                )
            })?;

        if cmd.subscribed {
            record.activate_subscription(cmd.subscription_end);
        } else {
            record.revoke_subscription(cmd.subscription_end.unwrap_or_else(|| self.clock.now()));
        }

        self.repository.update(&record).await?;

        info!(
            actor = %cmd.actor.id,
            user_id = %record.user_id,
            subscribed = record.subscribed,
            subscription_end = ?record.subscription_end,
            "Subscription set by admin"
        );

        Ok(SetSubscriptionResult { record })
    }
}
