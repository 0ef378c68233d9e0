//! ProvisionTrialHandler - Command handler granting the first-sign-in trial.

use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::access::SubscriberRecord;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{Clock, SubscriberRepository};

/// Command to provision a trial for a newly signed-in user.
#[derive(Debug, Clone)]
pub struct ProvisionTrialCommand {
    pub user_id: UserId,
    pub email: Option<String>,
}

/// Result of trial provisioning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProvisionTrialResult {
    /// A new record with an open trial was created.
    Provisioned(SubscriberRecord),
    /// A record already existed; nothing changed.
    AlreadyProvisioned,
}

/// Handler for trial provisioning.
///
/// Idempotent: calling it again for a provisioned user is a no-op, so a
/// trial can never be restarted.
pub struct ProvisionTrialHandler {
    repository: Arc<dyn SubscriberRepository>,
    clock: Arc<dyn Clock>,
    trial_days: i64,
}

impl ProvisionTrialHandler {
    pub fn new(
        repository: Arc<dyn SubscriberRepository>,
        clock: Arc<dyn Clock>,
        trial_days: i64,
    ) -> Self {
        Self {
            repository,
            clock,
            trial_days,
        }
    }

    pub async fn handle(
        &self,
        cmd: ProvisionTrialCommand,
    ) -> Result<ProvisionTrialResult, DomainError> {
        let email = cmd
            .email
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty());
        let record =
            SubscriberRecord::new_trial(cmd.user_id, email, self.clock.now(), self.trial_days);

        if !self.repository.insert_if_absent(&record).await? {
            debug!(user_id = %record.user_id, "Trial already provisioned");
            return Ok(ProvisionTrialResult::AlreadyProvisioned);
        }

        info!(
            user_id = %record.user_id,
            trial_days = self.trial_days,
            "Trial provisioned"
        );
        Ok(ProvisionTrialResult::Provisioned(record))
    }
}
