//! Access policy configuration

use serde::Deserialize;

use super::error::ValidationError;
use crate::domain::access::DEFAULT_TRIAL_DAYS;
use crate::domain::foundation::normalize_email;

/// Trial length and admin allow-list.
#[derive(Debug, Clone, Deserialize)]
pub struct AccessConfig {
    /// Length of the first-sign-in trial, in days
    #[serde(default = "default_trial_days")]
    pub trial_days: i64,

    /// Admin e-mails (comma-separated, case-insensitive)
    pub admin_emails: Option<String>,
}

impl AccessConfig {
    /// Admin e-mails, trimmed and lowercased.
    pub fn admin_emails_list(&self) -> Vec<String> {
        self.admin_emails
            .as_ref()
            .map(|s| {
                s.split(',')
                    .map(normalize_email)
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=365).contains(&self.trial_days) {
            return Err(ValidationError::InvalidTrialDays);
        }
        if let Some(bad) = self.admin_emails_list().into_iter().find(|e| !e.contains('@')) {
            return Err(ValidationError::InvalidAdminEmail(bad));
        }
        Ok(())
    }
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            trial_days: default_trial_days(),
            admin_emails: None,
        }
    }
}

fn default_trial_days() -> i64 {
    DEFAULT_TRIAL_DAYS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AccessConfig::default();
        assert_eq!(config.trial_days, 30);
        assert!(config.admin_emails_list().is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_admin_emails_are_normalized() {
        let config = AccessConfig {
            admin_emails: Some(" Ops@Example.com ,owner@example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.admin_emails_list(),
            vec!["ops@example.com", "owner@example.com"]
        );
    }

    #[test]
    fn test_invalid_trial_days() {
        let config = AccessConfig {
            trial_days: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidTrialDays));
    }

    #[test]
    fn test_invalid_admin_email() {
        let config = AccessConfig {
            admin_emails: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidAdminEmail("not-an-email".to_string()))
        );
    }
}
