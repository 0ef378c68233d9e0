//! Payment webhook configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Payment provider webhook configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentConfig {
    /// HMAC-SHA256 secret for `X-Webhook-Signature`. Unsigned webhooks are
    /// accepted when absent.
    pub webhook_secret: Option<SecretString>,

    /// Accepted product ids (comma-separated). Empty accepts every product.
    pub product_ids: Option<String>,
}

impl PaymentConfig {
    /// The configured secret, ignoring a blank value.
    pub fn webhook_secret(&self) -> Option<SecretString> {
        self.webhook_secret
            .as_ref()
            .filter(|s| !s.expose_secret().trim().is_empty())
            .cloned()
    }

    pub fn product_ids_list(&self) -> Vec<String> {
        self.product_ids
            .as_ref()
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Validate payment configuration.
    ///
    /// Production deployments must verify webhook signatures.
    pub fn validate(&self, is_production: bool) -> Result<(), ValidationError> {
        if is_production && self.webhook_secret().is_none() {
            return Err(ValidationError::WebhookSecretRequired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_ids_parsing() {
        let config = PaymentConfig {
            product_ids: Some("prod_a, prod_b,,".to_string()),
            ..Default::default()
        };
        assert_eq!(config.product_ids_list(), vec!["prod_a", "prod_b"]);
    }

    #[test]
    fn test_product_ids_default_empty() {
        assert!(PaymentConfig::default().product_ids_list().is_empty());
    }

    #[test]
    fn test_blank_secret_is_absent() {
        let config = PaymentConfig {
            webhook_secret: Some(SecretString::new("  ".to_string())),
            ..Default::default()
        };
        assert!(config.webhook_secret().is_none());
    }

    #[test]
    fn test_unsigned_allowed_outside_production() {
        assert!(PaymentConfig::default().validate(false).is_ok());
    }

    #[test]
    fn test_production_requires_secret() {
        assert_eq!(
            PaymentConfig::default().validate(true),
            Err(ValidationError::WebhookSecretRequired)
        );

        let config = PaymentConfig {
            webhook_secret: Some(SecretString::new("whsec".to_string())),
            ..Default::default()
        };
        assert!(config.validate(true).is_ok());
    }
}
