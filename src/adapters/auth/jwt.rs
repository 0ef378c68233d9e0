//! HS256 JWT adapter for session validation.
//!
//! The hosted auth platform signs access tokens with a shared secret. This
//! adapter validates signature, audience and expiry, then maps `sub` and
//! `email` to an `AuthenticatedUser`.
//!
//! # Example
//!
//! ```ignore
//! let validator = JwtSessionValidator::new(JwtConfig::new(secret, "authenticated"));
//! let user = validator.validate("eyJ...").await?;
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Configuration for the JWT adapter.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Shared HS256 signing secret.
    pub secret: SecretString,

    /// Expected audience claim.
    pub audience: String,

    /// Expected issuer, if the platform sets one.
    pub issuer: Option<String>,

    /// Clock skew tolerated on `exp`, in seconds.
    pub leeway_secs: u64,
}

impl JwtConfig {
    pub fn new(secret: SecretString, audience: impl Into<String>) -> Self {
        Self {
            secret,
            audience: audience.into(),
            issuer: None,
            leeway_secs: 30,
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway_secs = leeway_secs;
        self
    }
}

/// Claims read from access tokens. `exp`, `aud` and `iss` are checked by
/// `Validation` before these are deserialized.
#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
}

/// Session validator for HS256-signed access tokens.
pub struct JwtSessionValidator {
    config: JwtConfig,
    decoding_key: DecodingKey,
}

impl JwtSessionValidator {
    pub fn new(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.expose_secret().as_bytes());
        Self {
            config,
            decoding_key,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation.leeway = self.config.leeway_secs;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);
        validation
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let token_data = decode::<AccessClaims>(token, &self.decoding_key, &self.validation())
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => {
                    tracing::debug!("Token expired");
                    AuthError::TokenExpired
                }
                ErrorKind::InvalidAudience => {
                    tracing::warn!("Invalid audience in token");
                    AuthError::InvalidToken
                }
                ErrorKind::InvalidIssuer => {
                    tracing::warn!("Invalid issuer in token");
                    AuthError::InvalidToken
                }
                _ => {
                    tracing::debug!("Token validation failed: {}", e);
                    AuthError::InvalidToken
                }
            })?;
        let claims = token_data.claims;

        let email = claims.email.filter(|e| !e.trim().is_empty()).ok_or_else(|| {
            tracing::warn!("Token missing email claim");
            AuthError::InvalidToken
        })?;

        let user_id = UserId::new(&claims.sub).map_err(|_| {
            tracing::warn!("Invalid user ID in token");
            AuthError::InvalidToken
        })?;

        Ok(AuthenticatedUser::new(user_id, email))
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("audience", &self.config.audience)
            .field("issuer", &self.config.issuer)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "super-secret-jwt-key-for-tests-only";
    const AUDIENCE: &str = "authenticated";

    fn validator() -> JwtSessionValidator {
        JwtSessionValidator::new(JwtConfig::new(
            SecretString::new(SECRET.to_string()),
            AUDIENCE,
        ))
    }

    fn token(claims: serde_json::Value, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_one_hour() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Validation Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn valid_token_yields_user() {
        let jwt = token(
            serde_json::json!({
                "sub": "user-42", "aud": AUDIENCE, "exp": in_one_hour(), "email": "me@example.com"
            }),
            SECRET,
        );

        let user = validator().validate(&jwt).await.unwrap();

        assert_eq!(user.id.as_str(), "user-42");
        assert_eq!(user.email, "me@example.com");
    }

    #[tokio::test]
    async fn audience_array_is_accepted() {
        let jwt = token(
            serde_json::json!({
                "sub": "user-42", "aud": ["other", AUDIENCE], "exp": in_one_hour(), "email": "me@example.com"
            }),
            SECRET,
        );

        assert!(validator().validate(&jwt).await.is_ok());
    }

    #[tokio::test]
    async fn expired_token_is_token_expired() {
        let jwt = token(
            serde_json::json!({
                "sub": "user-42", "aud": AUDIENCE, "exp": chrono::Utc::now().timestamp() - 3600,
                "email": "me@example.com"
            }),
            SECRET,
        );

        assert_eq!(validator().validate(&jwt).await, Err(AuthError::TokenExpired));
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid() {
        let jwt = token(
            serde_json::json!({
                "sub": "user-42", "aud": AUDIENCE, "exp": in_one_hour(), "email": "me@example.com"
            }),
            "a-different-secret",
        );

        assert_eq!(validator().validate(&jwt).await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn wrong_audience_is_invalid() {
        let jwt = token(
            serde_json::json!({
                "sub": "user-42", "aud": "someone-else", "exp": in_one_hour(), "email": "me@example.com"
            }),
            SECRET,
        );

        assert_eq!(validator().validate(&jwt).await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn missing_email_is_invalid() {
        let jwt = token(
            serde_json::json!({ "sub": "user-42", "aud": AUDIENCE, "exp": in_one_hour() }),
            SECRET,
        );

        assert_eq!(validator().validate(&jwt).await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn issuer_is_checked_when_configured() {
        let validator = JwtSessionValidator::new(
            JwtConfig::new(SecretString::new(SECRET.to_string()), AUDIENCE)
                .with_issuer("https://auth.example.com"),
        );
        let jwt = token(
            serde_json::json!({
                "sub": "user-42", "aud": AUDIENCE, "exp": in_one_hour(),
                "email": "me@example.com", "iss": "https://evil.example.com"
            }),
            SECRET,
        );

        assert_eq!(validator.validate(&jwt).await, Err(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn garbage_is_invalid() {
        assert_eq!(
            validator().validate("not.a.jwt").await,
            Err(AuthError::InvalidToken)
        );
    }

    #[test]
    fn debug_does_not_leak_secret() {
        let output = format!("{:?}", validator());
        assert!(!output.contains(SECRET));
    }
}
