//! HTTP handlers for access endpoints.
//!
//! These handlers connect axum routes to the access query and command handlers.

use std::sync::Arc;

use ::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::response::{IntoResponse, Response};

use crate::adapters::http::middleware::{OptionalAuth, RequireAuth};
use crate::application::handlers::access::{
    AccessStatusResolver, HandlePaymentWebhookCommand, HandlePaymentWebhookHandler,
    ProvisionTrialCommand, ProvisionTrialHandler, ProvisionTrialResult, SetSubscriptionCommand,
    SetSubscriptionHandler,
};
use crate::domain::access::{
    AccessDecision, AccessError, PaymentWebhookVerifier, WebhookError, SIGNATURE_HEADER,
};
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::{Clock, SubscriberReader, SubscriberRepository};

use super::dto::{
    AccessStatusResponse, ErrorResponse, HealthResponse, SetSubscriptionRequest,
    SubscriberResponse, WebhookAckResponse,
};

/// Seconds a client should wait before retrying when the store is down.
const RETRY_AFTER_SECS: &str = "5";

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Access settings taken from configuration.
#[derive(Debug, Clone, Default)]
pub struct AccessSettings {
    pub trial_days: i64,
    pub admin_emails: Vec<String>,
    pub accepted_products: Vec<String>,
}

/// Shared state for access endpoints.
///
/// Cloned per request; every dependency is behind an `Arc`.
#[derive(Clone)]
pub struct AccessAppState {
    pub subscriber_reader: Arc<dyn SubscriberReader>,
    pub subscriber_repository: Arc<dyn SubscriberRepository>,
    pub clock: Arc<dyn Clock>,
    pub webhook_verifier: Arc<PaymentWebhookVerifier>,
    pub settings: Arc<AccessSettings>,
}

impl AccessAppState {
    pub fn resolver(&self) -> AccessStatusResolver {
        AccessStatusResolver::new(self.subscriber_reader.clone())
    }

    pub fn provision_trial_handler(&self) -> ProvisionTrialHandler {
        ProvisionTrialHandler::new(
            self.subscriber_repository.clone(),
            self.clock.clone(),
            self.settings.trial_days,
        )
    }

    pub fn webhook_handler(&self) -> HandlePaymentWebhookHandler {
        HandlePaymentWebhookHandler::new(
            self.subscriber_repository.clone(),
            self.webhook_verifier.clone(),
            self.clock.clone(),
            self.settings.accepted_products.clone(),
        )
    }

    pub fn set_subscription_handler(&self) -> SetSubscriptionHandler {
        SetSubscriptionHandler::new(
            self.subscriber_repository.clone(),
            self.clock.clone(),
            self.settings.admin_emails.clone(),
        )
    }

    /// Resolve with a fresh `now`. A malformed record yields the locked
    /// decision, flagged so the reply can say so.
    async fn current_decision(
        &self,
        user_id: Option<&UserId>,
    ) -> Result<DecisionReply, AccessApiError> {
        match self.resolver().resolve(user_id, self.clock.now()).await {
            Ok(decision) => Ok(DecisionReply::resolved(decision)),
            Err(err) => match err.fail_closed_decision() {
                Some(locked) => Ok(DecisionReply {
                    decision: locked,
                    failed_closed: true,
                }),
                None => Err(err.into()),
            },
        }
    }
}

/// Header set when the decision was locked because the record was unreadable.
pub const FAIL_CLOSED_HEADER: &str = "x-access-fail-closed";

/// An access decision as returned to the client.
#[derive(Debug, Clone, Copy)]
pub struct DecisionReply {
    pub decision: AccessDecision,
    pub failed_closed: bool,
}

impl DecisionReply {
    fn resolved(decision: AccessDecision) -> Self {
        Self {
            decision,
            failed_closed: false,
        }
    }
}

impl IntoResponse for DecisionReply {
    fn into_response(self) -> Response {
        let mut response = Json(AccessStatusResponse::from(self.decision)).into_response();
        if self.failed_closed {
            response.headers_mut().insert(
                FAIL_CLOSED_HEADER,
                HeaderValue::from_static("malformed-record"),
            );
        }
        response
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/access - Access status for the caller (anonymous allowed)
pub async fn get_access(
    State(state): State<AccessAppState>,
    OptionalAuth(user): OptionalAuth,
) -> Result<DecisionReply, AccessApiError> {
    state.current_decision(user.as_ref().map(|u| &u.id)).await
}

// ════════════════════════════════════════════════════════════════════════════════
// Command Handlers (POST/PUT endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/access/trial - Provision the first-sign-in trial
pub async fn provision_trial(
    State(state): State<AccessAppState>,
    RequireAuth(user): RequireAuth,
) -> Result<impl IntoResponse, AccessApiError> {
    let cmd = ProvisionTrialCommand {
        user_id: user.id.clone(),
        email: Some(user.email.clone()),
    };

    let status = match state.provision_trial_handler().handle(cmd).await? {
        ProvisionTrialResult::Provisioned(_) => StatusCode::CREATED,
        ProvisionTrialResult::AlreadyProvisioned => StatusCode::OK,
    };

    let reply = state.current_decision(Some(&user.id)).await?;
    Ok((status, reply))
}

/// POST /api/webhooks/payments - Payment provider events
pub async fn payment_webhook(
    State(state): State<AccessAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AccessApiError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let cmd = HandlePaymentWebhookCommand {
        payload: body.to_vec(),
        signature,
    };

    let result = state.webhook_handler().handle(cmd).await?;
    Ok(Json(WebhookAckResponse::from(&result)))
}

/// PUT /api/admin/subscribers/:user_id/subscription - Admin grant/revoke
pub async fn set_subscription(
    State(state): State<AccessAppState>,
    RequireAuth(actor): RequireAuth,
    Path(user_id): Path<String>,
    Json(request): Json<SetSubscriptionRequest>,
) -> Result<impl IntoResponse, AccessApiError> {
    let user_id = UserId::new(user_id).map_err(DomainError::from)?;

    let cmd = SetSubscriptionCommand {
        actor,
        user_id,
        subscribed: request.subscribed,
        subscription_end: request.subscription_end,
    };

    let result = state.set_subscription_handler().handle(cmd).await?;
    Ok(Json(SubscriberResponse::from(result.record)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts layer errors to HTTP responses.
#[derive(Debug)]
pub enum AccessApiError {
    Access(AccessError),
    Webhook(WebhookError),
    Domain(DomainError),
}

impl From<AccessError> for AccessApiError {
    fn from(err: AccessError) -> Self {
        Self::Access(err)
    }
}

impl From<WebhookError> for AccessApiError {
    fn from(err: WebhookError) -> Self {
        Self::Webhook(err)
    }
}

impl From<DomainError> for AccessApiError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl IntoResponse for AccessApiError {
    fn into_response(self) -> Response {
        match self {
            AccessApiError::Access(err) => {
                let (status, code) = match &err {
                    AccessError::StatusUnavailable(_) => {
                        (StatusCode::SERVICE_UNAVAILABLE, "ACCESS_STATUS_UNAVAILABLE")
                    }
                    AccessError::MalformedRecord { .. } => {
                        (StatusCode::INTERNAL_SERVER_ERROR, "MALFORMED_RECORD")
                    }
                };
                let mut response =
                    (status, Json(ErrorResponse::new(code, err.to_string()))).into_response();
                if err.is_retryable() {
                    response
                        .headers_mut()
                        .insert(header::RETRY_AFTER, HeaderValue::from_static(RETRY_AFTER_SECS));
                }
                response
            }
            AccessApiError::Webhook(err) => {
                let code = match &err {
                    WebhookError::MissingSignature | WebhookError::InvalidSignature => {
                        "INVALID_WEBHOOK_SIGNATURE"
                    }
                    WebhookError::ParseError(_) => "INVALID_WEBHOOK_PAYLOAD",
                    WebhookError::Database(_) => "DATABASE_ERROR",
                };
                (
                    err.status_code(),
                    Json(ErrorResponse::new(code, err.to_string())),
                )
                    .into_response()
            }
            AccessApiError::Domain(err) => {
                let status = match err.code {
                    ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
                    ErrorCode::SubscriberNotFound => StatusCode::NOT_FOUND,
                    ErrorCode::SubscriberExists => StatusCode::CONFLICT,
                    ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
                    ErrorCode::Forbidden => StatusCode::FORBIDDEN,
                    ErrorCode::DatabaseError
                    | ErrorCode::MalformedRecord
                    | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
                };
                if status.is_server_error() {
                    tracing::error!(error = %err, "Request failed");
                }
                (
                    status,
                    Json(ErrorResponse::new(err.code.to_string(), err.message)),
                )
                    .into_response()
            }
        }
    }
}
