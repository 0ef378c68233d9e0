//! Axum router configuration for access endpoints.

use axum::{
    routing::{get, post, put},
    Router,
};

use super::handlers::{
    get_access, payment_webhook, provision_trial, set_subscription, AccessAppState,
};

/// Caller-facing access routes, mounted at `/api/access`.
///
/// - `GET /` - Access status (anonymous allowed)
/// - `POST /trial` - Provision the caller's trial
pub fn access_routes() -> Router<AccessAppState> {
    Router::new()
        .route("/", get(get_access))
        .route("/trial", post(provision_trial))
}

/// Admin routes, mounted at `/api/admin`.
pub fn admin_routes() -> Router<AccessAppState> {
    Router::new().route(
        "/subscribers/:user_id/subscription",
        put(set_subscription),
    )
}

/// Webhook routes, mounted at `/api/webhooks`.
///
/// These don't require user authentication; payloads are verified by signature.
pub fn webhook_routes() -> Router<AccessAppState> {
    Router::new().route("/payments", post(payment_webhook))
}
