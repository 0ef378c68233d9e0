//! Integration tests for the access HTTP surface.
//!
//! Drives the full router (auth middleware, handlers, in-memory store) with
//! `tower::ServiceExt::oneshot` and a fixed clock.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use hmac::{Hmac, Mac};
use secrecy::SecretString;
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;

use frequency_gate::adapters::http::access::FAIL_CLOSED_HEADER;
use frequency_gate::adapters::{
    build_router, AccessAppState, AccessSettings, InMemorySubscriberStore, MockSessionValidator,
    RouterOptions,
};
use frequency_gate::domain::access::{PaymentWebhookVerifier, SubscriberRecord, SIGNATURE_HEADER};
use frequency_gate::domain::foundation::{AuthenticatedUser, Timestamp, UserId};
use frequency_gate::ports::{FixedClock, LookupError};

const WEBHOOK_SECRET: &str = "whsec_integration";
const LISTENER_TOKEN: &str = "listener-token";
const ADMIN_TOKEN: &str = "admin-token";

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestApp {
    router: Router,
    store: InMemorySubscriberStore,
    clock: Arc<FixedClock>,
}

fn start() -> Timestamp {
    Timestamp::parse_rfc3339("2025-03-01T12:00:00Z").unwrap()
}

fn listener_id() -> UserId {
    UserId::new("listener-1").unwrap()
}

fn listener() -> AuthenticatedUser {
    AuthenticatedUser::new(listener_id(), "listener@example.com")
}

fn admin() -> AuthenticatedUser {
    AuthenticatedUser::new(UserId::new("admin-1").unwrap(), "ops@example.com")
}

fn app_with(verifier: PaymentWebhookVerifier, accepted_products: Vec<String>) -> TestApp {
    let store = InMemorySubscriberStore::new();
    let clock = Arc::new(FixedClock::new(start()));

    let state = AccessAppState {
        subscriber_reader: Arc::new(store.clone()),
        subscriber_repository: Arc::new(store.clone()),
        clock: clock.clone(),
        webhook_verifier: Arc::new(verifier),
        settings: Arc::new(AccessSettings {
            trial_days: 30,
            admin_emails: vec!["ops@example.com".to_string()],
            accepted_products,
        }),
    };

    let validator = MockSessionValidator::new()
        .with_user(LISTENER_TOKEN, listener())
        .with_user(ADMIN_TOKEN, admin());

    TestApp {
        router: build_router(state, Arc::new(validator), &RouterOptions::default()),
        store,
        clock,
    }
}

fn app() -> TestApp {
    app_with(PaymentWebhookVerifier::unsigned(), Vec::new())
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get_access(token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get("/api/access");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn post_trial(token: &str) -> Request<Body> {
    Request::post("/api/access/trial")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn webhook(payload: &Value, signature: Option<String>) -> Request<Body> {
    let mut builder = Request::post("/api/webhooks/payments")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(signature) = signature {
        builder = builder.header(SIGNATURE_HEADER, signature);
    }
    builder.body(Body::from(payload.to_string())).unwrap()
}

fn sign(payload: &Value) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes()).unwrap();
    mac.update(payload.to_string().as_bytes());
    format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
}

fn set_subscription(token: &str, user_id: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/admin/subscribers/{}/subscription", user_id))
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn seed_trial(app: &TestApp) {
    app.store
        .seed(SubscriberRecord::new_trial(
            listener_id(),
            Some("listener@example.com".to_string()),
            start(),
            30,
        ))
        .await;
}

fn no_access() -> Value {
    json!({ "isPremium": false, "isInTrial": false, "trialDaysLeft": 0, "hasAccess": false })
}

// =============================================================================
// Access Status
// =============================================================================

#[tokio::test]
async fn anonymous_caller_has_no_access_and_no_lookup() {
    let app = app();

    let (status, body) = send(&app.router, get_access(None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, no_access());
    assert_eq!(app.store.lookup_count(), 0);
}

#[tokio::test]
async fn signed_in_without_record_has_no_access() {
    let app = app();

    let (status, body) = send(&app.router, get_access(Some(LISTENER_TOKEN))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, no_access());
    assert_eq!(app.store.lookup_count(), 1);
}

#[tokio::test]
async fn invalid_token_is_rejected_not_anonymous() {
    let app = app();

    let (status, _) = send(&app.router, get_access(Some("forged"))).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn trial_counts_down_and_ends_exclusively() {
    let app = app();
    seed_trial(&app).await;

    let (_, body) = send(&app.router, get_access(Some(LISTENER_TOKEN))).await;
    assert_eq!(body["isInTrial"], true);
    assert_eq!(body["trialDaysLeft"], 30);
    assert_eq!(body["hasAccess"], true);

    // One second before the trial ends
    app.clock.advance_secs(30 * 86_400 - 1);
    let (_, body) = send(&app.router, get_access(Some(LISTENER_TOKEN))).await;
    assert_eq!(body["trialDaysLeft"], 1);
    assert_eq!(body["hasAccess"], true);

    // Exactly at the end
    app.clock.advance_secs(1);
    let (_, body) = send(&app.router, get_access(Some(LISTENER_TOKEN))).await;
    assert_eq!(body, no_access());
}

#[tokio::test]
async fn store_outage_is_503_with_retry_after() {
    let app = app();
    app.store
        .fail_with(LookupError::unavailable("connection refused"))
        .await;

    let response = app
        .router
        .clone()
        .oneshot(get_access(Some(LISTENER_TOKEN)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn malformed_record_fails_closed() {
    let app = app();
    seed_trial(&app).await;
    app.store
        .fail_with(LookupError::malformed("trial_ends_at", "not a timestamp"))
        .await;

    let response = app
        .router
        .clone()
        .oneshot(get_access(Some(LISTENER_TOKEN)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(FAIL_CLOSED_HEADER).unwrap(),
        "malformed-record"
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body, no_access());
}

// =============================================================================
// Trial Provisioning
// =============================================================================

#[tokio::test]
async fn first_sign_in_provisions_trial_once() {
    let app = app();

    let (status, body) = send(&app.router, post_trial(LISTENER_TOKEN)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["isInTrial"], true);
    assert_eq!(body["trialDaysLeft"], 30);

    app.clock.advance_secs(5 * 86_400);

    let (status, body) = send(&app.router, post_trial(LISTENER_TOKEN)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["trialDaysLeft"], 25);

    let record = app.store.get(&listener_id()).await.unwrap();
    assert_eq!(record.trial_started_at, Some(start()));
    assert_eq!(record.email.as_deref(), Some("listener@example.com"));
}

#[tokio::test]
async fn trial_requires_authentication() {
    let app = app();

    let request = Request::post("/api/access/trial").body(Body::empty()).unwrap();
    let (status, _) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(app.store.is_empty().await);
}

// =============================================================================
// Payment Webhooks
// =============================================================================

#[tokio::test]
async fn approved_payment_grants_premium() {
    let app = app();
    seed_trial(&app).await;

    // Trial has lapsed
    app.clock.advance_secs(31 * 86_400);
    let (_, body) = send(&app.router, get_access(Some(LISTENER_TOKEN))).await;
    assert_eq!(body, no_access());

    let payload = json!({
        "event": "payment_approved",
        "customer": { "email": "Listener@Example.com" },
        "subscription": { "interval": "monthly" }
    });
    let (status, body) = send(&app.router, webhook(&payload, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "received": true, "outcome": "activated" }));

    let (_, body) = send(&app.router, get_access(Some(LISTENER_TOKEN))).await;
    assert_eq!(body["isPremium"], true);
    assert_eq!(body["isInTrial"], false);
    assert_eq!(body["hasAccess"], true);

    // Monthly term lapses after 30 days
    app.clock.advance_secs(30 * 86_400);
    let (_, body) = send(&app.router, get_access(Some(LISTENER_TOKEN))).await;
    assert_eq!(body, no_access());
}

#[tokio::test]
async fn refund_revokes_premium() {
    let app = app();
    let mut record = SubscriberRecord::new_trial(
        listener_id(),
        Some("listener@example.com".to_string()),
        start(),
        30,
    );
    record.activate_subscription(None);
    app.store.seed(record).await;

    let payload = json!({ "event": "payment_refunded", "customer": { "email": "listener@example.com" } });
    let (_, body) = send(&app.router, webhook(&payload, None)).await;
    assert_eq!(body["outcome"], "revoked");

    let (_, body) = send(&app.router, get_access(Some(LISTENER_TOKEN))).await;
    assert_eq!(body["isPremium"], false);
    // Trial window from provisioning still applies
    assert_eq!(body["isInTrial"], true);
}

#[tokio::test]
async fn unknown_customer_is_acknowledged() {
    let app = app();

    let payload = json!({ "event": "payment_approved", "customer": { "email": "stranger@example.com" } });
    let (status, body) = send(&app.router, webhook(&payload, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "unknown_customer");
}

#[tokio::test]
async fn signed_webhook_is_verified() {
    let app = app_with(
        PaymentWebhookVerifier::new(SecretString::new(WEBHOOK_SECRET.to_string())),
        Vec::new(),
    );
    seed_trial(&app).await;

    let payload = json!({ "event": "payment_approved", "customer": { "email": "listener@example.com" } });

    let (status, _) = send(&app.router, webhook(&payload, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app.router, webhook(&payload, Some("sha256=00ff".to_string()))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(!app.store.get(&listener_id()).await.unwrap().subscribed);

    let (status, body) = send(&app.router, webhook(&payload, Some(sign(&payload)))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "activated");
    assert!(app.store.get(&listener_id()).await.unwrap().subscribed);
}

#[tokio::test]
async fn other_products_are_ignored() {
    let app = app_with(PaymentWebhookVerifier::unsigned(), vec!["prod_gate".to_string()]);
    seed_trial(&app).await;

    let payload = json!({
        "event": "payment_approved",
        "customer": { "email": "listener@example.com" },
        "product": { "id": "prod_other" }
    });
    let (_, body) = send(&app.router, webhook(&payload, None)).await;

    assert_eq!(body["outcome"], "ignored_product");
    assert!(!app.store.get(&listener_id()).await.unwrap().subscribed);
}

#[tokio::test]
async fn malformed_webhook_is_400() {
    let app = app();

    let request = Request::post("/api/webhooks/payments")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, _) = send(&app.router, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn admin_can_grant_subscription() {
    let app = app();
    seed_trial(&app).await;

    let (status, body) = send(
        &app.router,
        set_subscription(
            ADMIN_TOKEN,
            "listener-1",
            json!({ "subscribed": true, "subscriptionEnd": "2026-03-01T12:00:00Z" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["subscribed"], true);
    assert_eq!(body["userId"], "listener-1");

    let (_, body) = send(&app.router, get_access(Some(LISTENER_TOKEN))).await;
    assert_eq!(body["isPremium"], true);
}

#[tokio::test]
async fn non_admin_is_forbidden() {
    let app = app();
    seed_trial(&app).await;

    let (status, _) = send(
        &app.router,
        set_subscription(LISTENER_TOKEN, "listener-1", json!({ "subscribed": true })),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!app.store.get(&listener_id()).await.unwrap().subscribed);
}

#[tokio::test]
async fn admin_update_of_missing_subscriber_is_404() {
    let app = app();

    let (status, body) = send(
        &app.router,
        set_subscription(ADMIN_TOKEN, "nobody", json!({ "subscribed": true })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "SUBSCRIBER_NOT_FOUND");
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn health_reports_version() {
    let app = app();

    let (status, body) = send(
        &app.router,
        Request::get("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}
