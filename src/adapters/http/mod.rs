//! HTTP adapters - REST API implementations.
//!
//! `build_router` assembles the access endpoints with authentication,
//! tracing, CORS and request timeouts.

pub mod access;
pub mod middleware;

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

pub use access::{AccessAppState, AccessSettings};
pub use middleware::AuthState;

use access::{access_routes, admin_routes, handlers::health, webhook_routes};
use middleware::auth_middleware;

/// Cross-cutting HTTP options.
#[derive(Debug, Clone)]
pub struct RouterOptions {
    pub request_timeout: Duration,
    /// Allowed browser origins. `*` allows any origin; empty allows none.
    pub cors_origins: Vec<String>,
}

impl Default for RouterOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
            cors_origins: Vec::new(),
        }
    }
}

/// Build the application router.
///
/// ```text
/// /health                                     (no auth)
/// /api/access, /api/admin/...                 (bearer auth middleware)
/// /api/webhooks/payments                      (signature verified)
/// ```
pub fn build_router(state: AccessAppState, auth: AuthState, options: &RouterOptions) -> Router {
    let authenticated = Router::new()
        .nest("/access", access_routes())
        .nest("/admin", admin_routes())
        .route_layer(from_fn_with_state(auth, auth_middleware));

    let api = authenticated.nest("/webhooks", webhook_routes());

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .with_state(state)
        .layer(TimeoutLayer::new(options.request_timeout))
        .layer(cors_layer(&options.cors_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(parsed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::adapters::auth::MockSessionValidator;
    use crate::adapters::memory::InMemorySubscriberStore;
    use crate::domain::access::PaymentWebhookVerifier;
    use crate::domain::foundation::Timestamp;
    use crate::ports::FixedClock;

    fn router(options: RouterOptions) -> Router {
        let store = InMemorySubscriberStore::new();
        let state = AccessAppState {
            subscriber_reader: Arc::new(store.clone()),
            subscriber_repository: Arc::new(store),
            clock: Arc::new(FixedClock::new(Timestamp::now())),
            webhook_verifier: Arc::new(PaymentWebhookVerifier::unsigned()),
            settings: Arc::new(AccessSettings::default()),
        };
        build_router(state, Arc::new(MockSessionValidator::new()), &options)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let response = router(RouterOptions::default())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = router(RouterOptions::default())
            .oneshot(Request::get("/api/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn cors_allows_configured_origin() {
        let options = RouterOptions {
            cors_origins: vec!["http://localhost:5173".to_string()],
            ..Default::default()
        };

        let response = router(options)
            .oneshot(
                Request::get("/health")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
                .unwrap(),
            "http://localhost:5173"
        );
    }

    #[tokio::test]
    async fn cors_omits_header_for_other_origins() {
        let options = RouterOptions {
            cors_origins: vec!["http://localhost:5173".to_string()],
            ..Default::default()
        };

        let response = router(options)
            .oneshot(
                Request::get("/health")
                    .header(header::ORIGIN, "https://evil.example.com")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none());
    }
}
