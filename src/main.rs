//! Frequency Gate server binary.

use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use frequency_gate::adapters::{
    build_router, AccessAppState, AccessSettings, JwtConfig, JwtSessionValidator,
    PostgresSubscriberStore, RouterOptions,
};
use frequency_gate::config::AppConfig;
use frequency_gate::domain::access::PaymentWebhookVerifier;
use frequency_gate::ports::SystemClock;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load_validated()?;

    init_tracing(&config);

    let pool = config
        .database
        .pool_options()
        .connect(config.database.url.expose_secret())
        .await?;
    let store = Arc::new(PostgresSubscriberStore::new(pool));

    let webhook_verifier = PaymentWebhookVerifier::from_optional(config.payment.webhook_secret());
    if !webhook_verifier.is_enforcing() {
        tracing::warn!("Payment webhook secret not set; accepting unsigned webhooks");
    }

    let state = AccessAppState {
        subscriber_reader: store.clone(),
        subscriber_repository: store,
        clock: Arc::new(SystemClock),
        webhook_verifier: Arc::new(webhook_verifier),
        settings: Arc::new(AccessSettings {
            trial_days: config.access.trial_days,
            admin_emails: config.access.admin_emails_list(),
            accepted_products: config.payment.product_ids_list(),
        }),
    };

    let mut jwt = JwtConfig::new(config.auth.jwt_secret.clone(), config.auth.audience.clone())
        .with_leeway(config.auth.leeway_secs);
    if let Some(issuer) = &config.auth.issuer {
        jwt = jwt.with_issuer(issuer.clone());
    }
    let validator = Arc::new(JwtSessionValidator::new(jwt));

    let options = RouterOptions {
        request_timeout: config.server.request_timeout(),
        cors_origins: config.server.cors_origins_list(),
    };
    let router = build_router(state, validator, &options);

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
