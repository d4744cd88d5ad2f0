pub mod error;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use smstodo_core::config::Config;
use smstodo_core::db::RedbStore;
use smstodo_core::sms::{DryRunSms, SmsSender, VonageSms};
use state::AppState;

/// Build the axum Router with all routes and middleware.
/// Used by `serve()` and available for integration testing.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhooks/inbound-sms", post(routes::webhook::inbound_sms))
        .route("/healthz", get(routes::health::healthz))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Open the store, wire up the gateway client, and serve until shutdown.
///
/// `dry_run` swaps the real SMS client for a logging one, so the webhook
/// pipeline can be exercised locally without sending messages.
pub async fn serve(config: Config, dry_run: bool) -> anyhow::Result<()> {
    let store = Arc::new(RedbStore::open(&config.db_path)?);
    let sms: Arc<dyn SmsSender> = if dry_run {
        Arc::new(DryRunSms)
    } else {
        Arc::new(VonageSms::new(&config.api_key, &config.api_secret))
    };
    let state = AppState::new(
        store,
        sms,
        config.service_number.clone(),
        config.signature_secret.clone(),
        config.signature_method,
    );
    let app = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        port = config.port,
        db = %config.db_path.display(),
        dry_run,
        "smstodo webhook server listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
