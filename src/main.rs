//! Storefront service binary.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storefront::config::Config;
use storefront::http::{router, AppState};
use storefront::payment::card::CardClient;
use storefront::payment::wallet::WalletClient;
use storefront::store::postgres::PgStore;
use storefront::store::Store;

const PURGE_INTERVAL_SECS: u64 = 60;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let db = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let store: Arc<dyn Store> = Arc::new(PgStore::new(db));
    spawn_pending_payment_purge(store.clone());

    let state = AppState {
        store,
        card: Arc::new(CardClient::new(config.card.clone())),
        wallet: Arc::new(WalletClient::new(config.wallet.clone())),
        session_secret: config.session_secret.clone(),
        webhook_secret: config.card.webhook_secret.clone(),
        public_base_url: config.public_base_url.clone(),
        pending_payment_ttl_secs: config.pending_payment_ttl_secs,
    };
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    tracing::info!("storefront listening on 0.0.0.0:{}", config.port);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Unconfirmed payments expire instead of accumulating forever.
fn spawn_pending_payment_purge(store: Arc<dyn Store>) {
    tokio::spawn(async move {
        let mut tick = tokio::time::interval(Duration::from_secs(PURGE_INTERVAL_SECS));
        loop {
            tick.tick().await;
            match store.purge_expired_payments().await {
                Ok(0) => {}
                Ok(purged) => tracing::info!(purged, "expired pending payments removed"),
                Err(e) => tracing::warn!(error = %e, "pending payment purge failed"),
            }
        }
    });
}
