//! Rewards settlement service - entry point

use anyhow::Context;
use rewards_ledger::{derive_machine_key, sqlite, Database, SecretEncryptor};
use rewards_server::{build_router, AppState, Config};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Credential name under which the gateway signing key is stored
const SIGNING_KEY_NAME: &str = "gateway_signing_key";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rewards_server=debug,rewards_engine=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting rewards settlement service");

    let config = Config::from_env();

    let db = Database::connect(&config.db_path())
        .await
        .context("failed to open ledger database")?;

    // Signing key is kept encrypted at rest, bound to this machine
    let machine_key = derive_machine_key().context("failed to derive machine encryption key")?;
    let encryptor = SecretEncryptor::new(&machine_key)?;
    let signing_key = load_signing_key(&db, &encryptor).await?;

    let state = AppState::new(&config, db, &signing_key);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Listening on {}", config.bind_addr);

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

/// Import the gateway signing key from the environment on first run,
/// otherwise decrypt the stored copy.
async fn load_signing_key(db: &Database, encryptor: &SecretEncryptor) -> anyhow::Result<String> {
    if let Ok(key) = std::env::var("REWARDS_SIGNING_KEY") {
        if !key.trim().is_empty() {
            let encrypted = encryptor.encrypt(&key)?;
            sqlite::store_credential(db.pool(), SIGNING_KEY_NAME, &encrypted).await?;
            tracing::info!("Gateway signing key imported from environment");
            return Ok(key);
        }
    }

    let encrypted = sqlite::load_credential(db.pool(), SIGNING_KEY_NAME)
        .await?
        .context("no gateway signing key stored; set REWARDS_SIGNING_KEY once to import it")?;

    let key = encryptor.decrypt(&encrypted)?;
    tracing::info!("Gateway signing key loaded from ledger");
    Ok(key)
}
