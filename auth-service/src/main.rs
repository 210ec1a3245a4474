use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use common_session::Role;
use revivatech_auth::config::{load_config, AppConfig};
use revivatech_auth::password::hash_password;
use revivatech_auth::store::{AccountStore, MemoryAccountStore, PgAccountStore};
use revivatech_auth::{build_router, AppState};
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const PURGE_INTERVAL: Duration = Duration::from_secs(15 * 60);

async fn build_state(config: AppConfig) -> Result<AppState> {
    match config.database_url.clone() {
        Some(url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .acquire_timeout(config.lookup_timeout)
                .connect(&url)
                .await
                .context("Failed to connect to DATABASE_URL")?;
            info!("using postgres account store");
            AppState::with_store(config, Arc::new(PgAccountStore::new(pool)))
        }
        None => {
            let store = MemoryAccountStore::new();
            if let Some(seed) = config.seed_admin.as_ref() {
                let hash = hash_password(&seed.password).context("Failed to hash seed password")?;
                let admin = store
                    .add_user(&seed.email, hash, Role::SuperAdmin, true)
                    .context("Failed to seed admin account")?;
                info!(user_id = %admin.id, email = %admin.email, "seeded SUPER_ADMIN account");
            }
            warn!(
                environment = config.environment.as_str(),
                "DATABASE_URL not set; sessions are kept in memory"
            );
            AppState::with_store(config, Arc::new(store))
        }
    }
}

fn spawn_purge(accounts: Arc<dyn AccountStore>) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(PURGE_INTERVAL);
        loop {
            ticker.tick().await;
            match accounts.purge_sessions(Utc::now()).await {
                Ok(0) => {}
                Ok(purged) => info!(purged, "purged stale sessions"),
                Err(err) => warn!(error = %err, "session purge failed"),
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = load_config()?;
    let addr = SocketAddr::new(config.host, config.port);
    info!(
        environment = config.environment.as_str(),
        cookie = %config.cookie.name,
        secure = config.cookie.secure,
        ttl_hours = config.session_ttl_hours,
        "starting revivatech-auth"
    );

    let state = build_state(config).await?;
    spawn_purge(state.accounts.clone());
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
