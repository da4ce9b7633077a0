mod models;
mod handlers;
mod services;
mod middleware;
mod macc;
mod config;
mod errors;
mod router;
mod state;
mod views;
#[cfg(test)]
mod test_utils;

use std::sync::Arc;
use anyhow::Context;
use tracing_subscriber::EnvFilter;
use crate::{
    config::Config,
    services::{AccountService, RedisService},
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("macc_web=debug,tower_http=info")),
        )
        .init();

    // Missing Redis URL or session secret is fatal
    let config = Config::load().context("Failed to load configuration")?;

    let redis_client = redis::Client::open(config.redis.url.as_str())
        .context("Invalid Redis URL")?;
    let remember_ttl = config.remember_max_age().whole_seconds().max(1) as u64;
    let store = RedisService::connect(redis_client, remember_ttl)
        .await
        .context("Failed to connect to Redis")?;

    let accounts = AccountService::new(Arc::new(store), &config.auth);
    let generated = accounts
        .bootstrap_admin(config.auth.admin_password.as_deref())
        .await
        .context("Failed to create admin account")?;
    if let Some(password) = generated {
        tracing::warn!(
            "Admin account {} created with generated password {}; change it via the admin panel",
            config.auth.admin_email,
            password
        );
    }

    let address = format!("{}:{}", config.server.host, config.server.port);
    let app = router::build_router(AppState::new(accounts, config));

    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    tracing::info!("Server running on {}", address);

    axum::serve(listener, app.into_make_service())
        .await
        .context("Server error")?;
    Ok(())
}
