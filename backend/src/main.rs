//! ConfesApp entry point: load settings, prepare the database and serve.

use std::sync::Arc;

use actix_web::web;
use mockable::{DefaultClock, DefaultEnv};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use confesapp::inbound::http::auth::TokenCodec;
use confesapp::inbound::http::health::HealthState;
use confesapp::inbound::http::token_config::{BuildMode, token_key_from_env};
use confesapp::outbound::persistence::{
    DbPool, DieselReadinessProbe, PoolConfig, run_migrations,
};
use confesapp::server::{ServerConfig, ServerSettings, create_server};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::load_from_iter(std::env::args_os())
        .map_err(|e| std::io::Error::other(e.to_string()))?;
    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let database_url = settings.database_url().map_err(std::io::Error::other)?;
    let token_ttl = settings.token_ttl().map_err(std::io::Error::other)?;

    let key = token_key_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    let codec = TokenCodec::new(&key, token_ttl, Arc::new(DefaultClock));
    drop(key);

    if settings.run_migrations() {
        run_migrations(database_url)
            .await
            .map_err(std::io::Error::other)?;
    }

    let pool = DbPool::new(
        PoolConfig::new(database_url).with_max_size(settings.db_max_connections()),
    )
    .await
    .map_err(std::io::Error::other)?;

    let health_state = web::Data::new(
        HealthState::new().with_database(Arc::new(DieselReadinessProbe::new(pool.clone()))),
    );
    let server = create_server(
        health_state.clone(),
        ServerConfig::new(bind_addr, pool, codec),
    )?;
    info!(%bind_addr, "confesapp listening");

    let outcome = server.await;
    health_state.mark_unhealthy();
    outcome
}
