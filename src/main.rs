use std::io;
use std::sync::Arc;

use dotenvy::dotenv;
use restaurant_service::config::{AppConfig, ConfigError, StorageBackend};
use restaurant_service::db::create_redis_pool;
use restaurant_service::domain::ports::EphemeralStore;
use restaurant_service::infrastructure::ephemeral::InMemoryEphemeralStore;
use restaurant_service::infrastructure::payments::PayPalGateway;
use restaurant_service::infrastructure::redis_store::RedisEphemeralStore;
use restaurant_service::{build_server, create_pool, run_migrations, AppState};

fn ephemeral_store(config: &AppConfig) -> io::Result<Arc<dyn EphemeralStore>> {
    match config.redis_url.as_deref() {
        Some(url) => {
            let pool = create_redis_pool(url).map_err(io::Error::other)?;
            log::info!("Parties and carts are kept in Redis");
            Ok(Arc::new(RedisEphemeralStore::new(pool)))
        }
        None => {
            log::warn!("REDIS_URL not set; parties and carts are local to this process");
            Ok(Arc::new(InMemoryEphemeralStore::new()))
        }
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(io::Error::other)?;

    let mut state = match config.storage {
        StorageBackend::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| io::Error::other(ConfigError::Missing("DATABASE_URL")))?;
            let pool = create_pool(url).map_err(io::Error::other)?;
            run_migrations(&pool).map_err(io::Error::other)?;
            AppState::postgres(pool, ephemeral_store(&config)?, &config)
        }
        StorageBackend::Memory => {
            log::warn!("Running with in-memory storage; nothing survives a restart");
            let (state, _catalog) = AppState::in_memory(&config);
            state
        }
    };

    match config.paypal.clone() {
        Some(paypal) => {
            let gateway = PayPalGateway::new(paypal).map_err(io::Error::other)?;
            state = state.with_payments(Arc::new(gateway));
        }
        None => log::info!("PayPal not configured; /checkout/capture is disabled"),
    }

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(state, &config.host, config.port)?.await
}
