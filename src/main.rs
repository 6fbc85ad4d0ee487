use anyhow::{anyhow, Context};
use foodgram_backend::{
    api::{routes, AppState},
    cache::Cache,
    config::Config,
    logging,
};
use sqlx::postgres::PgPoolOptions;

async fn connect_cache(config: &Config) -> Cache {
    let Some(url) = &config.redis_url else {
        log::info!("> REDIS_URL not set, running without cache");
        return Cache::disabled();
    };

    let connection = match redis::Client::open(url.as_str()) {
        Ok(client) => client.get_multiplexed_async_connection().await,
        Err(e) => Err(e),
    };
    match connection {
        Ok(connection) => Cache::new(Some(connection), config.cache_ttl_seconds),
        Err(e) => {
            log::error!("> Could not connect to redis, running without cache: {e}");
            Cache::disabled()
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init().map_err(|e| anyhow!("Could not initialise logging: {e}"))?;
    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .context("Could not connect to the database")?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Could not run migrations")?;

    let cache = connect_cache(&config).await;
    if cache.is_enabled() {
        log::info!("> Caching catalog reads for {}s", config.cache_ttl_seconds);
    }
    let state = AppState::new(pool, cache);

    log::info!("> Listening on {}", config.bind_address);
    warp::serve(routes(state)).run(config.bind_address).await;

    Ok(())
}
