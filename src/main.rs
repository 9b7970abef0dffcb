// src/main.rs
use actix_web::middleware::{Logger, from_fn};
use actix_web::{App, HttpServer, web};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod access;
mod api_log;
mod auth;
mod cache;
mod cdn;
mod config;
mod db;
mod error;
mod models;
mod ordering;
mod routes;
mod target;
mod token;

#[cfg(test)]
mod test_support;

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    tracing::error!("{}: {}", context, err);
    std::io::Error::other(format!("{context}: {err}"))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| std::io::Error::other(format!("Failed to set tracing subscriber: {e}")))?;

    tracing::info!("Starting KeciApp API");

    dotenv::dotenv().ok();
    let config = config::Config::from_env()
        .map_err(|e| startup_error("Failed to load config from environment", e))?;

    let pool = db::connect(&config)
        .await
        .map_err(|e| startup_error("Failed to connect to Postgres", e))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| startup_error("Failed to run migrations", e))?;

    let tokens = web::Data::new(token::TokenService::from_config(&config));
    let cache = web::Data::new(cache::ContentCache::new(config.content_cache_capacity));
    let accounts = web::Data::new(cache::AccountCache::new(
        config.content_cache_capacity,
        std::time::Duration::from_secs(config.account_cache_seconds),
    ));
    let cdn = web::Data::new(cdn::CdnClient::from_config(&config));
    let pool = web::Data::new(pool);
    let bind = (config.host.clone(), config.port);
    let config = web::Data::new(config);

    tracing::info!("Listening on {}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(pool.clone())
            .app_data(config.clone())
            .app_data(tokens.clone())
            .app_data(cache.clone())
            .app_data(accounts.clone())
            .app_data(cdn.clone())
            .app_data(routes::json_config())
            .app_data(routes::query_config())
            .wrap(from_fn(api_log::record_request))
            .wrap(Logger::default())
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await
}
