// src/db/mod.rs
//! Query functions, one module per aggregate.
//!
//! Every function takes a pool or a connection and returns `sqlx::Error`;
//! handlers lift those into `AppError` with `?`.
use crate::config::Config;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod access;
pub mod audit;
pub mod content;
pub mod daily;
pub mod engagement;
pub mod podcasts;
pub mod popups;
pub mod progress;
pub mod tokens;
pub mod users;
pub mod weekly;

pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
