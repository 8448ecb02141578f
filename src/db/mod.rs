//! Database initialization and migration runner.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::llm::config::env_parse;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Initialize the PostgreSQL connection pool and run migrations.
///
/// Pool size comes from `DB_MAX_CONNECTIONS` (default 5).
///
/// # Errors
///
/// Returns an error if the connection or migrations fail.
pub async fn init_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(env_parse("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS))
        .connect(database_url)
        .await?;

    sqlx::migrate!("src/db/migrations").run(&pool).await?;

    Ok(pool)
}
