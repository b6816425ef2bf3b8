use std::time::Duration;

use sqlx::sqlite::SqlitePoolOptions;

use stocktalk_core::config::DatabaseConfig;

pub type DbPool = sqlx::SqlitePool;

/// Open a pool using the settings from the `[database]` config section.
pub async fn connect(settings: &DatabaseConfig) -> Result<DbPool, sqlx::Error> {
    connect_with_settings(&settings.url, settings.max_connections, settings.timeout_secs).await
}

pub async fn connect_with_settings(
    database_url: &str,
    max_connections: u32,
    timeout_secs: u64,
) -> Result<DbPool, sqlx::Error> {
    SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .acquire_timeout(Duration::from_secs(timeout_secs.max(1)))
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                // WAL keeps readers unblocked while a handler writes;
                // busy_timeout covers the writer handoff between sessions.
                sqlx::query("PRAGMA foreign_keys = ON").execute(&mut *conn).await?;
                sqlx::query("PRAGMA journal_mode = WAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA synchronous = NORMAL").execute(&mut *conn).await?;
                sqlx::query("PRAGMA busy_timeout = 5000").execute(&mut *conn).await?;
                Ok(())
            })
        })
        .connect(database_url)
        .await
}
