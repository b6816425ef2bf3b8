use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use stocktalk_agent::llm::{HttpLlmClient, LlmClient, LlmError};
use stocktalk_core::config::{AppConfig, ConfigError, LoadOptions};
use stocktalk_db::{connect, migrations, DbPool, InventoryRepository, SqlInventoryRepository};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub llm: Arc<dyn LlmClient>,
    pub repository: Arc<dyn InventoryRepository>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("model client construction failed: {0}")]
    LlmClient(#[source] LlmError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool =
        connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let llm: Arc<dyn LlmClient> =
        Arc::new(HttpLlmClient::from_config(&config.llm).map_err(BootstrapError::LlmClient)?);
    let repository: Arc<dyn InventoryRepository> =
        Arc::new(SqlInventoryRepository::new(db_pool.clone()));

    Ok(Application { config, db_pool, llm, repository })
}
