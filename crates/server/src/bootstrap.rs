use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use cardesk_agent::{
    GeminiClient, LoggingCrmNotifier, LoggingEscalationNotifier, NullCalendarGateway, Secretary,
};
use cardesk_core::config::{AppConfig, ConfigError, LlmProvider, LoadOptions};
use cardesk_db::repositories::{
    SqlConversationRepository, SqlLeadRepository, SqlMeetingRepository, SqlProfileRepository,
    SqlTenantRepository,
};
use cardesk_db::{connect_with_settings, migrations, DbPool};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub secretary: Arc<Secretary>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("llm provider {0:?} has no client implementation yet")]
    UnsupportedProvider(LlmProvider),
    #[error("llm configuration invalid: {0}")]
    Llm(String),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(event_name = "system.bootstrap.database_connected", "database connection established");

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(event_name = "system.bootstrap.migrations_applied", "database migrations applied");

    let model = match config.llm.provider {
        LlmProvider::Gemini => Arc::new(
            GeminiClient::from_config(&config.llm).map_err(|e| BootstrapError::Llm(e.to_string()))?,
        ),
        other => return Err(BootstrapError::UnsupportedProvider(other)),
    };

    let secretary = Arc::new(Secretary::new(
        Arc::new(SqlTenantRepository::new(db_pool.clone())),
        Arc::new(SqlProfileRepository::new(db_pool.clone())),
        Arc::new(SqlConversationRepository::new(db_pool.clone())),
        Arc::new(SqlLeadRepository::new(db_pool.clone())),
        Arc::new(SqlMeetingRepository::new(db_pool.clone())),
        Arc::new(NullCalendarGateway),
        model,
        Arc::new(LoggingEscalationNotifier),
        Arc::new(LoggingCrmNotifier),
    ));

    info!(event_name = "system.bootstrap.complete", "application bootstrap complete");

    Ok(Application { config, db_pool, secretary })
}
