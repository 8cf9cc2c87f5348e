use sqlx::mysql::MySqlPool;

use crate::config::AppConfig;
use crate::storage::mysql::pool_options;
use crate::utils::error::{AppError, AppResult};

// Database connection manager
pub struct Database {
    pub pool: MySqlPool,
}

impl Database {
    // Create a new database connection pool
    pub async fn new(config: &AppConfig) -> AppResult<Self> {
        let database_url = config
            .database_url
            .as_deref()
            .ok_or_else(|| AppError::BadRequest("DATABASE_URL must be set".to_string()))?;

        let pool = pool_options()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(database_url)
            .await?;

        tracing::info!(max_connections = config.max_connections, "database pool ready");
        Ok(Database { pool })
    }

    /// Applies the embedded migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    // Get a reference to the connection pool
    pub fn get_pool(&self) -> &MySqlPool {
        &self.pool
    }
}
