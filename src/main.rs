use std::sync::Arc;

use airline_operations::config::{AppConfig, StorageBackend};
use airline_operations::db::Database;
use airline_operations::storage::{MemoryStore, MySqlStore, Store};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

#[rocket::launch]
async fn rocket() -> _ {
    dotenv().ok();

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .try_init();

    let config = AppConfig::from_env().expect("Invalid configuration");
    tracing::info!(?config, "starting airline operations service");

    let store: Arc<dyn Store> = match config.storage {
        StorageBackend::Mysql => {
            // Connect to the database
            let database = Database::new(&config)
                .await
                .expect("Failed to connect to database");
            database
                .migrate()
                .await
                .expect("Failed to apply migrations");
            Arc::new(MySqlStore::new(database.get_pool().clone()))
        }
        StorageBackend::Memory => {
            tracing::warn!("using in-memory storage; data is lost on shutdown");
            Arc::new(MemoryStore::new())
        }
    };

    airline_operations::build_rocket(config, store)
}
