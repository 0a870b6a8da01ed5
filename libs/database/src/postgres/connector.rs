use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use sea_orm_migration::MigratorTrait;
use std::time::Duration;
use tracing::{info, log::LevelFilter};

use crate::common::{retry_with_backoff, RetryConfig};

/// Connect to PostgreSQL with the workspace's pool settings.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(database_url);
    opt.max_connections(50)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(60))
        .sqlx_logging(true)
        .sqlx_logging_level(LevelFilter::Debug); // SeaORM requires log::LevelFilter

    let db = Database::connect(opt).await?;

    info!("Connected to PostgreSQL");

    Ok(db)
}

/// Connect with automatic retry on failure.
///
/// Exponential backoff covers the window where the database container is
/// still starting.
pub async fn connect_with_retry(
    database_url: &str,
    retry_config: Option<RetryConfig>,
) -> Result<DatabaseConnection, DbErr> {
    let url = database_url.to_string();
    let config = retry_config.unwrap_or_default();
    retry_with_backoff(|| connect(&url), config).await
}

/// Apply all pending migrations.
pub async fn run_migrations<M: MigratorTrait>(db: &DatabaseConnection) -> Result<(), DbErr> {
    let pending = M::get_pending_migrations(db).await?.len();
    if pending > 0 {
        info!(pending, "Applying database migrations");
    }
    M::up(db, None).await?;
    Ok(())
}
