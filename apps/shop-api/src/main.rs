//! Shop API - catalog, review, cart, and order endpoints over PostgreSQL

use axum_helpers::shutdown_signal;
use core_config::tracing::{init_tracing, install_color_eyre};
use migration::Migrator;
use tracing::info;

mod config;
mod openapi;
mod routes;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let db = database::postgres::connect_with_retry(&config.database.url, None).await?;
    database::postgres::run_migrations::<Migrator>(&db).await?;

    let app = routes::router(db);

    let address = config.server.address();
    info!("Starting shop-api on {}", address);

    let listener = tokio::net::TcpListener::bind(&address).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shop-api shutdown complete");
    Ok(())
}
