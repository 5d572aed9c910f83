//! # Collecty API Main Entry Point
//!
//! This is the main entry point for the Collecty API service.

use collecty::{config::ConfigLoader, db, server::run_server, telemetry};
use migration::MigratorTrait;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    telemetry::init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "configuration loaded");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(configuration = %redacted_json, "effective configuration");
    }

    let pool = db::init_pool(&config).await?;

    // Apply pending migrations on boot so a fresh database is usable
    migration::Migrator::up(&pool, None).await?;

    run_server(config, pool).await
}
