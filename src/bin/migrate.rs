//! Standalone migration runner for deploy pipelines that separate schema
//! changes from server rollout. The server applies pending migrations on
//! boot either way; this binary exists for running them ahead of time and
//! for stepping back a bad one.

use anyhow::{Context, Result, bail};
use collecty::{config::ConfigLoader, db};
use migration::{Migrator, MigratorTrait};

#[tokio::main]
async fn main() -> Result<()> {
    let loader = ConfigLoader::new();
    let config = loader.load().context("loading configuration")?;

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    let action = std::env::args().nth(1).unwrap_or_else(|| "up".to_string());
    match action.as_str() {
        "up" => {
            Migrator::up(&db, None)
                .await
                .context("applying pending migrations")?;
            println!("Migrations applied.");
        }
        "down" => {
            Migrator::down(&db, Some(1))
                .await
                .context("reverting last migration")?;
            println!("Reverted the last applied migration.");
        }
        "status" => {
            Migrator::status(&db)
                .await
                .context("reading migration status")?;
        }
        other => {
            bail!("unknown action {:?}; expected up, down or status", other);
        }
    }

    Ok(())
}
