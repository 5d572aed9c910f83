//! Database migrations for the Collecty API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_06_10_090000_create_projects;
mod m2025_06_10_090100_create_lead_magnets;
mod m2025_06_10_090200_create_widgets;
mod m2025_06_10_090300_create_subscribers;
mod m2025_06_10_090400_create_api_keys;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_06_10_090000_create_projects::Migration),
            Box::new(m2025_06_10_090100_create_lead_magnets::Migration),
            Box::new(m2025_06_10_090200_create_widgets::Migration),
            Box::new(m2025_06_10_090300_create_subscribers::Migration),
            Box::new(m2025_06_10_090400_create_api_keys::Migration),
        ]
    }
}
