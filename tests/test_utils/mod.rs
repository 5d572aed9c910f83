//! Test utilities for database testing.
//!
//! This module provides utilities for setting up in-memory SQLite databases
//! with migrations for testing purposes.

use anyhow::Result;
use collecty::models::{project, widget};
use collecty::repositories::{CreateProjectRequest, CreateWidgetRequest, ProjectRepository, WidgetRepository};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

/// Sets up an in-memory SQLite database with all migrations applied.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = Database::connect("sqlite::memory:").await?;
    Migrator::up(&db, None).await?;
    Ok(db)
}

/// Creates a project owned by `owner_id`.
#[allow(dead_code)]
pub async fn seed_project(db: &DatabaseConnection, owner_id: Uuid) -> Result<project::Model> {
    let project = ProjectRepository::new(db)
        .create_project(CreateProjectRequest {
            owner_id,
            name: "Integration Test Project".to_string(),
        })
        .await?;
    Ok(project)
}

/// Creates a widget in `project_id` with default configuration.
#[allow(dead_code)]
pub async fn seed_widget(
    db: &DatabaseConnection,
    project_id: Uuid,
    name: &str,
) -> Result<widget::Model> {
    let widget = WidgetRepository::new(db)
        .create_widget(
            project_id,
            CreateWidgetRequest {
                name: name.to_string(),
                ..Default::default()
            },
        )
        .await?;
    Ok(widget)
}
