//! # Project Repository
//!
//! This module contains the repository implementation for Project entities.
//! A project is the embedding site; widgets, subscribers and API keys all
//! hang off it and cascade away with it.

use crate::error::ApiError;
use crate::models::project::{
    ActiveModel as ProjectActiveModel, Column, Entity as Project, Model as ProjectModel,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

/// Request data for creating a new project
#[derive(Debug, Clone)]
pub struct CreateProjectRequest {
    /// Owner the project belongs to
    pub owner_id: Uuid,
    /// Display name for the project
    pub name: String,
}

/// Repository for Project database operations
pub struct ProjectRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ProjectRepository<'a> {
    /// Create a new ProjectRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new project
    pub async fn create_project(
        &self,
        request: CreateProjectRequest,
    ) -> Result<ProjectModel, ApiError> {
        validate_project_name(&request.name)?;

        let now = Utc::now();
        let project = ProjectActiveModel {
            id: Set(Uuid::new_v4()),
            owner_id: Set(request.owner_id),
            name: Set(request.name.trim().to_string()),
            is_active: Set(true),
            popup_config: Set(None),
            inline_config: Set(None),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        let result = project.insert(self.db).await?;
        Ok(result)
    }

    /// Get project by ID
    pub async fn get_project(&self, project_id: Uuid) -> Result<Option<ProjectModel>, ApiError> {
        let project = Project::find_by_id(project_id).one(self.db).await?;
        Ok(project)
    }

    /// Get a project only when the given owner holds it.
    ///
    /// The management surface answers 404 for foreign projects, so the
    /// scoping happens in the query rather than after the fetch.
    pub async fn get_project_for_owner(
        &self,
        project_id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<ProjectModel>, ApiError> {
        let project = Project::find_by_id(project_id)
            .filter(Column::OwnerId.eq(owner_id))
            .one(self.db)
            .await?;
        Ok(project)
    }
}

/// Validate project name according to business rules
fn validate_project_name(name: &str) -> Result<(), ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(crate::error::validation_error(
            "project name cannot be empty",
            serde_json::json!({"name": "required"}),
        ));
    }

    if trimmed.len() > 255 {
        return Err(crate::error::validation_error(
            "project name cannot exceed 255 characters",
            serde_json::json!({"name": "too_long"}),
        ));
    }

    Ok(())
}
