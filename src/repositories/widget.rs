//! # Widget Repository
//!
//! This module contains the repository implementation for Widget entities.
//! It owns the lifecycle invariants: a project with widgets always has
//! exactly one default, and the last widget cannot be removed.

use crate::error::{ApiError, ErrorType, is_unique_violation};
use crate::models::widget::{
    ActiveModel as WidgetActiveModel, Column, Entity as Widget, Model as WidgetModel,
};
use axum::http::StatusCode;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use uuid::Uuid;

/// Request data for creating a new widget
#[derive(Debug, Clone, Default)]
pub struct CreateWidgetRequest {
    /// Internal name shown in the dashboard
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub button_text: Option<String>,
    pub success_message: Option<String>,
    pub placeholder: Option<String>,
    pub primary_color: Option<String>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub border_radius: Option<i32>,
    pub position: Option<String>,
    pub trigger_type: Option<String>,
    pub trigger_value: Option<i32>,
    pub layout: Option<String>,
}

/// Partial update for a widget. Absent fields stay untouched.
#[derive(Debug, Clone, Default)]
pub struct UpdateWidgetRequest {
    pub name: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub button_text: Option<String>,
    pub success_message: Option<String>,
    pub placeholder: Option<String>,
    pub primary_color: Option<String>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub border_radius: Option<i32>,
    pub position: Option<String>,
    pub trigger_type: Option<String>,
    pub trigger_value: Option<i32>,
    pub layout: Option<String>,
    pub is_active: Option<bool>,
    /// `Some(true)` promotes this widget, demoting the current default
    pub make_default: Option<bool>,
}

/// Repository for Widget database operations
pub struct WidgetRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> WidgetRepository<'a> {
    /// Create a new WidgetRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a new widget. The first widget of a project becomes its default.
    pub async fn create_widget(
        &self,
        project_id: Uuid,
        request: CreateWidgetRequest,
    ) -> Result<WidgetModel, ApiError> {
        validate_widget_name(&request.name)?;

        let existing = Widget::find()
            .filter(Column::ProjectId.eq(project_id))
            .count(self.db)
            .await?;

        match self
            .insert_widget(project_id, &request, existing == 0)
            .await
        {
            Ok(widget) => Ok(widget),
            // Two first-widget inserts can race on the one-default index;
            // the loser keeps its row but yields the default slot.
            Err(err) if is_unique_violation(&err) => {
                let widget = self.insert_widget(project_id, &request, false).await?;
                Ok(widget)
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn insert_widget(
        &self,
        project_id: Uuid,
        request: &CreateWidgetRequest,
        is_default: bool,
    ) -> Result<WidgetModel, sea_orm::DbErr> {
        let now = Utc::now();
        let widget = WidgetActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            name: Set(request.name.trim().to_string()),
            title: Set(request.title.clone()),
            description: Set(request.description.clone()),
            button_text: Set(request.button_text.clone()),
            success_message: Set(request.success_message.clone()),
            placeholder: Set(request.placeholder.clone()),
            primary_color: Set(request.primary_color.clone()),
            background_color: Set(request.background_color.clone()),
            text_color: Set(request.text_color.clone()),
            border_radius: Set(request.border_radius),
            position: Set(request.position.clone()),
            trigger_type: Set(request.trigger_type.clone()),
            trigger_value: Set(request.trigger_value),
            layout: Set(request.layout.clone()),
            lead_magnet_id: Set(None),
            is_default: Set(is_default),
            is_active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };

        widget.insert(self.db).await
    }

    /// Get widget by ID
    pub async fn get_widget(&self, widget_id: Uuid) -> Result<Option<WidgetModel>, ApiError> {
        let widget = Widget::find_by_id(widget_id).one(self.db).await?;
        Ok(widget)
    }

    /// List a project's widgets in creation order
    pub async fn list_widgets(&self, project_id: Uuid) -> Result<Vec<WidgetModel>, ApiError> {
        let widgets = Widget::find()
            .filter(Column::ProjectId.eq(project_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .all(self.db)
            .await?;
        Ok(widgets)
    }

    /// Find the project's default widget
    pub async fn find_default_for_project(
        &self,
        project_id: Uuid,
    ) -> Result<Option<WidgetModel>, ApiError> {
        let widget = Widget::find()
            .filter(Column::ProjectId.eq(project_id))
            .filter(Column::IsDefault.eq(true))
            .one(self.db)
            .await?;
        Ok(widget)
    }

    /// Find the project's oldest widget
    pub async fn find_oldest_for_project(
        &self,
        project_id: Uuid,
    ) -> Result<Option<WidgetModel>, ApiError> {
        let widget = Widget::find()
            .filter(Column::ProjectId.eq(project_id))
            .order_by_asc(Column::CreatedAt)
            .order_by_asc(Column::Id)
            .one(self.db)
            .await?;
        Ok(widget)
    }

    /// Apply a partial update to a widget.
    ///
    /// Promotion runs demote-then-promote inside one transaction so the
    /// one-default-per-project index never sees two defaults.
    pub async fn update_widget(
        &self,
        widget_id: Uuid,
        request: UpdateWidgetRequest,
    ) -> Result<WidgetModel, ApiError> {
        let widget = self
            .get_widget(widget_id)
            .await?
            .ok_or_else(|| crate::error::not_found(Some("widget not found")))?;

        if let Some(name) = &request.name {
            validate_widget_name(name)?;
        }

        let promote = request.make_default == Some(true) && !widget.is_default;
        let project_id = widget.project_id;

        let txn = self.db.begin().await?;

        if promote
            && let Some(current_default) = Widget::find()
                .filter(Column::ProjectId.eq(project_id))
                .filter(Column::IsDefault.eq(true))
                .one(&txn)
                .await?
        {
            let mut demoted = current_default.into_active_model();
            demoted.is_default = Set(false);
            demoted.updated_at = Set(Utc::now().into());
            demoted.update(&txn).await?;
        }

        let mut active = widget.into_active_model();
        if let Some(name) = request.name {
            active.name = Set(name.trim().to_string());
        }
        if let Some(title) = request.title {
            active.title = Set(Some(title));
        }
        if let Some(description) = request.description {
            active.description = Set(Some(description));
        }
        if let Some(button_text) = request.button_text {
            active.button_text = Set(Some(button_text));
        }
        if let Some(success_message) = request.success_message {
            active.success_message = Set(Some(success_message));
        }
        if let Some(placeholder) = request.placeholder {
            active.placeholder = Set(Some(placeholder));
        }
        if let Some(primary_color) = request.primary_color {
            active.primary_color = Set(Some(primary_color));
        }
        if let Some(background_color) = request.background_color {
            active.background_color = Set(Some(background_color));
        }
        if let Some(text_color) = request.text_color {
            active.text_color = Set(Some(text_color));
        }
        if let Some(border_radius) = request.border_radius {
            active.border_radius = Set(Some(border_radius));
        }
        if let Some(position) = request.position {
            active.position = Set(Some(position));
        }
        if let Some(trigger_type) = request.trigger_type {
            active.trigger_type = Set(Some(trigger_type));
        }
        if let Some(trigger_value) = request.trigger_value {
            active.trigger_value = Set(Some(trigger_value));
        }
        if let Some(layout) = request.layout {
            active.layout = Set(Some(layout));
        }
        if let Some(is_active) = request.is_active {
            active.is_active = Set(is_active);
        }
        if promote {
            active.is_default = Set(true);
        }
        active.updated_at = Set(Utc::now().into());

        let updated = active.update(&txn).await?;
        txn.commit().await?;

        Ok(updated)
    }

    /// Delete a widget.
    ///
    /// Refuses to delete the project's last widget; deleting the default
    /// promotes the oldest survivor in the same transaction.
    pub async fn delete_widget(&self, widget_id: Uuid) -> Result<(), ApiError> {
        let widget = self
            .get_widget(widget_id)
            .await?
            .ok_or_else(|| crate::error::not_found(Some("widget not found")))?;

        let sibling_count = Widget::find()
            .filter(Column::ProjectId.eq(widget.project_id))
            .count(self.db)
            .await?;

        if sibling_count <= 1 {
            return Err(ApiError::new(
                StatusCode::CONFLICT,
                ErrorType::Conflict.error_code(),
                "a project must keep at least one widget",
            ));
        }

        let project_id = widget.project_id;
        let was_default = widget.is_default;

        let txn = self.db.begin().await?;

        Widget::delete_by_id(widget.id).exec(&txn).await?;

        if was_default
            && let Some(survivor) = Widget::find()
                .filter(Column::ProjectId.eq(project_id))
                .order_by_asc(Column::CreatedAt)
                .order_by_asc(Column::Id)
                .one(&txn)
                .await?
        {
            let mut promoted = survivor.into_active_model();
            promoted.is_default = Set(true);
            promoted.updated_at = Set(Utc::now().into());
            promoted.update(&txn).await?;
        }

        txn.commit().await?;
        Ok(())
    }
}

/// Validate widget name according to business rules
fn validate_widget_name(name: &str) -> Result<(), ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(crate::error::validation_error(
            "widget name cannot be empty",
            serde_json::json!({"name": "required"}),
        ));
    }

    if trimmed.len() > 255 {
        return Err(crate::error::validation_error(
            "widget name cannot exceed 255 characters",
            serde_json::json!({"name": "too_long"}),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::project::{CreateProjectRequest, ProjectRepository};
    use migration::MigratorTrait;
    use sea_orm::Database;

    async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        db
    }

    async fn seed_project(db: &DatabaseConnection) -> Uuid {
        let repo = ProjectRepository::new(db);
        repo.create_project(CreateProjectRequest {
            owner_id: Uuid::new_v4(),
            name: "Widget Tests".to_string(),
        })
        .await
        .unwrap()
        .id
    }

    fn named(name: &str) -> CreateWidgetRequest {
        CreateWidgetRequest {
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_first_widget_becomes_default() {
        let db = setup_test_db().await;
        let project_id = seed_project(&db).await;
        let repo = WidgetRepository::new(&db);

        let first = repo.create_widget(project_id, named("first")).await.unwrap();
        let second = repo
            .create_widget(project_id, named("second"))
            .await
            .unwrap();

        assert!(first.is_default);
        assert!(!second.is_default);
        assert!(first.is_active);
    }

    #[tokio::test]
    async fn test_make_default_demotes_previous() {
        let db = setup_test_db().await;
        let project_id = seed_project(&db).await;
        let repo = WidgetRepository::new(&db);

        let first = repo.create_widget(project_id, named("first")).await.unwrap();
        let second = repo
            .create_widget(project_id, named("second"))
            .await
            .unwrap();

        let promoted = repo
            .update_widget(
                second.id,
                UpdateWidgetRequest {
                    make_default: Some(true),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(promoted.is_default);

        let demoted = repo.get_widget(first.id).await.unwrap().unwrap();
        assert!(!demoted.is_default);

        let default = repo.find_default_for_project(project_id).await.unwrap();
        assert_eq!(default.map(|w| w.id), Some(second.id));
    }

    #[tokio::test]
    async fn test_partial_update_leaves_other_fields() {
        let db = setup_test_db().await;
        let project_id = seed_project(&db).await;
        let repo = WidgetRepository::new(&db);

        let widget = repo
            .create_widget(
                project_id,
                CreateWidgetRequest {
                    name: "patchable".to_string(),
                    title: Some("Original title".to_string()),
                    primary_color: Some("#ff0000".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let updated = repo
            .update_widget(
                widget.id,
                UpdateWidgetRequest {
                    title: Some("New title".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title.as_deref(), Some("New title"));
        assert_eq!(updated.primary_color.as_deref(), Some("#ff0000"));
        assert!(updated.is_default);
    }

    #[tokio::test]
    async fn test_delete_default_promotes_oldest_survivor() {
        let db = setup_test_db().await;
        let project_id = seed_project(&db).await;
        let repo = WidgetRepository::new(&db);

        let first = repo.create_widget(project_id, named("first")).await.unwrap();
        let second = repo
            .create_widget(project_id, named("second"))
            .await
            .unwrap();
        let third = repo.create_widget(project_id, named("third")).await.unwrap();

        repo.delete_widget(first.id).await.unwrap();

        let survivors = repo.list_widgets(project_id).await.unwrap();
        assert_eq!(survivors.len(), 2);

        let default = repo
            .find_default_for_project(project_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(default.id, second.id);

        let third_reloaded = repo.get_widget(third.id).await.unwrap().unwrap();
        assert!(!third_reloaded.is_default);
    }

    #[tokio::test]
    async fn test_last_widget_cannot_be_deleted() {
        let db = setup_test_db().await;
        let project_id = seed_project(&db).await;
        let repo = WidgetRepository::new(&db);

        let only = repo.create_widget(project_id, named("only")).await.unwrap();

        let result = repo.delete_widget(only.id).await;
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert_eq!(err.status, StatusCode::CONFLICT);
        assert_eq!(err.code, "CONFLICT".into());

        // Row still present
        assert!(repo.get_widget(only.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_unknown_widget_is_not_found() {
        let db = setup_test_db().await;
        seed_project(&db).await;
        let repo = WidgetRepository::new(&db);

        let err = repo.delete_widget(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
