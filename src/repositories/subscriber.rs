//! # Subscriber Repository
//!
//! This module contains the repository implementation for Subscriber entities,
//! providing the signup upsert and cursor-paginated listing for the dashboard.

use crate::error::{ApiError, is_unique_violation};
use crate::models::subscriber::{
    ActiveModel as SubscriberActiveModel, Column, Entity as Subscriber, Model as SubscriberModel,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

/// Cursor data structure for pagination
#[derive(Debug, Clone, Serialize, Deserialize, FromQueryResult)]
pub struct CursorData {
    pub subscribed_at: DateTime<Utc>,
    pub id: Uuid,
}

/// Request data for recording a signup
#[derive(Debug, Clone)]
pub struct UpsertSubscriberRequest {
    pub project_id: Uuid,
    pub widget_id: Option<Uuid>,
    /// Raw submitted address; normalized to lowercase before storage
    pub email: String,
    pub metadata: Option<JsonValue>,
    pub source: Option<String>,
}

/// Outcome of an upsert: the stored row plus whether it was newly created
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub subscriber: SubscriberModel,
    pub created: bool,
}

/// Repository for Subscriber database operations
pub struct SubscriberRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> SubscriberRepository<'a> {
    /// Create a new SubscriberRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a subscriber, or refresh the existing row for this address.
    ///
    /// Repeat signups update metadata, widget and source in place;
    /// `subscribed_at` keeps the first-seen timestamp. A concurrent insert
    /// losing the unique race on (project_id, email) retries as an update.
    pub async fn upsert_subscriber(
        &self,
        request: UpsertSubscriberRequest,
    ) -> Result<UpsertOutcome, ApiError> {
        let email = request.email.trim().to_lowercase();

        if let Some(existing) = self.find_by_email(request.project_id, &email).await? {
            let subscriber = self.refresh_existing(existing, &request).await?;
            return Ok(UpsertOutcome {
                subscriber,
                created: false,
            });
        }

        let now = Utc::now();
        let subscriber = SubscriberActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(request.project_id),
            widget_id: Set(request.widget_id),
            email: Set(email.clone()),
            metadata: Set(request.metadata.clone()),
            source: Set(request.source.clone()),
            subscribed_at: Set(now.into()),
        };

        match subscriber.insert(self.db).await {
            Ok(model) => Ok(UpsertOutcome {
                subscriber: model,
                created: true,
            }),
            Err(err) if is_unique_violation(&err) => {
                // Lost the insert race; the row now exists, so update it
                let existing = self
                    .find_by_email(request.project_id, &email)
                    .await?
                    .ok_or_else(|| {
                        ApiError::from(anyhow::anyhow!(
                            "subscriber vanished after unique violation"
                        ))
                    })?;
                let subscriber = self.refresh_existing(existing, &request).await?;
                Ok(UpsertOutcome {
                    subscriber,
                    created: false,
                })
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn find_by_email(
        &self,
        project_id: Uuid,
        email: &str,
    ) -> Result<Option<SubscriberModel>, ApiError> {
        let subscriber = Subscriber::find()
            .filter(Column::ProjectId.eq(project_id))
            .filter(Column::Email.eq(email))
            .one(self.db)
            .await?;
        Ok(subscriber)
    }

    async fn refresh_existing(
        &self,
        existing: SubscriberModel,
        request: &UpsertSubscriberRequest,
    ) -> Result<SubscriberModel, ApiError> {
        let mut active = existing.into_active_model();
        active.metadata = Set(request.metadata.clone());
        if request.widget_id.is_some() {
            active.widget_id = Set(request.widget_id);
        }
        if request.source.is_some() {
            active.source = Set(request.source.clone());
        }
        // subscribed_at stays at first signup

        let updated = active.update(self.db).await?;
        Ok(updated)
    }

    /// List subscribers for a project with cursor pagination
    ///
    /// # Returns
    /// A vector of Subscriber models ordered by subscribed_at DESC, id DESC
    pub async fn list_subscribers(
        &self,
        project_id: Uuid,
        cursor_data: Option<CursorData>,
        limit: i64,
    ) -> Result<Vec<SubscriberModel>, ApiError> {
        let mut query = Subscriber::find().filter(Column::ProjectId.eq(project_id));

        // Apply cursor pagination
        if let Some(cursor) = cursor_data {
            query = query.filter(
                sea_orm::Condition::any()
                    .add(Column::SubscribedAt.lt(cursor.subscribed_at))
                    .add(
                        sea_orm::Condition::all()
                            .add(Column::SubscribedAt.eq(cursor.subscribed_at))
                            .add(Column::Id.lt(cursor.id)),
                    ),
            );
        }

        // Order by subscribed_at DESC, id DESC for stability
        let subscribers = query
            .order_by_desc(Column::SubscribedAt)
            .order_by_desc(Column::Id)
            .limit(limit as u64)
            .all(self.db)
            .await?;

        Ok(subscribers)
    }
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
        ProjectRepository::new(db)
            .create_project(CreateProjectRequest {
                owner_id: Uuid::new_v4(),
                name: "Subscriber Tests".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    fn signup(project_id: Uuid, email: &str) -> UpsertSubscriberRequest {
        UpsertSubscriberRequest {
            project_id,
            widget_id: None,
            email: email.to_string(),
            metadata: None,
            source: Some("popup".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_then_update_same_address() {
        let db = setup_test_db().await;
        let project_id = seed_project(&db).await;
        let repo = SubscriberRepository::new(&db);

        let first = repo
            .upsert_subscriber(signup(project_id, "User@Example.COM"))
            .await
            .unwrap();
        assert!(first.created);
        assert_eq!(first.subscriber.email, "user@example.com");

        let mut again = signup(project_id, "user@example.com");
        again.metadata = Some(serde_json::json!({"client": {"page": "/pricing"}}));

        let second = repo.upsert_subscriber(again).await.unwrap();
        assert!(!second.created);
        assert_eq!(second.subscriber.id, first.subscriber.id);
        assert_eq!(
            second.subscriber.subscribed_at,
            first.subscriber.subscribed_at
        );
        assert!(second.subscriber.metadata.is_some());
    }

    #[tokio::test]
    async fn test_same_address_different_projects() {
        let db = setup_test_db().await;
        let project_a = seed_project(&db).await;
        let project_b = seed_project(&db).await;
        let repo = SubscriberRepository::new(&db);

        let a = repo
            .upsert_subscriber(signup(project_a, "shared@example.com"))
            .await
            .unwrap();
        let b = repo
            .upsert_subscriber(signup(project_b, "shared@example.com"))
            .await
            .unwrap();

        assert!(a.created);
        assert!(b.created);
        assert_ne!(a.subscriber.id, b.subscriber.id);
    }

    #[tokio::test]
    async fn test_repeat_signup_keeps_source_when_absent() {
        let db = setup_test_db().await;
        let project_id = seed_project(&db).await;
        let repo = SubscriberRepository::new(&db);

        repo.upsert_subscriber(signup(project_id, "keep@example.com"))
            .await
            .unwrap();

        let mut second = signup(project_id, "keep@example.com");
        second.source = None;

        let outcome = repo.upsert_subscriber(second).await.unwrap();
        assert_eq!(outcome.subscriber.source.as_deref(), Some("popup"));
    }

    #[tokio::test]
    async fn test_cursor_listing_pages_newest_first() {
        let db = setup_test_db().await;
        let project_id = seed_project(&db).await;
        let repo = SubscriberRepository::new(&db);

        for i in 0..5 {
            repo.upsert_subscriber(signup(project_id, &format!("user{}@example.com", i)))
                .await
                .unwrap();
        }

        let first_page = repo.list_subscribers(project_id, None, 2).await.unwrap();
        assert_eq!(first_page.len(), 2);

        let last = &first_page[1];
        let cursor = CursorData {
            subscribed_at: last.subscribed_at.into(),
            id: last.id,
        };

        let second_page = repo
            .list_subscribers(project_id, Some(cursor), 10)
            .await
            .unwrap();
        assert_eq!(second_page.len(), 3);

        // No overlap between pages
        for row in &second_page {
            assert!(first_page.iter().all(|p| p.id != row.id));
        }
    }
}
