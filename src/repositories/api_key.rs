//! # API Key Repository
//!
//! This module contains the repository implementation for ApiKey entities.
//! Only the SHA-256 hash of a key is stored; the raw secret exists in one
//! response at mint time and never again.

use crate::error::ApiError;
use crate::keys::{generate_api_key, verify_api_key};
use crate::models::api_key::{
    ActiveModel as ApiKeyActiveModel, Column, Entity as ApiKey, Model as ApiKeyModel,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

/// Repository for ApiKey database operations
pub struct ApiKeyRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ApiKeyRepository<'a> {
    /// Create a new ApiKeyRepository with the given database connection
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Mint a key for a project. Returns the stored row and the raw secret.
    pub async fn create_api_key(
        &self,
        project_id: Uuid,
        label: Option<String>,
    ) -> Result<(ApiKeyModel, String), ApiError> {
        let generated = generate_api_key();
        let now = Utc::now();

        let api_key = ApiKeyActiveModel {
            id: Set(Uuid::new_v4()),
            project_id: Set(project_id),
            key_hash: Set(generated.hash.clone()),
            key_prefix: Set(generated.prefix.clone()),
            label: Set(label),
            last_used_at: Set(None),
            created_at: Set(now.into()),
        };

        let model = api_key.insert(self.db).await?;
        Ok((model, generated.plaintext))
    }

    /// List a project's keys, newest first. Hashes stay in the model; the
    /// handler response exposes prefix and label only.
    pub async fn list_api_keys(&self, project_id: Uuid) -> Result<Vec<ApiKeyModel>, ApiError> {
        let keys = ApiKey::find()
            .filter(Column::ProjectId.eq(project_id))
            .order_by_desc(Column::CreatedAt)
            .all(self.db)
            .await?;
        Ok(keys)
    }

    /// Check a presented key against every key of the project.
    ///
    /// All stored hashes are compared in constant time rather than looked
    /// up by hash, so match and mismatch cost the same.
    pub async fn verify_key_for_project(
        &self,
        project_id: Uuid,
        presented: &str,
    ) -> Result<Option<ApiKeyModel>, ApiError> {
        let keys = self.list_api_keys(project_id).await?;

        let mut matched: Option<ApiKeyModel> = None;
        for key in keys {
            if verify_api_key(presented, &key.key_hash) && matched.is_none() {
                matched = Some(key);
            }
        }

        Ok(matched)
    }

    /// Record that a key authenticated a request
    pub async fn touch_last_used(&self, key: ApiKeyModel) -> Result<(), ApiError> {
        let mut active = key.into_active_model();
        active.last_used_at = Set(Some(Utc::now().into()));
        active.update(self.db).await?;
        Ok(())
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
                name: "Key Tests".to_string(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_mint_stores_hash_not_secret() {
        let db = setup_test_db().await;
        let project_id = seed_project(&db).await;
        let repo = ApiKeyRepository::new(&db);

        let (model, plaintext) = repo
            .create_api_key(project_id, Some("ci".to_string()))
            .await
            .unwrap();

        assert_eq!(plaintext.len(), 48);
        assert_eq!(model.key_prefix, plaintext[..8].to_string());
        assert_ne!(model.key_hash, plaintext);
        assert_eq!(model.label.as_deref(), Some("ci"));
        assert!(model.last_used_at.is_none());
    }

    #[tokio::test]
    async fn test_verify_accepts_minted_key_only() {
        let db = setup_test_db().await;
        let project_id = seed_project(&db).await;
        let other_project = seed_project(&db).await;
        let repo = ApiKeyRepository::new(&db);

        let (_, plaintext) = repo.create_api_key(project_id, None).await.unwrap();

        let matched = repo
            .verify_key_for_project(project_id, &plaintext)
            .await
            .unwrap();
        assert!(matched.is_some());

        let wrong_key = repo
            .verify_key_for_project(project_id, "not-the-real-key")
            .await
            .unwrap();
        assert!(wrong_key.is_none());

        // A valid key does not unlock a different project
        let wrong_project = repo
            .verify_key_for_project(other_project, &plaintext)
            .await
            .unwrap();
        assert!(wrong_project.is_none());
    }

    #[tokio::test]
    async fn test_touch_last_used() {
        let db = setup_test_db().await;
        let project_id = seed_project(&db).await;
        let repo = ApiKeyRepository::new(&db);

        let (model, _) = repo.create_api_key(project_id, None).await.unwrap();
        repo.touch_last_used(model.clone()).await.unwrap();

        let listed = repo.list_api_keys(project_id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].last_used_at.is_some());
    }
}
