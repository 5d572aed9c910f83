//! # API Keys Handlers
//!
//! Minting and listing of per-project subscribe keys. The raw secret is
//! returned exactly once, in the mint response; every later listing shows
//! the prefix and usage metadata only.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{OperatorAuth, OwnerExtension, OwnerHeader};
use crate::error::{ApiError, not_found};
use crate::handlers::types::ApiResponse;
use crate::models::api_key::Model as ApiKeyModel;
use crate::repositories::{ApiKeyRepository, ProjectRepository};
use crate::server::AppState;

/// Request payload for minting an API key
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateApiKeyRequestDto {
    /// Free-form label for telling keys apart
    #[schema(example = "production site")]
    pub label: Option<String>,
}

/// Response payload for a freshly minted key. The `key` field is the raw
/// secret and is never retrievable again.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MintedApiKeyDto {
    /// Unique identifier for the key (UUID)
    pub id: String,
    /// The raw secret, shown only in this response
    pub key: String,
    /// First characters of the secret, safe to display later
    pub key_prefix: String,
    /// Free-form label for telling keys apart
    pub label: Option<String>,
    /// Timestamp when the key was minted (ISO 8601)
    pub created_at: String,
}

/// Response payload describing an existing key without its secret
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiKeyResponseDto {
    /// Unique identifier for the key (UUID)
    pub id: String,
    /// First characters of the secret, safe to display
    pub key_prefix: String,
    /// Free-form label for telling keys apart
    pub label: Option<String>,
    /// Timestamp of the last subscribe request this key authenticated (ISO 8601)
    pub last_used_at: Option<String>,
    /// Timestamp when the key was minted (ISO 8601)
    pub created_at: String,
}

impl From<ApiKeyModel> for ApiKeyResponseDto {
    fn from(key: ApiKeyModel) -> Self {
        Self {
            id: key.id.to_string(),
            key_prefix: key.key_prefix,
            label: key.label,
            last_used_at: key.last_used_at.map(|at| at.to_rfc3339()),
            created_at: key.created_at.to_rfc3339(),
        }
    }
}

/// Mint an API key for a project
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/api-keys",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Project UUID"),
        OwnerHeader
    ),
    request_body = CreateApiKeyRequestDto,
    responses(
        (status = 201, description = "Key minted; the raw secret appears only in this response", body = ApiResponse<MintedApiKeyDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Project not found for this owner", body = ApiError)
    ),
    tag = "api-keys"
)]
pub async fn create_api_key(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    OwnerExtension(owner): OwnerExtension,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateApiKeyRequestDto>,
) -> Result<(StatusCode, Json<ApiResponse<MintedApiKeyDto>>), ApiError> {
    ProjectRepository::new(&state.db)
        .get_project_for_owner(project_id, owner.0)
        .await?
        .ok_or_else(|| not_found(Some("Project not found")))?;

    let (model, plaintext) = ApiKeyRepository::new(&state.db)
        .create_api_key(project_id, request.label)
        .await?;

    tracing::info!(
        key_id = %model.id,
        project_id = %project_id,
        key_prefix = %model.key_prefix,
        "api key minted"
    );

    let minted = MintedApiKeyDto {
        id: model.id.to_string(),
        key: plaintext,
        key_prefix: model.key_prefix,
        label: model.label,
        created_at: model.created_at.to_rfc3339(),
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::new(minted))))
}

/// List a project's API keys, newest first
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/api-keys",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Project UUID"),
        OwnerHeader
    ),
    responses(
        (status = 200, description = "Keys retrieved, secrets omitted", body = ApiResponse<Vec<ApiKeyResponseDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Project not found for this owner", body = ApiError)
    ),
    tag = "api-keys"
)]
pub async fn list_api_keys(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    OwnerExtension(owner): OwnerExtension,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ApiKeyResponseDto>>>, ApiError> {
    ProjectRepository::new(&state.db)
        .get_project_for_owner(project_id, owner.0)
        .await?
        .ok_or_else(|| not_found(Some("Project not found")))?;

    let keys = ApiKeyRepository::new(&state.db)
        .list_api_keys(project_id)
        .await?
        .into_iter()
        .map(ApiKeyResponseDto::from)
        .collect();

    Ok(Json(ApiResponse::new(keys)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use migration::MigratorTrait;
    use sea_orm::Database;
    use serde_json::json;
    use tower::ServiceExt;

    const OWNER: &str = "550e8400-e29b-41d4-a716-446655440000";

    async fn setup_app() -> axum::Router {
        let config = AppConfig {
            operator_tokens: vec!["test-token".to_string()],
            ..Default::default()
        };
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let state = crate::server::create_test_app_state(config, db);
        crate::server::create_app(state)
    }

    fn authed(builder: axum::http::request::Builder) -> axum::http::request::Builder {
        builder
            .header("Authorization", "Bearer test-token")
            .header("X-Owner-Id", OWNER)
            .header("Content-Type", "application/json")
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn create_project(app: &axum::Router) -> Uuid {
        let request = authed(Request::builder().method(Method::POST).uri("/api/v1/projects"))
            .body(Body::from(json!({"name": "Key tests"}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_mint_returns_secret_once() {
        let app = setup_app().await;
        let project_id = create_project(&app).await;

        let request = authed(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/api/v1/projects/{project_id}/api-keys")),
        )
        .body(Body::from(json!({"label": "ci"}).to_string()))
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        let secret = body["data"]["key"].as_str().unwrap().to_string();
        assert_eq!(secret.len(), 48);
        assert_eq!(body["data"]["key_prefix"], secret[..8]);
        assert_eq!(body["data"]["label"], "ci");

        // The listing exposes the prefix but never the secret
        let request = authed(
            Request::builder()
                .method(Method::GET)
                .uri(format!("/api/v1/projects/{project_id}/api-keys")),
        )
        .body(Body::empty())
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        let keys = body["data"].as_array().unwrap();
        assert_eq!(keys.len(), 1);
        assert_eq!(keys[0]["key_prefix"], secret[..8]);
        assert!(keys[0].get("key").is_none());
        assert!(keys[0]["last_used_at"].is_null());
    }

    #[tokio::test]
    async fn test_listing_is_newest_first() {
        let app = setup_app().await;
        let project_id = create_project(&app).await;

        for label in ["first", "second"] {
            let request = authed(
                Request::builder()
                    .method(Method::POST)
                    .uri(format!("/api/v1/projects/{project_id}/api-keys")),
            )
            .body(Body::from(json!({"label": label}).to_string()))
            .unwrap();
            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::CREATED);
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }

        let request = authed(
            Request::builder()
                .method(Method::GET)
                .uri(format!("/api/v1/projects/{project_id}/api-keys")),
        )
        .body(Body::empty())
        .unwrap();
        let body = json_body(app.clone().oneshot(request).await.unwrap()).await;
        let keys = body["data"].as_array().unwrap();
        assert_eq!(keys.len(), 2);
        assert_eq!(keys[0]["label"], "second");
        assert_eq!(keys[1]["label"], "first");
    }

    #[tokio::test]
    async fn test_foreign_owner_cannot_mint() {
        let app = setup_app().await;
        let project_id = create_project(&app).await;

        let request = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/v1/projects/{project_id}/api-keys"))
            .header("Authorization", "Bearer test-token")
            .header("X-Owner-Id", Uuid::new_v4().to_string())
            .header("Content-Type", "application/json")
            .body(Body::from(json!({}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
