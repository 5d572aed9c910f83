//! # Projects API Handlers
//!
//! This module contains handlers for project creation, retrieval, and the
//! dashboard subscriber listing. All routes are operator-authenticated and
//! owner-scoped; a project belonging to another owner answers 404.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::{OperatorAuth, OwnerExtension, OwnerHeader};
use crate::cursor::{decode_cursor, encode_cursor};
use crate::error::{ApiError, not_found};
use crate::handlers::types::{ApiResponse, PaginatedResponse};
use crate::models::project::Model as ProjectModel;
use crate::models::subscriber::Model as SubscriberModel;
use crate::repositories::{CreateProjectRequest, ProjectRepository, SubscriberRepository};
use crate::server::AppState;

/// Request payload for creating a new project
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CreateProjectRequestDto {
    /// Display name for the project (required, max 255 characters)
    #[schema(example = "Marketing site")]
    pub name: String,
}

/// Response payload describing a project
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProjectResponseDto {
    /// Unique identifier for the project (UUID)
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: String,
    /// Identifier of the owning account (UUID)
    pub owner_id: String,
    /// Display name of the project
    #[schema(example = "Marketing site")]
    pub name: String,
    /// Whether the project serves artifacts and accepts subscriptions
    pub is_active: bool,
    /// Timestamp when the project was created (ISO 8601)
    pub created_at: String,
    /// Timestamp when the project was last updated (ISO 8601)
    pub updated_at: String,
}

impl From<ProjectModel> for ProjectResponseDto {
    fn from(project: ProjectModel) -> Self {
        Self {
            id: project.id.to_string(),
            owner_id: project.owner_id.to_string(),
            name: project.name,
            is_active: project.is_active,
            created_at: project.created_at.to_rfc3339(),
            updated_at: project.updated_at.to_rfc3339(),
        }
    }
}

/// One subscriber row in the dashboard listing
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SubscriberDto {
    /// Unique identifier for the subscriber (UUID)
    pub id: String,
    /// Stored (lower-cased) email address
    pub email: String,
    /// Widget that captured the most recent signup, if known
    pub widget_id: Option<String>,
    /// Embed variant that produced the signup
    #[schema(example = "popup")]
    pub source: Option<String>,
    /// Stored metadata with separate client/server halves
    pub metadata: Option<serde_json::Value>,
    /// Timestamp of the first signup (ISO 8601)
    pub subscribed_at: String,
}

impl From<SubscriberModel> for SubscriberDto {
    fn from(subscriber: SubscriberModel) -> Self {
        Self {
            id: subscriber.id.to_string(),
            email: subscriber.email,
            widget_id: subscriber.widget_id.map(|id| id.to_string()),
            source: subscriber.source,
            metadata: subscriber.metadata,
            subscribed_at: subscriber.subscribed_at.to_rfc3339(),
        }
    }
}

/// Query parameters for the subscriber listing
#[derive(Debug, Deserialize, IntoParams)]
pub struct SubscribersQuery {
    /// Opaque cursor from a previous page
    pub cursor: Option<String>,
    /// Page size (1-100, default 50)
    pub limit: Option<i64>,
}

/// Create a new project
#[utoipa::path(
    post,
    path = "/api/v1/projects",
    security(("bearer_auth" = [])),
    params(OwnerHeader),
    request_body = CreateProjectRequestDto,
    responses(
        (status = 201, description = "Project created successfully", body = ApiResponse<ProjectResponseDto>, headers(
            ("Location", description = "URL of the created project"),
            ("X-Trace-Id", description = "Trace identifier for request correlation")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError)
    ),
    tag = "projects"
)]
pub async fn create_project(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    OwnerExtension(owner): OwnerExtension,
    Json(request): Json<CreateProjectRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 1],
        Json<ApiResponse<ProjectResponseDto>>,
    ),
    ApiError,
> {
    let repo = ProjectRepository::new(&state.db);
    let project = repo
        .create_project(CreateProjectRequest {
            owner_id: owner.0,
            name: request.name,
        })
        .await?;

    tracing::info!(project_id = %project.id, owner_id = %owner.0, "project created");

    let location = format!("/api/v1/projects/{}", project.id);
    Ok((
        StatusCode::CREATED,
        [("Location", location)],
        Json(ApiResponse::new(project.into())),
    ))
}

/// Get a project by ID
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Project UUID"),
        OwnerHeader
    ),
    responses(
        (status = 200, description = "Project retrieved successfully", body = ApiResponse<ProjectResponseDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Project not found for this owner", body = ApiError)
    ),
    tag = "projects"
)]
pub async fn get_project(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    OwnerExtension(owner): OwnerExtension,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProjectResponseDto>>, ApiError> {
    let repo = ProjectRepository::new(&state.db);
    let project = repo
        .get_project_for_owner(project_id, owner.0)
        .await?
        .ok_or_else(|| not_found(Some("Project not found")))?;

    Ok(Json(ApiResponse::new(project.into())))
}

/// List subscribers for a project, newest first
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/subscribers",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Project UUID"),
        SubscribersQuery,
        OwnerHeader
    ),
    responses(
        (status = 200, description = "Subscriber page retrieved", body = PaginatedResponse<SubscriberDto>),
        (status = 400, description = "Malformed cursor", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Project not found for this owner", body = ApiError)
    ),
    tag = "projects"
)]
pub async fn list_subscribers(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    OwnerExtension(owner): OwnerExtension,
    Path(project_id): Path<Uuid>,
    Query(query): Query<SubscribersQuery>,
) -> Result<Json<PaginatedResponse<SubscriberDto>>, ApiError> {
    let projects = ProjectRepository::new(&state.db);
    projects
        .get_project_for_owner(project_id, owner.0)
        .await?
        .ok_or_else(|| not_found(Some("Project not found")))?;

    let cursor_data = match query.cursor.as_deref() {
        Some(raw) => Some(decode_cursor(raw)?),
        None => None,
    };
    let limit = query.limit.unwrap_or(50).clamp(1, 100);

    let subscribers = SubscriberRepository::new(&state.db)
        .list_subscribers(project_id, cursor_data, limit)
        .await?;

    let next_cursor = if subscribers.len() == limit as usize {
        subscribers.last().map(|last| {
            let subscribed_at: chrono::DateTime<chrono::Utc> = last.subscribed_at.into();
            encode_cursor(&subscribed_at, &last.id)
        })
    } else {
        None
    };

    let page = subscribers.into_iter().map(SubscriberDto::from).collect();
    Ok(Json(PaginatedResponse::new(page, next_cursor)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::repositories::{SubscriberRepository, UpsertSubscriberRequest};
    use axum::{
        body::Body,
        http::{Method, Request, StatusCode},
    };
    use migration::MigratorTrait;
    use sea_orm::Database;
    use serde_json::json;
    use tower::ServiceExt;

    const OWNER: &str = "550e8400-e29b-41d4-a716-446655440000";

    async fn setup_app() -> (crate::server::AppState, axum::Router) {
        let config = AppConfig {
            operator_tokens: vec!["test-token".to_string()],
            ..Default::default()
        };
        let db = Database::connect("sqlite::memory:").await.unwrap();
        migration::Migrator::up(&db, None).await.unwrap();
        let state = crate::server::create_test_app_state(config, db);
        let app = crate::server::create_app(state.clone());
        (state, app)
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

    async fn create_project_via_api(app: &axum::Router, name: &str) -> Uuid {
        let request = authed(Request::builder().method(Method::POST).uri("/api/v1/projects"))
            .body(Body::from(json!({"name": name}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = json_body(response).await;
        body["data"]["id"].as_str().unwrap().parse().unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get_project() {
        let (_, app) = setup_app().await;

        let request = authed(Request::builder().method(Method::POST).uri("/api/v1/projects"))
            .body(Body::from(json!({"name": "Docs site"}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let location = response
            .headers()
            .get("Location")
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        let body = json_body(response).await;
        assert_eq!(body["data"]["name"], "Docs site");
        assert_eq!(body["data"]["owner_id"], OWNER);
        assert_eq!(body["data"]["is_active"], true);
        assert!(!body["meta"]["request_id"].as_str().unwrap().is_empty());

        let request = authed(Request::builder().method(Method::GET).uri(&location))
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"]["name"], "Docs site");
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let (_, app) = setup_app().await;

        let request = authed(Request::builder().method(Method::POST).uri("/api/v1/projects"))
            .body(Body::from(json!({"name": "   "}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["code"], "VALIDATION_FAILED");
    }

    #[tokio::test]
    async fn test_foreign_owner_sees_404() {
        let (_, app) = setup_app().await;
        let project_id = create_project_via_api(&app, "Mine").await;

        let request = Request::builder()
            .method(Method::GET)
            .uri(format!("/api/v1/projects/{project_id}"))
            .header("Authorization", "Bearer test-token")
            .header("X-Owner-Id", Uuid::new_v4().to_string())
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_subscriber_listing_pages_without_overlap() {
        let (state, app) = setup_app().await;
        let project_id = create_project_via_api(&app, "Paging").await;

        let repo = SubscriberRepository::new(&state.db);
        for n in 0..5 {
            repo.upsert_subscriber(UpsertSubscriberRequest {
                project_id,
                widget_id: None,
                email: format!("s{n}@example.com"),
                metadata: None,
                source: Some("popup".to_string()),
            })
            .await
            .unwrap();
        }

        let request = authed(
            Request::builder()
                .method(Method::GET)
                .uri(format!("/api/v1/projects/{project_id}/subscribers?limit=3")),
        )
        .body(Body::empty())
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
        assert_eq!(body["has_more"], true);
        let cursor = body["next_cursor"].as_str().unwrap().to_string();
        let first_page: Vec<String> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["email"].as_str().unwrap().to_string())
            .collect();

        let request = authed(Request::builder().method(Method::GET).uri(format!(
            "/api/v1/projects/{project_id}/subscribers?limit=3&cursor={cursor}"
        )))
        .body(Body::empty())
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let body = json_body(response).await;
        let second_page: Vec<String> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["email"].as_str().unwrap().to_string())
            .collect();

        assert_eq!(second_page.len(), 2);
        for email in &second_page {
            assert!(!first_page.contains(email), "{email} appeared twice");
        }
    }

    #[tokio::test]
    async fn test_malformed_cursor_rejected() {
        let (_, app) = setup_app().await;
        let project_id = create_project_via_api(&app, "Cursors").await;

        let request = authed(Request::builder().method(Method::GET).uri(format!(
            "/api/v1/projects/{project_id}/subscribers?cursor=!!!not-base64!!!"
        )))
        .body(Body::empty())
        .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_management_requires_bearer() {
        let (_, app) = setup_app().await;

        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/v1/projects")
            .header("X-Owner-Id", OWNER)
            .header("Content-Type", "application/json")
            .body(Body::from(json!({"name": "x"}).to_string()))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
