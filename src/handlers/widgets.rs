//! # Widgets API Handlers
//!
//! This module contains handlers for widget creation and lifecycle
//! management, including the per-widget lead magnet. Widget routes are
//! addressed by widget id alone, so every handler re-derives the owning
//! project and checks it against the acting owner before touching anything.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{OperatorAuth, OwnerExtension, OwnerHeader};
use crate::error::{ApiError, not_found};
use crate::handlers::types::ApiResponse;
use crate::models::lead_magnet::Model as LeadMagnetModel;
use crate::models::widget::Model as WidgetModel;
use crate::repositories::{
    CreateWidgetRequest, LeadMagnetRepository, ProjectRepository, UpdateWidgetRequest,
    UpsertLeadMagnetRequest, WidgetRepository,
};
use crate::server::AppState;

/// Request payload for creating a widget
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct CreateWidgetRequestDto {
    /// Internal name shown in the dashboard (required)
    #[schema(example = "Homepage popup")]
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

/// Request payload for a partial widget update; absent fields stay untouched
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateWidgetRequestDto {
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
    /// `true` promotes this widget to project default, demoting the current one
    pub make_default: Option<bool>,
}

/// Response payload describing a widget
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct WidgetResponseDto {
    /// Unique identifier for the widget (UUID)
    pub id: String,
    /// Project this widget belongs to (UUID)
    pub project_id: String,
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
    /// Attached lead magnet, if any (UUID)
    pub lead_magnet_id: Option<String>,
    /// Whether this widget answers legacy project-id embed URLs
    pub is_default: bool,
    /// Inactive widgets serve inert artifacts
    pub is_active: bool,
    /// Timestamp when the widget was created (ISO 8601)
    pub created_at: String,
    /// Timestamp when the widget was last updated (ISO 8601)
    pub updated_at: String,
}

impl From<WidgetModel> for WidgetResponseDto {
    fn from(widget: WidgetModel) -> Self {
        Self {
            id: widget.id.to_string(),
            project_id: widget.project_id.to_string(),
            name: widget.name,
            title: widget.title,
            description: widget.description,
            button_text: widget.button_text,
            success_message: widget.success_message,
            placeholder: widget.placeholder,
            primary_color: widget.primary_color,
            background_color: widget.background_color,
            text_color: widget.text_color,
            border_radius: widget.border_radius,
            position: widget.position,
            trigger_type: widget.trigger_type,
            trigger_value: widget.trigger_value,
            layout: widget.layout,
            lead_magnet_id: widget.lead_magnet_id.map(|id| id.to_string()),
            is_default: widget.is_default,
            is_active: widget.is_active,
            created_at: widget.created_at.to_rfc3339(),
            updated_at: widget.updated_at.to_rfc3339(),
        }
    }
}

/// Request payload for creating or replacing a widget's lead magnet
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeadMagnetRequestDto {
    /// Rich-text document tree revealed after signup
    pub description: Option<serde_json::Value>,
    /// Short teaser shown before signup
    pub preview_text: Option<String>,
    /// Inactive lead magnets are skipped at artifact generation time
    pub is_active: Option<bool>,
}

/// Response payload describing a lead magnet
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LeadMagnetResponseDto {
    /// Unique identifier for the lead magnet (UUID)
    pub id: String,
    /// Rich-text document tree revealed after signup
    pub description: Option<serde_json::Value>,
    /// Short teaser shown before signup
    pub preview_text: Option<String>,
    /// Whether the lead magnet participates in artifact generation
    pub is_active: bool,
    /// Timestamp when the lead magnet was created (ISO 8601)
    pub created_at: String,
    /// Timestamp when the lead magnet was last updated (ISO 8601)
    pub updated_at: String,
}

impl From<LeadMagnetModel> for LeadMagnetResponseDto {
    fn from(magnet: LeadMagnetModel) -> Self {
        Self {
            id: magnet.id.to_string(),
            description: magnet.description,
            preview_text: magnet.preview_text,
            is_active: magnet.is_active,
            created_at: magnet.created_at.to_rfc3339(),
            updated_at: magnet.updated_at.to_rfc3339(),
        }
    }
}

/// Load a widget and verify its project belongs to the acting owner.
///
/// Both an unknown widget and a foreign one answer the same 404 so the
/// route does not leak which ids exist.
async fn widget_for_owner(
    db: &DatabaseConnection,
    widget_id: Uuid,
    owner_id: Uuid,
) -> Result<WidgetModel, ApiError> {
    let widget = WidgetRepository::new(db)
        .get_widget(widget_id)
        .await?
        .ok_or_else(|| not_found(Some("Widget not found")))?;
    ProjectRepository::new(db)
        .get_project_for_owner(widget.project_id, owner_id)
        .await?
        .ok_or_else(|| not_found(Some("Widget not found")))?;
    Ok(widget)
}

/// Create a widget in a project
#[utoipa::path(
    post,
    path = "/api/v1/projects/{id}/widgets",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Project UUID"),
        OwnerHeader
    ),
    request_body = CreateWidgetRequestDto,
    responses(
        (status = 201, description = "Widget created; the project's first widget becomes its default", body = ApiResponse<WidgetResponseDto>, headers(
            ("Location", description = "URL of the created widget")
        )),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Project not found for this owner", body = ApiError)
    ),
    tag = "widgets"
)]
pub async fn create_widget(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    OwnerExtension(owner): OwnerExtension,
    Path(project_id): Path<Uuid>,
    Json(request): Json<CreateWidgetRequestDto>,
) -> Result<
    (
        StatusCode,
        [(&'static str, String); 1],
        Json<ApiResponse<WidgetResponseDto>>,
    ),
    ApiError,
> {
    ProjectRepository::new(&state.db)
        .get_project_for_owner(project_id, owner.0)
        .await?
        .ok_or_else(|| not_found(Some("Project not found")))?;

    let widget = WidgetRepository::new(&state.db)
        .create_widget(
            project_id,
            CreateWidgetRequest {
                name: request.name,
                title: request.title,
                description: request.description,
                button_text: request.button_text,
                success_message: request.success_message,
                placeholder: request.placeholder,
                primary_color: request.primary_color,
                background_color: request.background_color,
                text_color: request.text_color,
                border_radius: request.border_radius,
                position: request.position,
                trigger_type: request.trigger_type,
                trigger_value: request.trigger_value,
                layout: request.layout,
            },
        )
        .await?;

    tracing::info!(widget_id = %widget.id, project_id = %project_id, "widget created");

    let location = format!("/api/v1/widgets/{}", widget.id);
    Ok((
        StatusCode::CREATED,
        [("Location", location)],
        Json(ApiResponse::new(widget.into())),
    ))
}

/// List a project's widgets, oldest first
#[utoipa::path(
    get,
    path = "/api/v1/projects/{id}/widgets",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Project UUID"),
        OwnerHeader
    ),
    responses(
        (status = 200, description = "Widgets retrieved", body = ApiResponse<Vec<WidgetResponseDto>>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Project not found for this owner", body = ApiError)
    ),
    tag = "widgets"
)]
pub async fn list_widgets(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    OwnerExtension(owner): OwnerExtension,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<WidgetResponseDto>>>, ApiError> {
    ProjectRepository::new(&state.db)
        .get_project_for_owner(project_id, owner.0)
        .await?
        .ok_or_else(|| not_found(Some("Project not found")))?;

    let widgets = WidgetRepository::new(&state.db)
        .list_widgets(project_id)
        .await?
        .into_iter()
        .map(WidgetResponseDto::from)
        .collect();

    Ok(Json(ApiResponse::new(widgets)))
}

/// Update a widget's configuration
#[utoipa::path(
    patch,
    path = "/api/v1/widgets/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Widget UUID"),
        OwnerHeader
    ),
    request_body = UpdateWidgetRequestDto,
    responses(
        (status = 200, description = "Widget updated", body = ApiResponse<WidgetResponseDto>),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Widget not found for this owner", body = ApiError)
    ),
    tag = "widgets"
)]
pub async fn update_widget(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    OwnerExtension(owner): OwnerExtension,
    Path(widget_id): Path<Uuid>,
    Json(request): Json<UpdateWidgetRequestDto>,
) -> Result<Json<ApiResponse<WidgetResponseDto>>, ApiError> {
    widget_for_owner(&state.db, widget_id, owner.0).await?;

    let widget = WidgetRepository::new(&state.db)
        .update_widget(
            widget_id,
            UpdateWidgetRequest {
                name: request.name,
                title: request.title,
                description: request.description,
                button_text: request.button_text,
                success_message: request.success_message,
                placeholder: request.placeholder,
                primary_color: request.primary_color,
                background_color: request.background_color,
                text_color: request.text_color,
                border_radius: request.border_radius,
                position: request.position,
                trigger_type: request.trigger_type,
                trigger_value: request.trigger_value,
                layout: request.layout,
                is_active: request.is_active,
                make_default: request.make_default,
            },
        )
        .await?;

    Ok(Json(ApiResponse::new(widget.into())))
}

/// Delete a widget
#[utoipa::path(
    delete,
    path = "/api/v1/widgets/{id}",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Widget UUID"),
        OwnerHeader
    ),
    responses(
        (status = 204, description = "Widget deleted; a deleted default promotes the oldest survivor"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Widget not found for this owner", body = ApiError),
        (status = 409, description = "A project must keep at least one widget", body = ApiError)
    ),
    tag = "widgets"
)]
pub async fn delete_widget(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    OwnerExtension(owner): OwnerExtension,
    Path(widget_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    widget_for_owner(&state.db, widget_id, owner.0).await?;

    WidgetRepository::new(&state.db).delete_widget(widget_id).await?;
    tracing::info!(widget_id = %widget_id, "widget deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Create or replace the widget's lead magnet
#[utoipa::path(
    put,
    path = "/api/v1/widgets/{id}/lead-magnet",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Widget UUID"),
        OwnerHeader
    ),
    request_body = LeadMagnetRequestDto,
    responses(
        (status = 200, description = "Lead magnet stored and attached", body = ApiResponse<LeadMagnetResponseDto>),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Widget not found for this owner", body = ApiError)
    ),
    tag = "widgets"
)]
pub async fn put_lead_magnet(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    OwnerExtension(owner): OwnerExtension,
    Path(widget_id): Path<Uuid>,
    Json(request): Json<LeadMagnetRequestDto>,
) -> Result<Json<ApiResponse<LeadMagnetResponseDto>>, ApiError> {
    let widget = widget_for_owner(&state.db, widget_id, owner.0).await?;

    let magnet = LeadMagnetRepository::new(&state.db)
        .upsert_for_widget(
            widget,
            UpsertLeadMagnetRequest {
                description: request.description,
                preview_text: request.preview_text,
                is_active: request.is_active.unwrap_or(true),
            },
        )
        .await?;

    Ok(Json(ApiResponse::new(magnet.into())))
}

/// Detach and delete the widget's lead magnet
#[utoipa::path(
    delete,
    path = "/api/v1/widgets/{id}/lead-magnet",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Widget UUID"),
        OwnerHeader
    ),
    responses(
        (status = 204, description = "Lead magnet removed"),
        (status = 401, description = "Missing or invalid bearer token", body = ApiError),
        (status = 404, description = "Widget or lead magnet not found", body = ApiError)
    ),
    tag = "widgets"
)]
pub async fn delete_lead_magnet(
    State(state): State<AppState>,
    _operator_auth: OperatorAuth,
    OwnerExtension(owner): OwnerExtension,
    Path(widget_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let widget = widget_for_owner(&state.db, widget_id, owner.0).await?;

    LeadMagnetRepository::new(&state.db).detach_and_delete(widget).await?;

    Ok(StatusCode::NO_CONTENT)
}
