//! # Widget Artifact Handlers
//!
//! Public, unauthenticated delivery of generated embed artifacts. These
//! routes answer `<script src>` and snippet fetches from arbitrary third
//! party pages, so every outcome, including failures, returns a body that
//! is valid in the artifact's own syntax. A broken embed must degrade to
//! nothing on the host page, never to a syntax error.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use metrics::counter;
use sea_orm::DatabaseConnection;

use crate::artifact::{Artifact, ArtifactKind, inert_comment};
use crate::artifact::{
    html::generate_inline_html, inline::generate_inline_script, popup::generate_popup_script,
};
use crate::error::ApiError;
use crate::models::widget::Model as WidgetModel;
use crate::rate_limit::{RateCategory, RateDecision, client_key};
use crate::repositories::LeadMagnetRepository;
use crate::resolver::resolve_widget;
use crate::richtext::render_document;
use crate::sanitize::{SanitizedWidget, parse_widget_id};
use crate::server::AppState;

/// Legacy embed entry point; also accepts project ids
#[utoipa::path(
    get,
    path = "/widget/{id}/widget.js",
    params(("id" = String, Path, description = "Widget or project UUID (hyphenated)")),
    responses(
        (status = 200, description = "Popup widget script", body = String, content_type = "application/javascript"),
        (status = 400, description = "Malformed id; body is an inert JS comment", body = String, content_type = "application/javascript"),
        (status = 404, description = "Unknown or inactive widget; body is an inert JS comment", body = String, content_type = "application/javascript"),
        (status = 429, description = "Rate limited; body is an inert JS comment", body = String, content_type = "application/javascript")
    ),
    tag = "artifacts"
)]
pub async fn widget_js(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    serve_artifact(&state, &headers, &id, ArtifactKind::PopupScript).await
}

/// Popup widget script, widget-id-first
#[utoipa::path(
    get,
    path = "/widget/{id}/popup.js",
    params(("id" = String, Path, description = "Widget UUID (hyphenated)")),
    responses(
        (status = 200, description = "Popup widget script", body = String, content_type = "application/javascript"),
        (status = 400, description = "Malformed id; body is an inert JS comment", body = String, content_type = "application/javascript"),
        (status = 404, description = "Unknown or inactive widget; body is an inert JS comment", body = String, content_type = "application/javascript"),
        (status = 429, description = "Rate limited; body is an inert JS comment", body = String, content_type = "application/javascript")
    ),
    tag = "artifacts"
)]
pub async fn popup_js(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    serve_artifact(&state, &headers, &id, ArtifactKind::PopupScript).await
}

/// Inline form script
#[utoipa::path(
    get,
    path = "/widget/{id}/inline.js",
    params(("id" = String, Path, description = "Widget UUID (hyphenated)")),
    responses(
        (status = 200, description = "Inline widget script", body = String, content_type = "application/javascript"),
        (status = 400, description = "Malformed id; body is an inert JS comment", body = String, content_type = "application/javascript"),
        (status = 404, description = "Unknown or inactive widget; body is an inert JS comment", body = String, content_type = "application/javascript"),
        (status = 429, description = "Rate limited; body is an inert JS comment", body = String, content_type = "application/javascript")
    ),
    tag = "artifacts"
)]
pub async fn inline_js(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    serve_artifact(&state, &headers, &id, ArtifactKind::InlineScript).await
}

/// Self-contained HTML snippet
#[utoipa::path(
    get,
    path = "/widget/{id}/inline.html",
    params(("id" = String, Path, description = "Widget UUID (hyphenated)")),
    responses(
        (status = 200, description = "Self-contained form snippet", body = String, content_type = "text/html"),
        (status = 400, description = "Malformed id; body is an inert HTML comment", body = String, content_type = "text/html"),
        (status = 404, description = "Unknown or inactive widget; body is an inert HTML comment", body = String, content_type = "text/html"),
        (status = 429, description = "Rate limited; body is an inert HTML comment", body = String, content_type = "text/html")
    ),
    tag = "artifacts"
)]
pub async fn inline_html(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    serve_artifact(&state, &headers, &id, ArtifactKind::InlineHtml).await
}

/// Shared delivery pipeline: validate id, rate limit, resolve through the
/// legacy fallback chain, require active rows, generate, respond.
async fn serve_artifact(
    state: &AppState,
    headers: &HeaderMap,
    raw_id: &str,
    kind: ArtifactKind,
) -> Response {
    let Some(id) = parse_widget_id(raw_id) else {
        counter!("artifact_requests_total", "kind" => kind.source_tag(), "outcome" => "invalid_id")
            .increment(1);
        return inert_response(kind, StatusCode::BAD_REQUEST, "invalid widget id", None);
    };

    let decision = state
        .limiter
        .check(&client_key(headers), RateCategory::Artifact)
        .await;
    if let RateDecision::Limited {
        retry_after_seconds,
    } = decision
    {
        counter!("artifact_requests_total", "kind" => kind.source_tag(), "outcome" => "rate_limited")
            .increment(1);
        return inert_response(
            kind,
            StatusCode::TOO_MANY_REQUESTS,
            "rate limited",
            Some(retry_after_seconds),
        );
    }

    let resolved = match resolve_widget(&state.db, id).await {
        Ok(Some(resolved)) => resolved,
        Ok(None) => {
            counter!("artifact_requests_total", "kind" => kind.source_tag(), "outcome" => "not_found")
                .increment(1);
            return inert_response(kind, StatusCode::NOT_FOUND, "unknown widget", None);
        }
        Err(error) => {
            tracing::error!(?error, widget_id = %id, "artifact resolution failed");
            counter!("artifact_requests_total", "kind" => kind.source_tag(), "outcome" => "error")
                .increment(1);
            return inert_response(
                kind,
                StatusCode::INTERNAL_SERVER_ERROR,
                "temporarily unavailable",
                None,
            );
        }
    };

    // Inactive rows answer exactly like absent ones
    if !resolved.widget.is_active || !resolved.project.is_active {
        counter!("artifact_requests_total", "kind" => kind.source_tag(), "outcome" => "not_found")
            .increment(1);
        return inert_response(kind, StatusCode::NOT_FOUND, "unknown widget", None);
    }

    let lead_magnet_html = match load_lead_magnet_html(&state.db, &resolved.widget).await {
        Ok(html) => html,
        Err(error) => {
            tracing::error!(?error, widget_id = %resolved.widget.id, "lead magnet load failed");
            counter!("artifact_requests_total", "kind" => kind.source_tag(), "outcome" => "error")
                .increment(1);
            return inert_response(
                kind,
                StatusCode::INTERNAL_SERVER_ERROR,
                "temporarily unavailable",
                None,
            );
        }
    };

    let sanitized = SanitizedWidget::from_model(&resolved.widget);
    let base_url = state.config.public_base_url();
    let artifact = match kind {
        ArtifactKind::PopupScript => {
            generate_popup_script(&sanitized, base_url, lead_magnet_html.as_deref())
        }
        ArtifactKind::InlineScript => {
            generate_inline_script(&sanitized, base_url, lead_magnet_html.as_deref())
        }
        ArtifactKind::InlineHtml => {
            generate_inline_html(&sanitized, base_url, lead_magnet_html.as_deref())
        }
    };

    tracing::debug!(
        widget_id = %resolved.widget.id,
        project_id = %resolved.project.id,
        kind = kind.source_tag(),
        bytes = artifact.body.len(),
        "artifact served"
    );
    counter!("artifact_requests_total", "kind" => kind.source_tag(), "outcome" => "ok")
        .increment(1);

    artifact_response(StatusCode::OK, artifact)
}

/// Pre-render an attached, active lead magnet to HTML.
///
/// Absent, inactive, or empty documents all come back as `None`; the
/// artifact then falls back to the plain success message.
async fn load_lead_magnet_html(
    db: &DatabaseConnection,
    widget: &WidgetModel,
) -> Result<Option<String>, ApiError> {
    let Some(magnet_id) = widget.lead_magnet_id else {
        return Ok(None);
    };
    let Some(magnet) = LeadMagnetRepository::new(db).get_lead_magnet(magnet_id).await? else {
        return Ok(None);
    };
    if !magnet.is_active {
        return Ok(None);
    }
    let Some(description) = magnet.description.as_ref() else {
        return Ok(None);
    };
    let html = render_document(description);
    Ok((!html.is_empty()).then_some(html))
}

fn artifact_response(status: StatusCode, artifact: Artifact) -> Response {
    let headers = artifact_headers(artifact.kind, artifact.kind.cache_control(), None);
    (status, headers, artifact.body).into_response()
}

fn inert_response(
    kind: ArtifactKind,
    status: StatusCode,
    note: &str,
    retry_after_seconds: Option<u64>,
) -> Response {
    // Failure bodies must never be cached into a working embed's slot
    let headers = artifact_headers(kind, "no-store", retry_after_seconds);
    (status, headers, inert_comment(kind, note)).into_response()
}

fn artifact_headers(
    kind: ArtifactKind,
    cache_control: &'static str,
    retry_after_seconds: Option<u64>,
) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("content-type", HeaderValue::from_static(kind.content_type()));
    headers.insert("cache-control", HeaderValue::from_static(cache_control));
    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("referrer-policy", HeaderValue::from_static("no-referrer"));
    headers.insert("access-control-allow-origin", HeaderValue::from_static("*"));
    if kind.is_script() {
        // The HTML snippet is meant to be frameable; the scripts are not
        headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    }
    if let Some(seconds) = retry_after_seconds
        && let Ok(value) = HeaderValue::from_str(&seconds.to_string())
    {
        headers.insert("retry-after", value);
    }
    headers
}
