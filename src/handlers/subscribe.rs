//! # Subscribe Handler
//!
//! Public endpoint receiving email submissions from generated widgets.
//! Unlike the artifact routes this one speaks JSON both ways; the generated
//! client code surfaces the `message` field of error bodies verbatim.

use std::sync::OnceLock;

use axum::{
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode, header},
    response::Json,
};
use metrics::counter;
use regex::Regex;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ApiError, forbidden, not_found, rate_limited, unauthorized, validation_error};
use crate::rate_limit::{RateCategory, RateDecision, client_key};
use crate::repositories::{
    ApiKeyRepository, ProjectRepository, SubscriberRepository, UpsertSubscriberRequest,
    WidgetRepository,
};
use crate::server::AppState;
use crate::user_agent::parse_user_agent;

/// Request payload sent by the generated widget code
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeRequestDto {
    /// Email address to subscribe
    #[schema(example = "reader@example.com")]
    pub email: String,
    /// Project receiving the subscription
    pub project_id: Uuid,
    /// Widget that captured the signup, when known
    #[serde(default)]
    pub widget_id: Option<Uuid>,
    /// Client-collected context (page URL, referrer, geo fields)
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
}

/// Response payload for a processed subscription
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubscribeResponseDto {
    /// User-facing confirmation message
    #[schema(example = "Thanks for subscribing!")]
    pub message: String,
    /// Identifier of the stored subscriber row
    pub subscriber_id: Uuid,
    /// Whether this address was already subscribed to the project
    pub already_subscribed: bool,
}

fn email_shape() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    // Shape check only; deliverability is the tenant's problem
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn validate_email(raw: &str) -> Result<(), ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > 320 || !email_shape().is_match(trimmed) {
        return Err(validation_error(
            "Invalid email address",
            serde_json::json!({ "email": "must be a valid email address" }),
        ));
    }
    Ok(())
}

/// Process a subscription from an embedded widget
#[utoipa::path(
    post,
    path = "/api/v1/subscribe",
    request_body = SubscribeRequestDto,
    responses(
        (status = 201, description = "New subscriber stored", body = SubscribeResponseDto),
        (status = 200, description = "Existing subscriber refreshed", body = SubscribeResponseDto),
        (status = 400, description = "Malformed body or email", body = ApiError),
        (status = 401, description = "Invalid API key", body = ApiError),
        (status = 403, description = "Project not accepting subscriptions", body = ApiError),
        (status = 404, description = "Unknown project", body = ApiError),
        (status = 429, description = "Rate limited", body = ApiError)
    ),
    tag = "subscribe"
)]
pub async fn subscribe(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<SubscribeRequestDto>, JsonRejection>,
) -> Result<(StatusCode, Json<SubscribeResponseDto>), ApiError> {
    // Rate limiting comes before body handling so abusive traffic cannot
    // use validation as an oracle
    let decision = state
        .limiter
        .check(&client_key(&headers), RateCategory::Subscribe)
        .await;
    if let RateDecision::Limited {
        retry_after_seconds,
    } = decision
    {
        counter!("subscribe_requests_total", "outcome" => "rate_limited").increment(1);
        return Err(rate_limited(retry_after_seconds));
    }

    let Json(request) = body?;
    validate_email(&request.email)?;

    let projects = ProjectRepository::new(&state.db);
    let project = projects
        .get_project(request.project_id)
        .await?
        .ok_or_else(|| not_found(Some("Unknown project")))?;
    if !project.is_active {
        counter!("subscribe_requests_total", "outcome" => "inactive_project").increment(1);
        return Err(forbidden(Some("Project is not accepting subscriptions")));
    }

    // The key header is optional; embeds sending one get it verified
    if let Some(presented) = headers.get("x-api-key") {
        let presented = presented
            .to_str()
            .map_err(|_| unauthorized(Some("Invalid API key")))?;
        let keys = ApiKeyRepository::new(&state.db);
        let Some(key) = keys.verify_key_for_project(project.id, presented).await? else {
            counter!("subscribe_requests_total", "outcome" => "bad_key").increment(1);
            return Err(unauthorized(Some("Invalid API key")));
        };
        keys.touch_last_used(key).await?;
    }

    // A widget id pointing outside this project is dropped, not fatal;
    // old embeds keep working after their widget is deleted
    let widget_id = match request.widget_id {
        Some(id) => WidgetRepository::new(&state.db)
            .get_widget(id)
            .await?
            .filter(|widget| widget.project_id == project.id)
            .map(|widget| widget.id),
        None => None,
    };

    let raw_user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let parsed = parse_user_agent(raw_user_agent);

    let source = request
        .metadata
        .as_ref()
        .and_then(|metadata| metadata.get("source"))
        .and_then(|value| value.as_str())
        .map(str::to_string);

    // Client and server context stay under separate keys so the
    // self-reported half can never shadow the derived half
    let metadata = serde_json::json!({
        "client": request.metadata.clone().unwrap_or(serde_json::Value::Null),
        "server": {
            "device": parsed.device,
            "browser": parsed.browser,
            "os": parsed.os,
        },
    });

    let outcome = SubscriberRepository::new(&state.db)
        .upsert_subscriber(UpsertSubscriberRequest {
            project_id: project.id,
            widget_id,
            email: request.email,
            metadata: Some(metadata),
            source,
        })
        .await?;

    let (status, message) = if outcome.created {
        (StatusCode::CREATED, "Thanks for subscribing!")
    } else {
        (StatusCode::OK, "You're already on the list.")
    };
    counter!(
        "subscribe_requests_total",
        "outcome" => if outcome.created { "created" } else { "updated" }
    )
    .increment(1);

    tracing::info!(
        project_id = %project.id,
        subscriber_id = %outcome.subscriber.id,
        created = outcome.created,
        "subscription processed"
    );

    Ok((
        status,
        Json(SubscribeResponseDto {
            message: message.to_string(),
            subscriber_id: outcome.subscriber.id,
            already_subscribed: !outcome.created,
        }),
    ))
}
