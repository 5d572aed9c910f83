//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Collecty API.
//! Two surfaces share one router: the public embed surface (artifact delivery
//! and subscribe, no auth) and the management surface under `/api/v1`, which
//! sits behind the operator bearer token and owner header.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::Request,
    http::{HeaderValue, Method},
    middleware::{self, Next},
    response::Response,
    routing::{get, patch, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::auth_middleware;
use crate::config::AppConfig;
use crate::handlers;
use crate::rate_limit::{RateLimiter, build_limiter};
use crate::telemetry::{self, TraceContext};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub limiter: Arc<dyn RateLimiter>,
}

/// Build an [`AppState`] from parts, constructing the limiter named by the
/// configuration. Handler tests use this with an in-memory database.
pub fn create_test_app_state(config: AppConfig, db: DatabaseConnection) -> AppState {
    let limiter = build_limiter(&config.rate_limit);
    AppState {
        config: Arc::new(config),
        db,
        limiter,
    }
}

/// Mint a trace context per request, expose it to extractors and handlers,
/// and echo the id back so clients can quote it in reports.
async fn trace_context_middleware(mut request: Request, next: Next) -> Response {
    let context = TraceContext::new();
    let trace_id = context.trace_id.clone();
    request.extensions_mut().insert(context.clone());

    let mut response = telemetry::with_trace_context(context, next.run(request)).await;

    if let Ok(value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert("x-trace-id", value);
    }
    response
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    // Subscribe is called cross-origin from every embedding page, so it
    // gets a permissive CORS policy. Artifact routes manage their own
    // headers; layering CORS over them would duplicate the allow-origin.
    let subscribe_cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .max_age(Duration::from_secs(86400));

    let public = Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/widget/{id}/widget.js", get(handlers::artifacts::widget_js))
        .route("/widget/{id}/popup.js", get(handlers::artifacts::popup_js))
        .route("/widget/{id}/inline.js", get(handlers::artifacts::inline_js))
        .route(
            "/widget/{id}/inline.html",
            get(handlers::artifacts::inline_html),
        )
        .route(
            "/api/v1/subscribe",
            post(handlers::subscribe::subscribe).layer(subscribe_cors),
        );

    let management = Router::new()
        .route("/api/v1/projects", post(handlers::projects::create_project))
        .route("/api/v1/projects/{id}", get(handlers::projects::get_project))
        .route(
            "/api/v1/projects/{id}/widgets",
            post(handlers::widgets::create_widget).get(handlers::widgets::list_widgets),
        )
        .route(
            "/api/v1/projects/{id}/subscribers",
            get(handlers::projects::list_subscribers),
        )
        .route(
            "/api/v1/projects/{id}/api-keys",
            post(handlers::api_keys::create_api_key).get(handlers::api_keys::list_api_keys),
        )
        .route(
            "/api/v1/widgets/{id}",
            patch(handlers::widgets::update_widget).delete(handlers::widgets::delete_widget),
        )
        .route(
            "/api/v1/widgets/{id}/lead-magnet",
            put(handlers::widgets::put_lead_magnet).delete(handlers::widgets::delete_lead_magnet),
        )
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.config),
            auth_middleware,
        ));

    public
        .merge(management)
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let limiter = build_limiter(&config.rate_limit);
    let state = AppState {
        config: Arc::new(config),
        db,
        limiter,
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::health,
        crate::handlers::artifacts::widget_js,
        crate::handlers::artifacts::popup_js,
        crate::handlers::artifacts::inline_js,
        crate::handlers::artifacts::inline_html,
        crate::handlers::subscribe::subscribe,
        crate::handlers::projects::create_project,
        crate::handlers::projects::get_project,
        crate::handlers::projects::list_subscribers,
        crate::handlers::widgets::create_widget,
        crate::handlers::widgets::list_widgets,
        crate::handlers::widgets::update_widget,
        crate::handlers::widgets::delete_widget,
        crate::handlers::widgets::put_lead_magnet,
        crate::handlers::widgets::delete_lead_magnet,
        crate::handlers::api_keys::create_api_key,
        crate::handlers::api_keys::list_api_keys,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::subscribe::SubscribeRequestDto,
            crate::handlers::subscribe::SubscribeResponseDto,
            crate::handlers::projects::CreateProjectRequestDto,
            crate::handlers::projects::ProjectResponseDto,
            crate::handlers::projects::SubscriberDto,
            crate::handlers::widgets::CreateWidgetRequestDto,
            crate::handlers::widgets::UpdateWidgetRequestDto,
            crate::handlers::widgets::WidgetResponseDto,
            crate::handlers::widgets::LeadMagnetRequestDto,
            crate::handlers::widgets::LeadMagnetResponseDto,
            crate::handlers::api_keys::CreateApiKeyRequestDto,
            crate::handlers::api_keys::MintedApiKeyDto,
            crate::handlers::api_keys::ApiKeyResponseDto,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Collecty API",
        description = "Email collection widgets: artifact delivery, subscriptions and project management",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;

/// Registers the operator bearer token scheme referenced by management paths
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .description(Some("Static operator token".to_string()))
                        .build(),
                ),
            );
        }
    }
}
