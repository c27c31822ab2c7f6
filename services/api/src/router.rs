//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application,
//! including the webhook, the health check, the optional reset route, and
//! OpenAPI documentation.

use crate::{
    handlers,
    models::{ErrorResponse, HealthResponse, InboundMessage, ResetResponse},
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    paths(handlers::whatsapp_webhook, handlers::health, handlers::reset),
    components(schemas(InboundMessage, HealthResponse, ResetResponse, ErrorResponse)),
    tags(
        (name = "Mentor API", description = "WhatsApp course delivery for the UVV entrepreneurship course")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    let mut api_router = Router::new()
        .route("/whatsapp", post(handlers::whatsapp_webhook))
        .route("/health", get(handlers::health));
    if app_state.reset_enabled {
        api_router = api_router.route("/reset", post(handlers::reset));
    }
    let api_router = api_router.with_state(app_state);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router)
}
