//! Axum Handlers
//!
//! The WhatsApp webhook, the health check and the development reset. Handlers
//! are documented with `utoipa` attributes for the generated OpenAPI document.

use axum::{
    Form,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    models::{ErrorResponse, HealthResponse, InboundMessage, ResetResponse},
    state::AppState,
    twiml,
};

pub enum ApiError {
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
        }
    }
}

/// Receive a WhatsApp message from Twilio and answer with TwiML.
#[utoipa::path(
    post,
    path = "/whatsapp",
    request_body(content = InboundMessage, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "TwiML response with one <Message> per reply", body = String, content_type = "application/xml"),
        (status = 400, description = "Missing sender", body = ErrorResponse)
    )
)]
pub async fn whatsapp_webhook(
    State(state): State<Arc<AppState>>,
    Form(message): Form<InboundMessage>,
) -> Result<impl IntoResponse, ApiError> {
    let sender = message
        .from
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| {
            warn!("Webhook called without a sender");
            ApiError::BadRequest("The 'From' field is required".to_string())
        })?;

    info!(sender = %sender, "Inbound message");
    let replies = state.agent.handle_message(sender, &message.body).await;

    Ok((
        [(header::CONTENT_TYPE, "application/xml")],
        twiml::render_twiml(&replies),
    ))
}

/// Liveness check.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse)
    )
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}

/// Forget every student. Only routed when `ENABLE_RESET` is set.
#[utoipa::path(
    post,
    path = "/reset",
    responses(
        (status = 200, description = "All student state dropped", body = ResetResponse)
    )
)]
pub async fn reset(State(state): State<Arc<AppState>>) -> Json<ResetResponse> {
    let cleared = state.agent.store().clear();
    warn!(cleared, "All student state reset");
    Json(ResetResponse {
        status: "ok".to_string(),
        cleared,
    })
}
