//! API Models
//!
//! Request and response shapes for the HTTP surface, annotated for OpenAPI
//! generation with `utoipa`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// An inbound WhatsApp message as posted by the Twilio webhook
/// (`application/x-www-form-urlencoded`). Twilio sends many more fields; only
/// these two are read.
#[derive(Debug, Deserialize, ToSchema)]
pub struct InboundMessage {
    #[serde(rename = "Body", default)]
    #[schema(example = "continuar")]
    pub body: String,
    #[serde(rename = "From")]
    #[schema(example = "whatsapp:+5527999990000")]
    pub from: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResetResponse {
    #[schema(example = "ok")]
    pub status: String,
    /// Number of students forgotten.
    pub cleared: usize,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}
