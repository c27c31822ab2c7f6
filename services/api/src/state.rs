//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the resources shared
//! by every handler.

use mentor_core::agent::CourseAgent;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<CourseAgent>,
    /// Whether `POST /reset` is routed.
    pub reset_enabled: bool,
}
