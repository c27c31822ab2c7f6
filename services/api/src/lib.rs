//! Mentor API Library Crate
//!
//! The HTTP surface of the course bot: configuration, application state, the
//! Twilio WhatsApp webhook, TwiML rendering and routing. The `api` binary is a
//! thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod state;
pub mod twiml;
