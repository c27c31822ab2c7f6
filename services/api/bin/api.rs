//! Main Entrypoint for the Mentor API Service
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Loading the prompt templates and the curriculum.
//! 3. Building the text-generation client and the course agent.
//! 4. Constructing the Axum router and applying middleware.
//! 5. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use async_openai::config::OpenAIConfig;
use mentor_api::{config::Config, router::create_router, state::AppState};
use mentor_core::{
    agent::{AgentSettings, CourseAgent},
    curriculum::Catalog,
    llm_client::OpenAICompatibleClient,
    prompts::{Prompts, SYSTEM_PROMPT},
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = ?e, "Failed to install Ctrl+C handler");
        return;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();
    info!("Configuration loaded. Initializing application state...");

    // --- 3. Load Prompts and Curriculum ---
    let prompts = Prompts::load_dir(&config.prompts_path)?;
    let catalog = Catalog::from_file(&config.curriculum_path)?;
    info!(modules = catalog.len(), "Curriculum loaded.");

    // --- 4. Initialize Shared Services ---
    let api_key = config
        .api_key()
        .context("API key for the selected provider is not set")?;
    let openai_config = OpenAIConfig::new()
        .with_api_key(api_key)
        .with_api_base(config.provider.api_base());
    let llm_client = Arc::new(OpenAICompatibleClient::new(
        openai_config,
        config.chat_model.clone(),
        prompts.template(SYSTEM_PROMPT).to_string(),
        config.generation_timeout,
    ));

    let agent = CourseAgent::new(
        llm_client,
        prompts,
        catalog,
        AgentSettings {
            quiz_questions: config.quiz_question_count,
            transcript_limit: Some(config.transcript_limit),
        },
    );
    let app_state = Arc::new(AppState {
        agent: Arc::new(agent),
        reset_enabled: config.enable_reset,
    });
    if config.enable_reset {
        warn!("POST /reset is enabled; any caller can wipe every student's progress");
    }

    // --- 5. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // --- 6. Start Server ---
    info!(
        provider = ?config.provider,
        model = %config.chat_model,
        bind_address = %config.bind_address,
        "Service configured. Starting server..."
    );
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server has shut down.");
    Ok(())
}
