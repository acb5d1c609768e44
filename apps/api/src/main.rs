mod config;
mod errors;
mod interview;
mod llm_client;
mod routes;
mod state;
mod transcription;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{BackendMode, Config};
use crate::interview::{InterviewModel, LlmInterviewModel, MockInterviewModel};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::transcription::{MockTranscriber, Transcriber, WhisperTranscriber};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting interview API v{}", env!("CARGO_PKG_VERSION"));

    let model = build_model(&config)?;
    info!("Interview model: {}", model.name());

    let transcriber = build_transcriber(&config)?;
    info!("Transcriber: {}", transcriber.name());

    let state = AppState {
        config: config.clone(),
        model,
        transcriber,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_model(config: &Config) -> Result<Arc<dyn InterviewModel>> {
    match config.backend_mode {
        BackendMode::Mock => Ok(Arc::new(MockInterviewModel::new())),
        BackendMode::Live => {
            let api_key = config
                .anthropic_api_key
                .clone()
                .context("ANTHROPIC_API_KEY is required in live mode")?;
            let llm = LlmClient::new(api_key)?;
            info!("LLM client initialized (model: {})", llm_client::MODEL);
            Ok(Arc::new(LlmInterviewModel::new(llm)))
        }
    }
}

fn build_transcriber(config: &Config) -> Result<Arc<dyn Transcriber>> {
    match &config.transcription {
        Some(t) => Ok(Arc::new(WhisperTranscriber::new(&t.url, t.api_key.clone())?)),
        None => Ok(Arc::new(MockTranscriber)),
    }
}
