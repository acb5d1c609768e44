use std::sync::Arc;

use crate::config::Config;
use crate::interview::InterviewModel;
use crate::transcription::Transcriber;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Claude in live mode, canned responses in mock mode.
    pub model: Arc<dyn InterviewModel>,
    pub transcriber: Arc<dyn Transcriber>,
}
