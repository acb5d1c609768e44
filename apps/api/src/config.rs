use anyhow::{bail, Context, Result};

const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Which interview model backs the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    /// Claude via the Anthropic Messages API.
    Live,
    /// Canned responses; no network access needed.
    Mock,
}

/// Speech-to-text service speaking the OpenAI transcription protocol.
#[derive(Debug, Clone)]
pub struct TranscriptionConfig {
    pub url: String,
    pub api_key: Option<String>,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    pub backend_mode: BackendMode,
    pub anthropic_api_key: Option<String>,
    pub public_dir: String,
    pub max_upload_bytes: usize,
    /// Unset means transcription answers with the mock transcript.
    pub transcription: Option<TranscriptionConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let backend_mode = match var("BACKEND_MODE").as_deref() {
            None | Some("live") => BackendMode::Live,
            Some("mock") => BackendMode::Mock,
            Some(other) => bail!("BACKEND_MODE must be 'live' or 'mock', got '{other}'"),
        };

        let anthropic_api_key = match backend_mode {
            BackendMode::Live => Some(require(&var, "ANTHROPIC_API_KEY")?),
            BackendMode::Mock => var("ANTHROPIC_API_KEY"),
        };

        Ok(Config {
            port: var("PORT")
                .unwrap_or_else(|| "3000".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            backend_mode,
            anthropic_api_key,
            public_dir: var("PUBLIC_DIR").unwrap_or_else(|| "public".to_string()),
            max_upload_bytes: match var("MAX_UPLOAD_BYTES") {
                Some(v) => v
                    .parse()
                    .context("MAX_UPLOAD_BYTES must be a byte count")?,
                None => DEFAULT_MAX_UPLOAD_BYTES,
            },
            transcription: var("TRANSCRIPTION_API_URL").map(|url| TranscriptionConfig {
                url,
                api_key: var("TRANSCRIPTION_API_KEY"),
            }),
        })
    }
}

fn require(var: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    var(key)
        .filter(|v| !v.trim().is_empty())
        .with_context(|| format!("Required environment variable '{key}' is not set"))
}
