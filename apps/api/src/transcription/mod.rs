//! Speech-to-text for recorded answers.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use tracing::info;

use interview_coach::gateway::mock::MOCK_TRANSCRIPT;

use crate::errors::AppError;

const TRANSCRIPTION_PATH: &str = "/v1/audio/transcriptions";
const WHISPER_MODEL: &str = "whisper-1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// An uploaded audio file.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Bytes,
}

#[async_trait]
pub trait Transcriber: Send + Sync {
    fn name(&self) -> &'static str;

    async fn transcribe(&self, audio: AudioUpload) -> Result<String, AppError>;
}

/// Answers every recording with the same sentence.
pub struct MockTranscriber;

#[async_trait]
impl Transcriber for MockTranscriber {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn transcribe(&self, audio: AudioUpload) -> Result<String, AppError> {
        info!(
            "Mock transcription of {} ({} bytes)",
            audio.file_name,
            audio.bytes.len()
        );
        Ok(MOCK_TRANSCRIPT.to_string())
    }
}

/// Client for an OpenAI-compatible transcription endpoint.
pub struct WhisperTranscriber {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl WhisperTranscriber {
    pub fn new(base_url: &str, api_key: Option<String>) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AppError::Transcription(format!("failed to build client: {e}")))?;
        Ok(Self {
            client,
            endpoint: format!("{}{TRANSCRIPTION_PATH}", base_url.trim_end_matches('/')),
            api_key,
        })
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    fn name(&self) -> &'static str {
        "whisper"
    }

    async fn transcribe(&self, audio: AudioUpload) -> Result<String, AppError> {
        let part = Part::bytes(audio.bytes.to_vec())
            .file_name(audio.file_name)
            .mime_str(&audio.mime_type)
            .map_err(|e| AppError::Transcription(format!("invalid audio type: {e}")))?;
        let form = Form::new()
            .text("model", WHISPER_MODEL)
            .part("file", part);

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::Transcription(format!("request failed: {e}")))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Transcription(format!(
                "service returned {status}: {body}"
            )));
        }

        let parsed: TranscriptionResponse = response
            .json()
            .await
            .map_err(|e| AppError::Transcription(format!("unreadable response: {e}")))?;
        let text = parsed.text.trim().to_string();
        if text.is_empty() {
            return Err(AppError::Transcription("no speech recognized".into()));
        }
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn clip() -> AudioUpload {
        AudioUpload {
            file_name: "response.wav".into(),
            mime_type: "audio/wav".into(),
            bytes: Bytes::from_static(b"RIFF....WAVE"),
        }
    }

    #[tokio::test]
    async fn test_mock_returns_fixed_sentence() {
        let text = MockTranscriber.transcribe(clip()).await.unwrap();
        assert_eq!(text, MOCK_TRANSCRIPT);
    }

    #[tokio::test]
    async fn test_whisper_posts_file_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TRANSCRIPTION_PATH))
            .and(header("authorization", "Bearer stt-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"text": " I led the migration. "})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let transcriber = WhisperTranscriber::new(&server.uri(), Some("stt-key".into())).unwrap();
        let text = transcriber.transcribe(clip()).await.unwrap();
        assert_eq!(text, "I led the migration.");
    }

    #[tokio::test]
    async fn test_whisper_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TRANSCRIPTION_PATH))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let transcriber = WhisperTranscriber::new(&server.uri(), None).unwrap();
        let err = transcriber.transcribe(clip()).await.unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("overloaded"));
    }
}
