//! The backend seen from the client: resume parsing, question generation,
//! answer evaluation, session feedback and transcription.
//!
//! `HttpGateway` talks to the real server; `MockGateway` answers from a script
//! and is what the wizard tests and offline demos run against. Both validate
//! payload shapes with the same functions below, so a malformed upstream body
//! is rejected identically no matter which implementation produced it.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::capture::AudioClip;
use crate::model::{FeedbackItem, Question};
use crate::retry::FetchError;
use crate::upload::ResumeFile;

pub mod http;
pub mod mock;

pub use http::HttpGateway;
pub use mock::MockGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    UploadResume,
    UploadResumeText,
    GenerateQuestions,
    EvaluateAnswer,
    GenerateFeedback,
    Transcribe,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::UploadResume => "/api/upload-resume",
            Endpoint::UploadResumeText => "/api/upload-resume-text",
            Endpoint::GenerateQuestions => "/api/generate-questions",
            Endpoint::EvaluateAnswer => "/api/evaluate-answer",
            Endpoint::GenerateFeedback => "/api/generate-feedback",
            Endpoint::Transcribe => "/api/transcribe",
        }
    }
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("failed to read response from {endpoint}: {source}")]
    Body {
        endpoint: &'static str,
        source: reqwest::Error,
    },

    #[error("malformed response from {endpoint}: {reason}")]
    Malformed {
        endpoint: &'static str,
        reason: String,
    },

    #[error("{endpoint} failed: {message}")]
    Rejected {
        endpoint: &'static str,
        message: String,
    },
}

#[async_trait]
pub trait BackendGateway: Send + Sync {
    /// Extracts plain text from an uploaded resume document.
    async fn upload_resume(&self, file: &ResumeFile) -> Result<String, GatewayError>;

    /// Normalizes pasted resume text.
    async fn upload_resume_text(&self, text: &str) -> Result<String, GatewayError>;

    async fn generate_questions(&self, prompt: &str) -> Result<Vec<Question>, GatewayError>;

    async fn evaluate_answer(&self, prompt: &str) -> Result<FeedbackItem, GatewayError>;

    async fn generate_feedback(&self, prompt: &str) -> Result<Vec<FeedbackItem>, GatewayError>;

    async fn transcribe(&self, clip: &AudioClip) -> Result<String, GatewayError>;
}

fn malformed(endpoint: Endpoint, reason: impl Into<String>) -> GatewayError {
    GatewayError::Malformed {
        endpoint: endpoint.path(),
        reason: reason.into(),
    }
}

fn parse_value(endpoint: Endpoint, body: &str) -> Result<Value, GatewayError> {
    serde_json::from_str(body).map_err(|e| malformed(endpoint, format!("invalid JSON: {e}")))
}

/// Requires a non-empty JSON array of questions.
pub fn parse_questions(body: &str) -> Result<Vec<Question>, GatewayError> {
    let endpoint = Endpoint::GenerateQuestions;
    let value = parse_value(endpoint, body)?;
    match value.as_array() {
        Some(items) if !items.is_empty() => {}
        Some(_) => return Err(malformed(endpoint, "no questions generated")),
        None => return Err(malformed(endpoint, "expected a JSON array of questions")),
    }
    let questions: Vec<Question> = serde_json::from_value(value)
        .map_err(|e| malformed(endpoint, format!("unexpected question shape: {e}")))?;
    if questions.iter().any(|q| q.text.trim().is_empty()) {
        return Err(malformed(endpoint, "question with empty text"));
    }
    Ok(questions)
}

/// Requires a JSON object with non-blank `title` and `content`.
pub fn parse_evaluation(body: &str) -> Result<FeedbackItem, GatewayError> {
    let endpoint = Endpoint::EvaluateAnswer;
    let item: FeedbackItem = serde_json::from_value(parse_value(endpoint, body)?)
        .map_err(|e| malformed(endpoint, format!("expected {{title, content}}: {e}")))?;
    if item.title.trim().is_empty() || item.content.trim().is_empty() {
        return Err(malformed(endpoint, "feedback title or content is empty"));
    }
    Ok(item)
}

/// Requires a non-empty JSON array of `{title, content}` objects.
pub fn parse_feedback_list(body: &str) -> Result<Vec<FeedbackItem>, GatewayError> {
    let endpoint = Endpoint::GenerateFeedback;
    let value = parse_value(endpoint, body)?;
    if !value.as_array().is_some_and(|items| !items.is_empty()) {
        return Err(malformed(endpoint, "expected a non-empty JSON array of feedback"));
    }
    serde_json::from_value(value)
        .map_err(|e| malformed(endpoint, format!("unexpected feedback shape: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_questions_rejects_string_payload() {
        let err = parse_questions(r#""not an array""#).unwrap_err();
        assert!(matches!(
            err,
            GatewayError::Malformed { endpoint, .. } if endpoint == "/api/generate-questions"
        ));
    }

    #[test]
    fn test_parse_questions_rejects_non_json() {
        assert!(parse_questions("not an array").is_err());
    }

    #[test]
    fn test_parse_questions_rejects_empty_array() {
        let err = parse_questions("[]").unwrap_err();
        assert!(err.to_string().contains("no questions generated"));
    }

    #[test]
    fn test_parse_questions_accepts_strings_and_objects() {
        let qs = parse_questions(r#"["Q1", {"question": "Q2", "context": "c"}]"#).unwrap();
        assert_eq!(qs[0].text, "Q1");
        assert_eq!(qs[1].context.as_deref(), Some("c"));
    }

    #[test]
    fn test_parse_evaluation_requires_both_fields() {
        assert!(parse_evaluation(r#"{"title": "Feedback"}"#).is_err());
        assert!(parse_evaluation(r#"{"title": "", "content": "x"}"#).is_err());
        let item = parse_evaluation(r#"{"title": "Feedback", "content": "Clear"}"#).unwrap();
        assert_eq!(item.content, "Clear");
    }

    #[test]
    fn test_parse_feedback_list_requires_non_empty_array() {
        assert!(parse_feedback_list("[]").is_err());
        assert!(parse_feedback_list(r#"{"title": "a", "content": "b"}"#).is_err());
        let items = parse_feedback_list(r#"[{"title": "a", "content": "b"}]"#).unwrap();
        assert_eq!(items.len(), 1);
    }

    #[test]
    fn test_endpoint_paths() {
        assert_eq!(Endpoint::Transcribe.path(), "/api/transcribe");
        assert_eq!(Endpoint::UploadResumeText.path(), "/api/upload-resume-text");
    }
}
