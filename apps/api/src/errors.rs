use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use interview_coach::GatewayError;

use crate::llm_client::LlmError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Extraction(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("{0}")]
    MalformedOutput(String),

    #[error("{0}")]
    Transcription(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Attaches the action being performed, producing the response error.
    pub fn during(self, action: &'static str) -> ApiFailure {
        ApiFailure {
            action,
            error: self,
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Malformed { reason, .. } => AppError::MalformedOutput(reason),
            other => AppError::Internal(anyhow::Error::new(other)),
        }
    }
}

/// Error returned by every API handler.
///
/// Clients only ever see a 500 with a plain-text body of the form
/// `Error <action>: <cause>`.
#[derive(Debug)]
pub struct ApiFailure {
    pub action: &'static str,
    pub error: AppError,
}

impl std::fmt::Display for ApiFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Error {}: {}", self.action, self.error)
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        match &self.error {
            AppError::Validation(_) => tracing::warn!("{self}"),
            AppError::Internal(e) => tracing::error!("Error {}: {e:?}", self.action),
            _ => tracing::error!("{self}"),
        }
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}

/// `.during(action)` on results, mirroring `anyhow::Context`.
pub trait During<T> {
    fn during(self, action: &'static str) -> Result<T, ApiFailure>;
}

impl<T, E: Into<AppError>> During<T> for Result<T, E> {
    fn during(self, action: &'static str) -> Result<T, ApiFailure> {
        self.map_err(|e| {
            let error: AppError = e.into();
            error.during(action)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn test_failure_renders_plain_text_500() {
        let response = AppError::Extraction("Empty resume text extracted".into())
            .during("processing resume")
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Error processing resume: Empty resume text extracted");
    }

    #[test]
    fn test_malformed_gateway_error_keeps_reason() {
        let err: AppError = GatewayError::Malformed {
            endpoint: "/api/generate-questions",
            reason: "no questions generated".into(),
        }
        .into();
        assert_eq!(err.to_string(), "no questions generated");
    }

    #[test]
    fn test_during_on_result() {
        let result: Result<(), AppError> = Err(AppError::Validation("No file uploaded".into()));
        let failure = result.during("processing resume").unwrap_err();
        assert_eq!(failure.to_string(), "Error processing resume: No file uploaded");
    }
}
