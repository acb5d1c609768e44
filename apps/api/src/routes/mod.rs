pub mod health;

use std::path::Path;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;
use tracing::{info, warn};

use crate::interview::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    let public_dir = state.config.public_dir.clone();

    let router = Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/upload-resume", post(handlers::handle_upload_resume))
        .route(
            "/api/upload-resume-text",
            post(handlers::handle_upload_resume_text),
        )
        .route(
            "/api/generate-questions",
            post(handlers::handle_generate_questions),
        )
        .route("/api/evaluate-answer", post(handlers::handle_evaluate_answer))
        .route(
            "/api/generate-feedback",
            post(handlers::handle_generate_feedback),
        )
        .route("/api/transcribe", post(handlers::handle_transcribe))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state);

    // Front-end assets, when shipped alongside the API
    if Path::new(&public_dir).is_dir() {
        info!("Serving static files from {public_dir}");
        router.fallback_service(ServeDir::new(public_dir))
    } else {
        warn!("Static directory '{public_dir}' not found; serving API only");
        router
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use interview_coach::gateway::mock::MOCK_TRANSCRIPT;
    use interview_coach::{FeedbackItem, Question};

    use super::*;
    use crate::config::{BackendMode, Config};
    use crate::errors::AppError;
    use crate::interview::{InterviewModel, MockInterviewModel};
    use crate::transcription::MockTranscriber;

    const BOUNDARY: &str = "interview-test-boundary";

    /// A model whose output never survives validation.
    struct BrokenModel;

    #[async_trait]
    impl InterviewModel for BrokenModel {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn generate_questions(&self, _prompt: &str) -> Result<Vec<Question>, AppError> {
            Err(AppError::MalformedOutput(
                "Invalid or empty questions generated".into(),
            ))
        }

        async fn evaluate_answer(&self, _prompt: &str) -> Result<FeedbackItem, AppError> {
            Err(AppError::MalformedOutput("Invalid feedback format".into()))
        }

        async fn generate_feedback(&self, _prompt: &str) -> Result<Vec<FeedbackItem>, AppError> {
            Err(AppError::MalformedOutput(
                "Invalid or empty feedback generated".into(),
            ))
        }
    }

    fn test_config() -> Config {
        Config {
            port: 0,
            rust_log: "info".into(),
            backend_mode: BackendMode::Mock,
            anthropic_api_key: None,
            public_dir: "does-not-exist".into(),
            max_upload_bytes: 1024 * 1024,
            transcription: None,
        }
    }

    fn app_with(model: Arc<dyn InterviewModel>) -> Router {
        build_router(AppState {
            config: test_config(),
            model,
            transcriber: Arc::new(MockTranscriber),
        })
    }

    fn app() -> Router {
        app_with(Arc::new(MockInterviewModel::new()))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn post_file(
        uri: &str,
        field: &str,
        file_name: &str,
        mime: &str,
        data: &[u8],
    ) -> Request<Body> {
        let mut body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {mime}\r\n\r\n"
        )
        .into_bytes();
        body.extend_from_slice(data);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn text_of(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body: Value = serde_json::from_str(&text_of(response).await).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model"], "mock");
    }

    #[tokio::test]
    async fn test_upload_resume_text_is_trimmed() {
        let response = app()
            .oneshot(post_json(
                "/api/upload-resume-text",
                json!({"resumeText": "  Rust engineer at XYZ Corp \n"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text_of(response).await, "Rust engineer at XYZ Corp");
    }

    #[tokio::test]
    async fn test_blank_resume_text_is_500() {
        let response = app()
            .oneshot(post_json("/api/upload-resume-text", json!({"resumeText": "   "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            text_of(response).await,
            "Error processing resume text: No resume text provided"
        );
    }

    #[tokio::test]
    async fn test_upload_resume_accepts_text_file() {
        let response = app()
            .oneshot(post_file(
                "/api/upload-resume",
                "resume",
                "resume.txt",
                "text/plain",
                b"\nJane Doe, data engineer\n",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text_of(response).await, "Jane Doe, data engineer");
    }

    #[tokio::test]
    async fn test_upload_resume_empty_text_is_500() {
        let response = app()
            .oneshot(post_file(
                "/api/upload-resume",
                "resume",
                "resume.txt",
                "text/plain",
                b"   ",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            text_of(response).await,
            "Error processing resume: Empty resume text extracted"
        );
    }

    #[tokio::test]
    async fn test_upload_resume_wrong_field_is_500() {
        let response = app()
            .oneshot(post_file(
                "/api/upload-resume",
                "document",
                "resume.txt",
                "text/plain",
                b"text",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(text_of(response).await.contains("No file uploaded"));
    }

    #[tokio::test]
    async fn test_generate_questions_returns_json_list() {
        let response = app()
            .oneshot(post_json(
                "/api/generate-questions",
                json!({"prompt": "Generate 5 questions"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let questions: Vec<Question> = serde_json::from_str(&text_of(response).await).unwrap();
        assert!(!questions.is_empty());
    }

    #[tokio::test]
    async fn test_blank_prompt_is_500() {
        let response = app()
            .oneshot(post_json("/api/evaluate-answer", json!({"prompt": ""})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            text_of(response).await,
            "Error evaluating answer: No prompt provided"
        );
    }

    #[tokio::test]
    async fn test_non_json_body_is_500() {
        let request = Request::builder()
            .method("POST")
            .uri("/api/generate-feedback")
            .header(header::CONTENT_TYPE, "text/plain")
            .body(Body::from("prompt"))
            .unwrap();
        let response = app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(text_of(response)
            .await
            .starts_with("Error generating feedback:"));
    }

    #[tokio::test]
    async fn test_malformed_model_output_is_500() {
        let app = app_with(Arc::new(BrokenModel));

        let response = app
            .clone()
            .oneshot(post_json("/api/generate-questions", json!({"prompt": "p"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            text_of(response).await,
            "Error generating questions: Invalid or empty questions generated"
        );

        let response = app
            .oneshot(post_json("/api/generate-feedback", json!({"prompt": "p"})))
            .await
            .unwrap();
        assert_eq!(
            text_of(response).await,
            "Error generating feedback: Invalid or empty feedback generated"
        );
    }

    #[tokio::test]
    async fn test_transcribe_returns_plain_text() {
        let response = app()
            .oneshot(post_file(
                "/api/transcribe",
                "audio",
                "response.wav",
                "audio/wav",
                b"RIFF....WAVE",
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(text_of(response).await, MOCK_TRANSCRIPT);
    }

    #[tokio::test]
    async fn test_transcribe_without_multipart_is_500() {
        let response = app()
            .oneshot(post_json("/api/transcribe", json!({})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(text_of(response).await.starts_with("Error transcribing audio:"));
    }
}
