use axum::{
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        rejection::JsonRejection,
        Multipart, State,
    },
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::info;

use interview_coach::{FeedbackItem, Question};

use crate::errors::{ApiFailure, AppError, During};
use crate::interview::resume::{extract_resume_text, normalize_resume_text};
use crate::state::AppState;
use crate::transcription::AudioUpload;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeTextRequest {
    #[serde(default)]
    pub resume_text: String,
}

#[derive(Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: String,
}

struct UploadedFile {
    file_name: String,
    mime_type: String,
    bytes: Bytes,
}

/// Reads the multipart field `name`, skipping any others.
async fn read_file_field(
    multipart: &mut Multipart,
    name: &str,
) -> Result<UploadedFile, AppError> {
    let invalid = |e: MultipartError| AppError::Validation(format!("Invalid multipart body: {e}"));
    while let Some(field) = multipart.next_field().await.map_err(invalid)? {
        if field.name() == Some(name) {
            return read_field(field).await.map_err(invalid);
        }
    }
    Err(AppError::Validation("No file uploaded".into()))
}

async fn read_field(field: Field<'_>) -> Result<UploadedFile, MultipartError> {
    let file_name = field.file_name().unwrap_or("upload").to_string();
    let mime_type = field
        .content_type()
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = field.bytes().await?;
    Ok(UploadedFile {
        file_name,
        mime_type,
        bytes,
    })
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::Validation(e.body_text()))
}

fn multipart_body(payload: Result<Multipart, MultipartRejection>) -> Result<Multipart, AppError> {
    payload.map_err(|e| AppError::Validation(e.body_text()))
}

fn require_prompt(req: &PromptRequest) -> Result<&str, AppError> {
    let prompt = req.prompt.trim();
    if prompt.is_empty() {
        return Err(AppError::Validation("No prompt provided".into()));
    }
    Ok(prompt)
}

/// POST /api/upload-resume
pub async fn handle_upload_resume(
    payload: Result<Multipart, MultipartRejection>,
) -> Result<String, ApiFailure> {
    const ACTION: &str = "processing resume";
    let mut multipart = multipart_body(payload).during(ACTION)?;
    let file = read_file_field(&mut multipart, "resume").await.during(ACTION)?;
    if file.bytes.is_empty() {
        return Err(AppError::Validation("No file uploaded".into()).during(ACTION));
    }
    info!(
        "Received resume {} ({}, {} bytes)",
        file.file_name,
        file.mime_type,
        file.bytes.len()
    );

    // pdf-extract is CPU bound and can panic on hostile input
    let bytes = file.bytes;
    tokio::task::spawn_blocking(move || extract_resume_text(&bytes))
        .await
        .map_err(|e| AppError::Extraction(format!("Failed to parse resume: {e}")))
        .during(ACTION)?
        .during(ACTION)
}

/// POST /api/upload-resume-text
pub async fn handle_upload_resume_text(
    payload: Result<Json<ResumeTextRequest>, JsonRejection>,
) -> Result<String, ApiFailure> {
    const ACTION: &str = "processing resume text";
    let req = json_body(payload).during(ACTION)?;
    let text = normalize_resume_text(&req.resume_text)
        .map_err(|_| AppError::Validation("No resume text provided".into()))
        .during(ACTION)?;
    info!("Received manual resume text ({} chars)", text.chars().count());
    Ok(text)
}

/// POST /api/generate-questions
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<Vec<Question>>, ApiFailure> {
    const ACTION: &str = "generating questions";
    let req = json_body(payload).during(ACTION)?;
    let prompt = require_prompt(&req).during(ACTION)?;
    let questions = state.model.generate_questions(prompt).await.during(ACTION)?;
    Ok(Json(questions))
}

/// POST /api/evaluate-answer
pub async fn handle_evaluate_answer(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<FeedbackItem>, ApiFailure> {
    const ACTION: &str = "evaluating answer";
    let req = json_body(payload).during(ACTION)?;
    let prompt = require_prompt(&req).during(ACTION)?;
    let feedback = state.model.evaluate_answer(prompt).await.during(ACTION)?;
    Ok(Json(feedback))
}

/// POST /api/generate-feedback
pub async fn handle_generate_feedback(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> Result<Json<Vec<FeedbackItem>>, ApiFailure> {
    const ACTION: &str = "generating feedback";
    let req = json_body(payload).during(ACTION)?;
    let prompt = require_prompt(&req).during(ACTION)?;
    let feedback = state.model.generate_feedback(prompt).await.during(ACTION)?;
    Ok(Json(feedback))
}

/// POST /api/transcribe
pub async fn handle_transcribe(
    State(state): State<AppState>,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<String, ApiFailure> {
    const ACTION: &str = "transcribing audio";
    let mut multipart = multipart_body(payload).during(ACTION)?;
    let file = read_file_field(&mut multipart, "audio").await.during(ACTION)?;
    if file.bytes.is_empty() {
        return Err(AppError::Validation("No audio file uploaded".into()).during(ACTION));
    }
    info!(
        "Transcribing {} ({} bytes) with {}",
        file.file_name,
        file.bytes.len(),
        state.transcriber.name()
    );
    state
        .transcriber
        .transcribe(AudioUpload {
            file_name: file.file_name,
            mime_type: file.mime_type,
            bytes: file.bytes,
        })
        .await
        .during(ACTION)
}
