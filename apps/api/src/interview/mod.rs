pub mod handlers;
pub mod resume;

use async_trait::async_trait;
use tracing::info;

use interview_coach::gateway::{parse_evaluation, parse_feedback_list, parse_questions};
use interview_coach::{BackendGateway, FeedbackItem, MockGateway, Question};

use crate::errors::AppError;
use crate::llm_client::{prompts::JSON_ONLY_SYSTEM, LlmClient};

/// The model answering the three prompt endpoints.
///
/// Prompts are built by the client; implementations only run them and hand
/// back validated shapes.
#[async_trait]
pub trait InterviewModel: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate_questions(&self, prompt: &str) -> Result<Vec<Question>, AppError>;

    async fn evaluate_answer(&self, prompt: &str) -> Result<FeedbackItem, AppError>;

    async fn generate_feedback(&self, prompt: &str) -> Result<Vec<FeedbackItem>, AppError>;
}

/// Claude-backed model. Output is fence-stripped and shape-checked.
pub struct LlmInterviewModel {
    llm: LlmClient,
}

impl LlmInterviewModel {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }

    async fn complete(&self, prompt: &str) -> Result<String, AppError> {
        Ok(self.llm.call_text(prompt, JSON_ONLY_SYSTEM).await?)
    }
}

#[async_trait]
impl InterviewModel for LlmInterviewModel {
    fn name(&self) -> &'static str {
        "claude"
    }

    async fn generate_questions(&self, prompt: &str) -> Result<Vec<Question>, AppError> {
        let questions = parse_questions(&self.complete(prompt).await?)?;
        info!("Generated {} questions", questions.len());
        Ok(questions)
    }

    async fn evaluate_answer(&self, prompt: &str) -> Result<FeedbackItem, AppError> {
        Ok(parse_evaluation(&self.complete(prompt).await?)?)
    }

    async fn generate_feedback(&self, prompt: &str) -> Result<Vec<FeedbackItem>, AppError> {
        let feedback = parse_feedback_list(&self.complete(prompt).await?)?;
        info!("Generated {} feedback items", feedback.len());
        Ok(feedback)
    }
}

/// Canned responses for running the whole flow offline.
#[derive(Default)]
pub struct MockInterviewModel {
    canned: MockGateway,
}

impl MockInterviewModel {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InterviewModel for MockInterviewModel {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate_questions(&self, prompt: &str) -> Result<Vec<Question>, AppError> {
        Ok(self.canned.generate_questions(prompt).await?)
    }

    async fn evaluate_answer(&self, prompt: &str) -> Result<FeedbackItem, AppError> {
        Ok(self.canned.evaluate_answer(prompt).await?)
    }

    async fn generate_feedback(&self, prompt: &str) -> Result<Vec<FeedbackItem>, AppError> {
        Ok(self.canned.generate_feedback(prompt).await?)
    }
}
