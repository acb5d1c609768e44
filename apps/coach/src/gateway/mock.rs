use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{
    parse_evaluation, parse_feedback_list, parse_questions, BackendGateway, Endpoint, GatewayError,
};
use crate::capture::AudioClip;
use crate::model::{FeedbackItem, Question};
use crate::upload::ResumeFile;

pub const MOCK_RESUME_TEXT: &str =
    "Software engineer with five years of experience building data pipelines in Python and Rust.";
pub const MOCK_TRANSCRIPT: &str =
    "Mock transcription: I led a team to build a Python pipeline at XYZ Corp.";

#[derive(Debug, Clone)]
enum Scripted {
    Body(String),
    Fail(String),
}

/// Scripted, in-process backend.
///
/// Each endpoint answers from its queue of scripted responses first and falls
/// back to a canned default once the queue is empty. JSON bodies go through the
/// same shape checks as the HTTP gateway.
#[derive(Debug, Default)]
pub struct MockGateway {
    scripts: Mutex<HashMap<Endpoint, VecDeque<Scripted>>>,
    calls: Mutex<HashMap<Endpoint, usize>>,
    prompts: Mutex<Vec<(Endpoint, String)>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a raw response body (plain text or serialized JSON).
    pub fn push_body(&self, endpoint: Endpoint, body: impl Into<String>) -> &Self {
        self.push(endpoint, Scripted::Body(body.into()))
    }

    pub fn push_json(&self, endpoint: Endpoint, value: Value) -> &Self {
        self.push(endpoint, Scripted::Body(value.to_string()))
    }

    /// Queues a failure, as if every retry had been exhausted.
    pub fn push_failure(&self, endpoint: Endpoint, message: impl Into<String>) -> &Self {
        self.push(endpoint, Scripted::Fail(message.into()))
    }

    pub fn calls(&self, endpoint: Endpoint) -> usize {
        lock(&self.calls).get(&endpoint).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        lock(&self.calls).values().sum()
    }

    pub fn last_prompt(&self, endpoint: Endpoint) -> Option<String> {
        lock(&self.prompts)
            .iter()
            .rev()
            .find(|(e, _)| *e == endpoint)
            .map(|(_, p)| p.clone())
    }

    fn push(&self, endpoint: Endpoint, scripted: Scripted) -> &Self {
        lock(&self.scripts)
            .entry(endpoint)
            .or_default()
            .push_back(scripted);
        self
    }

    fn respond(
        &self,
        endpoint: Endpoint,
        prompt: Option<&str>,
        default: impl FnOnce() -> String,
    ) -> Result<String, GatewayError> {
        *lock(&self.calls).entry(endpoint).or_default() += 1;
        if let Some(prompt) = prompt {
            lock(&self.prompts).push((endpoint, prompt.to_string()));
        }

        let next = lock(&self.scripts)
            .get_mut(&endpoint)
            .and_then(VecDeque::pop_front);
        match next {
            Some(Scripted::Body(body)) => Ok(body),
            Some(Scripted::Fail(message)) => Err(GatewayError::Rejected {
                endpoint: endpoint.path(),
                message,
            }),
            None => Ok(default()),
        }
    }
}

fn default_questions() -> String {
    json!([
        {"question": "Walk me through the most complex system you have built.", "context": "Architecture depth"},
        {"question": "Tell me about a time you disagreed with a teammate.", "context": "Collaboration"},
        {"question": "How do you make a slow data pipeline faster?", "context": "Performance"},
        {"question": "Describe a production incident you handled.", "context": "Ownership"},
        {"question": "Why are you interested in this role?", "context": "Motivation"}
    ])
    .to_string()
}

fn default_evaluation() -> String {
    json!({
        "title": "Answer Feedback",
        "content": "Clear and relevant. Add a measurable outcome to make the impact concrete."
    })
    .to_string()
}

fn default_feedback() -> String {
    json!([
        {"title": "Overall Performance", "content": "Answers were structured and grounded in real projects."},
        {"title": "Strengths Identified", "content": "Technical depth and ownership of outcomes."},
        {"title": "Areas for Improvement", "content": "Quantify results and keep answers shorter."}
    ])
    .to_string()
}

#[async_trait]
impl BackendGateway for MockGateway {
    async fn upload_resume(&self, _file: &ResumeFile) -> Result<String, GatewayError> {
        self.respond(Endpoint::UploadResume, None, || MOCK_RESUME_TEXT.to_string())
    }

    async fn upload_resume_text(&self, text: &str) -> Result<String, GatewayError> {
        self.respond(Endpoint::UploadResumeText, None, || text.trim().to_string())
    }

    async fn generate_questions(&self, prompt: &str) -> Result<Vec<Question>, GatewayError> {
        let body = self.respond(Endpoint::GenerateQuestions, Some(prompt), default_questions)?;
        parse_questions(&body)
    }

    async fn evaluate_answer(&self, prompt: &str) -> Result<FeedbackItem, GatewayError> {
        let body = self.respond(Endpoint::EvaluateAnswer, Some(prompt), default_evaluation)?;
        parse_evaluation(&body)
    }

    async fn generate_feedback(&self, prompt: &str) -> Result<Vec<FeedbackItem>, GatewayError> {
        let body = self.respond(Endpoint::GenerateFeedback, Some(prompt), default_feedback)?;
        parse_feedback_list(&body)
    }

    async fn transcribe(&self, _clip: &AudioClip) -> Result<String, GatewayError> {
        self.respond(Endpoint::Transcribe, None, || MOCK_TRANSCRIPT.to_string())
    }
}
