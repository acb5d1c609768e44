//! Session data model shared by the wizard, the capture pipeline, and the backend.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Title carried by locally produced feedback when evaluation fails.
pub const ERROR_FEEDBACK_TITLE: &str = "Error";

/// A single generated interview question.
///
/// The backend may answer with bare strings (older prompt format) or with
/// objects; both deserialize into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Question {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Question {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum QuestionWire {
    Plain(String),
    Object {
        #[serde(alias = "question")]
        text: String,
        #[serde(default)]
        context: Option<String>,
    },
}

impl<'de> Deserialize<'de> for Question {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match QuestionWire::deserialize(deserializer)? {
            QuestionWire::Plain(text) => Question {
                text,
                context: None,
            },
            QuestionWire::Object { text, context } => Question {
                text,
                context: context.filter(|c| !c.trim().is_empty()),
            },
        })
    }
}

/// A titled block of feedback, either for one answer or for the whole session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub title: String,
    pub content: String,
}

impl FeedbackItem {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
        }
    }

    /// Placeholder stored when a per-answer evaluation could not be obtained.
    pub fn error(content: impl Into<String>) -> Self {
        Self::new(ERROR_FEEDBACK_TITLE, content)
    }

    pub fn is_error(&self) -> bool {
        self.title == ERROR_FEEDBACK_TITLE
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("no questions were generated")]
    NoQuestions,

    #[error("question {index} has no text")]
    BlankQuestion { index: usize },

    #[error("question index {index} out of range (session has {len} questions)")]
    OutOfRange { index: usize, len: usize },
}

/// Everything known about one interview session.
///
/// `answers` and `feedback` always have exactly one slot per question and
/// `position` is always a valid question index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    questions: Vec<Question>,
    answers: Vec<Option<String>>,
    feedback: Vec<Option<FeedbackItem>>,
    position: usize,
    pub resume_text: String,
    pub job_description: String,
    pub company_name: Option<String>,
}

impl SessionState {
    pub fn new(
        questions: Vec<Question>,
        resume_text: impl Into<String>,
        job_description: impl Into<String>,
        company_name: Option<String>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::NoQuestions);
        }
        if let Some(index) = questions.iter().position(|q| q.text.trim().is_empty()) {
            return Err(SessionError::BlankQuestion { index });
        }

        let len = questions.len();
        Ok(Self {
            questions,
            answers: vec![None; len],
            feedback: vec![None; len],
            position: 0,
            resume_text: resume_text.into(),
            job_description: job_description.into(),
            company_name: company_name.filter(|c| !c.trim().is_empty()),
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &[Option<String>] {
        &self.answers
    }

    pub fn feedback(&self) -> &[Option<FeedbackItem>] {
        &self.feedback
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn is_last(&self) -> bool {
        self.position + 1 == self.questions.len()
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.position]
    }

    pub fn current_answer(&self) -> Option<&str> {
        self.answers[self.position].as_deref()
    }

    pub fn answer(&self, index: usize) -> Option<&str> {
        self.answers.get(index).and_then(|a| a.as_deref())
    }

    pub fn is_complete(&self) -> bool {
        self.answers.iter().all(Option::is_some)
    }

    pub fn record_answer(&mut self, index: usize, answer: String) -> Result<(), SessionError> {
        let len = self.len();
        let slot = self
            .answers
            .get_mut(index)
            .ok_or(SessionError::OutOfRange { index, len })?;
        *slot = Some(answer);
        Ok(())
    }

    pub fn record_feedback(
        &mut self,
        index: usize,
        item: FeedbackItem,
    ) -> Result<(), SessionError> {
        let len = self.len();
        let slot = self
            .feedback
            .get_mut(index)
            .ok_or(SessionError::OutOfRange { index, len })?;
        *slot = Some(item);
        Ok(())
    }

    /// Stores the answer for the question at the current position and returns
    /// that position.
    pub fn record_current_answer(&mut self, answer: String) -> usize {
        self.answers[self.position] = Some(answer);
        self.position
    }

    /// Stores feedback for the question at the current position.
    pub fn record_current_feedback(&mut self, item: FeedbackItem) {
        self.feedback[self.position] = Some(item);
    }

    /// Moves forward one question. Returns false at the last question.
    pub(crate) fn step_forward(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.position += 1;
        true
    }

    /// Moves back one question. Returns false at the first question.
    pub(crate) fn step_back(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.position -= 1;
        true
    }
}
