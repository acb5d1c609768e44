//! End-of-session feedback: one request for the overall assessment, merged
//! with whatever per-answer feedback the session already holds.

use tracing::{error, info};

use crate::gateway::BackendGateway;
use crate::model::{FeedbackItem, SessionState};
use crate::prompts::summary_prompt;

pub const NO_FEEDBACK_AVAILABLE: &str = "No feedback available";
const UNTITLED: &str = "Untitled";
const NO_CONTENT: &str = "No content provided";

/// What the results page shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackReport {
    /// Per-question items (one per question) followed by the overall items.
    Ready(Vec<FeedbackItem>),
    /// A single error item shown in place of the feedback list.
    Failed(FeedbackItem),
}

impl FeedbackReport {
    pub fn items(&self) -> &[FeedbackItem] {
        match self {
            FeedbackReport::Ready(items) => items,
            FeedbackReport::Failed(item) => std::slice::from_ref(item),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, FeedbackReport::Failed(_))
    }
}

/// Requests overall feedback for a finished session and assembles the results.
pub async fn generate_feedback(
    gateway: &dyn BackendGateway,
    session: &SessionState,
) -> FeedbackReport {
    let prompt = summary_prompt(session);
    match gateway.generate_feedback(&prompt).await {
        Ok(overall) => {
            info!("Received {} overall feedback items", overall.len());
            FeedbackReport::Ready(compose(session, overall))
        }
        Err(e) => {
            error!("Error generating feedback: {e}");
            FeedbackReport::Failed(FeedbackItem::error(format!(
                "Error generating feedback: {e}. Please check server connection."
            )))
        }
    }
}

fn compose(session: &SessionState, overall: Vec<FeedbackItem>) -> Vec<FeedbackItem> {
    let per_question = session.feedback().iter().enumerate().map(|(i, fb)| match fb {
        Some(item) => item.clone(),
        None => FeedbackItem::new(format!("Question {}", i + 1), NO_FEEDBACK_AVAILABLE),
    });
    per_question.chain(overall).map(display_item).collect()
}

fn display_item(item: FeedbackItem) -> FeedbackItem {
    let title = if item.title.trim().is_empty() {
        UNTITLED.to_string()
    } else {
        item.title
    };
    let content = if item.content.trim().is_empty() {
        NO_CONTENT.to_string()
    } else {
        item.content
    };
    FeedbackItem { title, content }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::{Endpoint, MockGateway};
    use crate::model::Question;
    use serde_json::json;

    fn answered_session() -> SessionState {
        let mut s = SessionState::new(
            vec![Question::new("Q1"), Question::new("Q2")],
            "resume",
            "jd",
            None,
        )
        .unwrap();
        s.record_answer(0, "A1".into()).unwrap();
        s.record_answer(1, "A2".into()).unwrap();
        s.record_feedback(1, FeedbackItem::new("Answer Feedback", "Good detail"))
            .unwrap();
        s
    }

    #[tokio::test]
    async fn test_per_question_items_precede_overall_items() {
        let gateway = MockGateway::new();
        gateway.push_json(
            Endpoint::GenerateFeedback,
            json!([{"title": "Overall Performance", "content": "Solid"}]),
        );

        let report = generate_feedback(&gateway, &answered_session()).await;
        let items = report.items();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0], FeedbackItem::new("Question 1", NO_FEEDBACK_AVAILABLE));
        assert_eq!(items[1].content, "Good detail");
        assert_eq!(items[2].title, "Overall Performance");
        assert!(gateway
            .last_prompt(Endpoint::GenerateFeedback)
            .unwrap()
            .contains("Question 2: Q2 - Answer: A2"));
    }

    #[tokio::test]
    async fn test_empty_list_is_a_failure() {
        let gateway = MockGateway::new();
        gateway.push_json(Endpoint::GenerateFeedback, json!([]));

        let report = generate_feedback(&gateway, &answered_session()).await;
        assert!(report.is_failure());
        assert_eq!(report.items().len(), 1);
        assert!(report.items()[0].is_error());
        assert!(report.items()[0]
            .content
            .starts_with("Error generating feedback:"));
    }

    #[tokio::test]
    async fn test_blank_fields_get_display_fallbacks() {
        let gateway = MockGateway::new();
        gateway.push_json(
            Endpoint::GenerateFeedback,
            json!([{"title": " ", "content": ""}]),
        );

        let report = generate_feedback(&gateway, &answered_session()).await;
        let last = report.items().last().unwrap();
        assert_eq!(last.title, "Untitled");
        assert_eq!(last.content, "No content provided");
    }
}
