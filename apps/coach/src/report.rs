use std::fmt::Write;

use crate::model::SessionState;
use crate::prompts::NO_RESPONSE;

pub const REPORT_TITLE: &str = "AI Mock Interview Report";

/// Plain-text transcript of the session: every question with its answer.
pub fn render_report(session: &SessionState) -> String {
    let mut out = format!("{REPORT_TITLE}\n\n");
    for (i, question) in session.questions().iter().enumerate() {
        let answer = session.answer(i).unwrap_or(NO_RESPONSE);
        let _ = writeln!(out, "Question {}: {}", i + 1, question.text);
        let _ = writeln!(out, "Answer {}: {}", i + 1, answer);
        if let Some(Some(fb)) = session.feedback().get(i) {
            let _ = writeln!(out, "Feedback {}: {} - {}", i + 1, fb.title, fb.content);
        }
        out.push('\n');
    }
    out
}
