// Prompt templates sent to the backend's model endpoints.
// Placeholders in `{braces}` are filled in a single pass by `fill_template`,
// so text inserted for one placeholder is never scanned for another.

use crate::model::SessionState;

pub const QUESTION_COUNT: usize = 5;

/// Question generation prompt. Fills `{count}`, `{resume_text}`,
/// `{job_description}` and `{company_name}`.
pub const QUESTION_PROMPT_TEMPLATE: &str = r#"Based on the following resume and job description, generate {count} realistic, personalized interview questions for the candidate.
Mix behavioral and technical questions and ground each one in something specific from the resume or the role.

Resume: {resume_text}
Job Description: {job_description}
Company Name: {company_name}

Format the response as a JSON array of objects with "question" and "context" fields, e.g.
[{"question": "...", "context": "why this question is being asked"}]"#;

/// Single-answer evaluation prompt. Fills `{question}`, `{answer}` and `{job_description}`.
pub const EVALUATION_PROMPT_TEMPLATE: &str = r#"You are an experienced interviewer. Evaluate the candidate's answer to one interview question.

Job Description: {job_description}
Question: {question}
Answer: {answer}

Comment on relevance, structure and concrete evidence, and suggest one improvement.
Format the response as a JSON object with "title" and "content" fields, e.g.
{"title": "Answer Feedback", "content": "..."}"#;

/// Whole-session feedback prompt. Fills `{resume_text}`, `{job_description}` and `{responses}`.
pub const SUMMARY_PROMPT_TEMPLATE: &str = r#"Based on the following resume, job description, and candidate responses, provide detailed feedback on their interview performance.

Resume: {resume_text}
Job Description: {job_description}
Responses:
{responses}

Format the response as a JSON array of objects with "title" and "content" fields, e.g. [
    {"title": "Overall Performance", "content": "..."},
    {"title": "Strengths Identified", "content": "..."},
    {"title": "Areas for Improvement", "content": "..."}
]"#;

pub const NO_RESPONSE: &str = "No response provided";

pub fn question_prompt(
    resume_text: &str,
    job_description: &str,
    company_name: Option<&str>,
) -> String {
    let count = QUESTION_COUNT.to_string();
    fill_template(
        QUESTION_PROMPT_TEMPLATE,
        &[
            ("count", count.as_str()),
            ("resume_text", resume_text),
            ("job_description", job_description),
            ("company_name", company_name.unwrap_or("Not provided")),
        ],
    )
}

pub fn evaluation_prompt(question: &str, answer: &str, job_description: &str) -> String {
    fill_template(
        EVALUATION_PROMPT_TEMPLATE,
        &[
            ("job_description", job_description),
            ("question", question),
            ("answer", answer),
        ],
    )
}

pub fn summary_prompt(session: &SessionState) -> String {
    let responses = response_lines(session);
    fill_template(
        SUMMARY_PROMPT_TEMPLATE,
        &[
            ("resume_text", session.resume_text.as_str()),
            ("job_description", session.job_description.as_str()),
            ("responses", responses.as_str()),
        ],
    )
}

/// Replaces each `{name}` in `template` whose name is in `vars`. Other brace
/// groups, such as the JSON examples, are copied through unchanged.
fn fill_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

/// One line per question, followed by that answer's feedback when present.
fn response_lines(session: &SessionState) -> String {
    session
        .questions()
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let answer = session.answer(i).unwrap_or(NO_RESPONSE);
            let mut line = format!("Question {}: {} - Answer: {}", i + 1, q.text, answer);
            if let Some(Some(fb)) = session.feedback().get(i) {
                line.push_str(&format!(" - Feedback ({}): {}", fb.title, fb.content));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FeedbackItem, Question};

    #[test]
    fn test_question_prompt_defaults_company() {
        let prompt = question_prompt("10 years of Rust", "Staff engineer", None);
        assert!(prompt.contains("Company Name: Not provided"));
        assert!(prompt.contains("Resume: 10 years of Rust"));
        assert!(prompt.contains("generate 5 realistic"));
    }

    #[test]
    fn test_summary_prompt_lists_every_question() {
        let mut session = SessionState::new(
            vec![Question::new("Q1"), Question::new("Q2")],
            "resume",
            "jd",
            None,
        )
        .unwrap();
        session.record_answer(0, "A1".into()).unwrap();
        session
            .record_feedback(0, FeedbackItem::new("Answer Feedback", "Solid"))
            .unwrap();

        let prompt = summary_prompt(&session);
        assert!(prompt.contains("Question 1: Q1 - Answer: A1 - Feedback (Answer Feedback): Solid"));
        assert!(prompt.contains("Question 2: Q2 - Answer: No response provided"));
    }

    #[test]
    fn test_templates_have_no_unfilled_placeholders() {
        let prompt = evaluation_prompt("Q", "A", "JD");
        assert!(!prompt.contains("{question}"));
        assert!(!prompt.contains("{answer}"));
        assert!(!prompt.contains("{job_description}"));
    }

    #[test]
    fn test_answer_mentioning_a_placeholder_is_quoted_verbatim() {
        let mut session = SessionState::new(
            vec![Question::new("Q1")],
            "SECRET-RESUME-BODY",
            "Python role, see {responses}",
            None,
        )
        .unwrap();
        session
            .record_answer(0, "I used a template like {resume_text} in Python".into())
            .unwrap();

        let prompt = summary_prompt(&session);
        assert!(prompt
            .contains("Question 1: Q1 - Answer: I used a template like {resume_text} in Python"));
        assert!(prompt.contains("Job Description: Python role, see {responses}\n"));
        assert_eq!(prompt.matches("SECRET-RESUME-BODY").count(), 1);
    }

    #[test]
    fn test_question_text_with_braces_is_not_refilled() {
        let prompt = evaluation_prompt("What does {answer} mean in a template?", "A", "JD");
        assert!(prompt.contains("Question: What does {answer} mean in a template?\n"));
        assert!(prompt.contains("Answer: A\n"));
    }

    #[test]
    fn test_json_examples_in_templates_survive() {
        let prompt = question_prompt("r", "jd", Some("Acme"));
        assert!(prompt.contains(
            r#"[{"question": "...", "context": "why this question is being asked"}]"#
        ));
        assert!(prompt.contains("Company Name: Acme"));
    }
}
