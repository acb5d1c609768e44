use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use super::{
    parse_evaluation, parse_feedback_list, parse_questions, BackendGateway, Endpoint, GatewayError,
};
use crate::capture::AudioClip;
use crate::model::{FeedbackItem, Question};
use crate::retry::{ensure_success, retry, send_with_retry, RetryPolicy};
use crate::upload::ResumeFile;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Gateway backed by the interview API server.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    policy: RetryPolicy,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GatewayError::Fetch(e.into()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            policy: RetryPolicy::default(),
        })
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    async fn post_json(
        &self,
        endpoint: Endpoint,
        body: serde_json::Value,
    ) -> Result<String, GatewayError> {
        let url = self.url(endpoint);
        let response = send_with_retry(endpoint.path(), &self.policy, || {
            self.client.post(&url).json(&body)
        })
        .await?;
        read_body(endpoint, response).await
    }

    /// Multipart upload of a single file field. The form is rebuilt per attempt.
    async fn post_file(
        &self,
        endpoint: Endpoint,
        field: &'static str,
        file_name: &str,
        mime_type: &str,
        bytes: &[u8],
    ) -> Result<String, GatewayError> {
        let url = self.url(endpoint);
        let response = retry(endpoint.path(), &self.policy, || async {
            let part = Part::bytes(bytes.to_vec())
                .file_name(file_name.to_string())
                .mime_str(mime_type)?;
            let form = Form::new().part(field, part);
            ensure_success(self.client.post(&url).multipart(form).send().await?)
        })
        .await?;
        read_body(endpoint, response).await
    }
}

async fn read_body(
    endpoint: Endpoint,
    response: reqwest::Response,
) -> Result<String, GatewayError> {
    let body = response.text().await.map_err(|source| GatewayError::Body {
        endpoint: endpoint.path(),
        source,
    })?;
    debug!("{} returned {} bytes", endpoint.path(), body.len());
    Ok(body)
}

#[async_trait]
impl BackendGateway for HttpGateway {
    async fn upload_resume(&self, file: &ResumeFile) -> Result<String, GatewayError> {
        self.post_file(
            Endpoint::UploadResume,
            "resume",
            &file.file_name,
            &file.mime_type,
            &file.bytes,
        )
        .await
    }

    async fn upload_resume_text(&self, text: &str) -> Result<String, GatewayError> {
        self.post_json(Endpoint::UploadResumeText, json!({ "resumeText": text }))
            .await
    }

    async fn generate_questions(&self, prompt: &str) -> Result<Vec<Question>, GatewayError> {
        let body = self
            .post_json(Endpoint::GenerateQuestions, json!({ "prompt": prompt }))
            .await?;
        parse_questions(&body)
    }

    async fn evaluate_answer(&self, prompt: &str) -> Result<FeedbackItem, GatewayError> {
        let body = self
            .post_json(Endpoint::EvaluateAnswer, json!({ "prompt": prompt }))
            .await?;
        parse_evaluation(&body)
    }

    async fn generate_feedback(&self, prompt: &str) -> Result<Vec<FeedbackItem>, GatewayError> {
        let body = self
            .post_json(Endpoint::GenerateFeedback, json!({ "prompt": prompt }))
            .await?;
        parse_feedback_list(&body)
    }

    async fn transcribe(&self, clip: &AudioClip) -> Result<String, GatewayError> {
        self.post_file(
            Endpoint::Transcribe,
            "audio",
            &clip.file_name,
            &clip.mime_type,
            &clip.bytes,
        )
        .await
    }
}
