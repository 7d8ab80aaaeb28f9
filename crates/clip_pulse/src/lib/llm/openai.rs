use reqwest_middleware::ClientWithMiddleware;
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;

use crate::{Summarizer, SummaryResponse};

#[derive(Clone)]
pub struct OpenAIClient {
    client: ClientWithMiddleware,
    api_key: String,
    base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum OpenAIError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest_middleware::Error),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("No content in completion response")]
    EmptyResponse,
}

impl OpenAIClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = reqwest_middleware::ClientBuilder::new(reqwest::Client::new())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Self {
            client,
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".into(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub async fn send_completion_request(
        &self,
        model_name: impl Into<String>,
        user_content: impl Into<String>,
    ) -> Result<CompletionResponse, OpenAIError> {
        let body = serde_json::json!({
            "model": model_name.into(),
            "messages": [
                {
                    "role": "user",
                    "content": user_content.into()
                }
            ]
        });

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let message = resp.text().await.unwrap_or_default();
            return Err(OpenAIError::Api { status, message });
        }

        Ok(resp.json::<CompletionResponse>().await?)
    }

    fn build_prompt(content: &str, language: &str) -> String {
        if language == "vi" {
            format!("phân tích chi tiết, dễ hiểu, ngắn gọn bằng tiếng việt:\n\n{content}")
        } else {
            format!(
                "Summarize the following content in detail, make it easy to understand and concise:\n\n{content}"
            )
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CompletionResponse {
    pub id: String,
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub index: u32,
    pub message: CompletionMessage,
    pub finish_reason: String,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: Option<String>,
}

impl Summarizer for OpenAIClient {
    const SUMMARIZER_MODEL: &'static str = "gpt-4o-mini";

    type Error = OpenAIError;

    async fn summarize(&self, content: &str, language: &str) -> Result<SummaryResponse, OpenAIError> {
        let content = truncate_to_chars(content, Self::CONTEXT_WINDOW_LIMIT);
        let prompt = Self::build_prompt(content, language);

        let response = self
            .send_completion_request(Self::SUMMARIZER_MODEL, prompt)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize content"))?;

        let summary = response
            .choices
            .first()
            .and_then(|c| c.message.content.clone())
            .ok_or(OpenAIError::EmptyResponse)?;

        Ok(SummaryResponse { summary })
    }
}

fn truncate_to_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
