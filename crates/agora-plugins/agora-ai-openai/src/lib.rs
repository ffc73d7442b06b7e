//! # agora-ai-openai
//!
//! `Summarizer` implementation backed by an OpenAI-compatible
//! chat-completions endpoint. Transient upstream failures (429/5xx,
//! transport errors) are retried a few times with backoff inside this
//! plugin; anything that still fails surfaces as `SummarizerFailed` and
//! the caller may simply re-invoke — the cache layer guarantees nothing
//! was persisted.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use agora_core::error::{AppError, Result};
use agora_core::models::SummaryMode;
use agora_core::traits::Summarizer;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const MAX_ATTEMPTS: u32 = 3;
const MAX_COMPLETION_TOKENS: u32 = 700;

pub struct OpenAiSummarizer {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl OpenAiSummarizer {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Points the client at a different OpenAI-compatible endpoint
    /// (e.g., a local proxy).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

fn system_prompt(mode: SummaryMode) -> &'static str {
    match mode {
        SummaryMode::Conversation => {
            "You are a friendly participant warming up a discussion, not its \
             moderator. Given the posts below, reply in a conversational tone, \
             six to eight sentences, without repeating earlier phrasing. Avoid \
             exaggeration and flat assertions; close with one short question."
        }
        SummaryMode::Analysis => {
            "You are a careful, neutral analyst. Summarize the discussion \
             below: the main positions, the points of agreement and \
             disagreement, and any open questions. Be concise and do not \
             invent claims that are not in the posts."
        }
    }
}

fn request_body(mode: SummaryMode, model: &str, input: &str) -> serde_json::Value {
    // The conversation flavor gets a higher temperature so repeated
    // summaries of similar threads do not all sound alike.
    let temperature = match mode {
        SummaryMode::Conversation => 0.7,
        SummaryMode::Analysis => 0.3,
    };
    json!({
        "model": model,
        "messages": [
            { "role": "system", "content": system_prompt(mode) },
            { "role": "user", "content": input },
        ],
        "temperature": temperature,
        "max_tokens": MAX_COMPLETION_TOKENS,
    })
}

#[derive(Deserialize)]
struct ChatCompletion {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

#[async_trait]
impl Summarizer for OpenAiSummarizer {
    async fn summarize(&self, mode: SummaryMode, model: &str, input: &str) -> Result<String> {
        if self.api_key.is_empty() {
            return Err(AppError::SummarizerFailed(
                "OPENAI_API_KEY is not configured".into(),
            ));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let body = request_body(mode, model, input);
        let mut last_err = String::from("unknown error");

        for attempt in 1..=MAX_ATTEMPTS {
            match self
                .client
                .post(&url)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        let completion: ChatCompletion = resp.json().await.map_err(|e| {
                            AppError::SummarizerFailed(format!("malformed completion: {e}"))
                        })?;
                        let content = completion
                            .choices
                            .into_iter()
                            .next()
                            .map(|c| c.message.content)
                            .unwrap_or_default();
                        let content = content.trim();
                        if !content.is_empty() {
                            return Ok(content.to_string());
                        }
                        last_err = "empty completion".into();
                    } else {
                        let retryable = status.as_u16() == 429 || status.is_server_error();
                        let detail: String =
                            resp.text().await.unwrap_or_default().chars().take(500).collect();
                        last_err = format!("HTTP {status}: {detail}");
                        if !retryable {
                            return Err(AppError::SummarizerFailed(last_err));
                        }
                    }
                }
                Err(e) => last_err = format!("transport error: {e}"),
            }

            if attempt < MAX_ATTEMPTS {
                tracing::warn!(attempt, error = %last_err, "summarizer call failed, retrying");
                tokio::time::sleep(Duration::from_millis(600 * u64::from(attempt))).await;
            }
        }

        Err(AppError::SummarizerFailed(last_err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_pick_distinct_prompts_and_temperatures() {
        let conv = request_body(SummaryMode::Conversation, "m", "input");
        let ana = request_body(SummaryMode::Analysis, "m", "input");
        assert_ne!(conv["messages"][0]["content"], ana["messages"][0]["content"]);
        assert!(conv["temperature"].as_f64() > ana["temperature"].as_f64());
    }

    #[test]
    fn request_carries_model_and_input() {
        let body = request_body(SummaryMode::Analysis, "gpt-4o-mini", "the posts");
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][1]["content"], "the posts");
    }

    #[tokio::test]
    async fn missing_api_key_fails_fast() {
        let ai = OpenAiSummarizer::new("");
        let err = ai
            .summarize(SummaryMode::Conversation, "m", "input")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::SummarizerFailed(msg) if msg.contains("OPENAI_API_KEY")));
    }
}
