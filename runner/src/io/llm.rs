//! Chat model client for OpenAI-compatible `/chat/completions` endpoints.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::io::config::{ModelConfig, api_key_from_env};

/// A text-in, text-out language model.
pub trait ChatModel {
    /// Complete `prompt`, stopping before any of `stop`.
    fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String>;
}

impl<M: ChatModel + ?Sized> ChatModel for &M {
    fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String> {
        (**self).complete(prompt, stop)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "no_stop")]
    stop: &'a [&'a str],
    stream: bool,
}

fn no_stop(stop: &&[&str]) -> bool {
    stop.is_empty()
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// Blocking client for Groq or any other OpenAI-compatible API.
#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    url: String,
    model: String,
    temperature: f32,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        temperature: f32,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("build chat HTTP client")?;
        Ok(Self {
            url: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.into(),
            temperature,
            api_key: api_key.into(),
            client,
        })
    }

    /// Build a client from config, reading the API key from the environment.
    pub fn from_config(cfg: &ModelConfig) -> Result<Self> {
        let api_key = api_key_from_env(&cfg.api_key_env)?;
        Self::new(
            &cfg.base_url,
            cfg.name.clone(),
            cfg.temperature,
            api_key,
            Duration::from_secs(cfg.timeout_secs),
        )
    }
}

impl ChatModel for ChatCompletionsClient {
    #[instrument(skip_all, fields(model = %self.model, prompt_bytes = prompt.len()))]
    fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String> {
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
            stop,
            stream: false,
        };

        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .context("failed to call chat completions API")?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            warn!(%status, "chat completions returned an error status");
            return Err(anyhow!("chat completions API returned {status}: {detail}"));
        }

        let payload: ChatResponse = resp.json().context("invalid chat completions response")?;
        let content = extract_content(payload)?;
        debug!(reply_bytes = content.len(), "model replied");
        Ok(content)
    }
}

fn extract_content(payload: ChatResponse) -> Result<String> {
    payload
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| anyhow!("chat completions response had no message content"))
}
