//! Internet search tool backed by the Tavily search API.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::io::config::{SearchConfig, api_key_from_env};

/// Name the agent uses to call the search tool.
pub const SEARCH_TOOL_NAME: &str = "InternetSearch";

/// Description shown to the model.
pub const SEARCH_TOOL_DESCRIPTION: &str =
    "Use this to search the internet for information, such as frequent problems people face.";

/// A tool that turns a query into observation text.
pub trait SearchTool {
    fn search(&self, query: &str) -> Result<String>;
}

impl<S: SearchTool + ?Sized> SearchTool for &S {
    fn search(&self, query: &str) -> Result<String> {
        (**self).search(query)
    }
}

/// One search hit, reduced to what the agent sees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub url: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: u32,
    search_depth: &'a str,
    include_answer: bool,
    include_raw_content: bool,
    include_images: bool,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Blocking Tavily client.
#[derive(Debug, Clone)]
pub struct TavilySearch {
    url: String,
    api_key: String,
    max_results: u32,
    client: reqwest::blocking::Client,
}

impl TavilySearch {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        max_results: u32,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("build search HTTP client")?;
        Ok(Self {
            url: format!("{}/search", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            max_results,
            client,
        })
    }

    /// Build a client from config, reading the API key from the environment.
    pub fn from_config(cfg: &SearchConfig) -> Result<Self> {
        let api_key = api_key_from_env(&cfg.api_key_env)?;
        Self::new(
            &cfg.base_url,
            api_key,
            cfg.max_results,
            Duration::from_secs(cfg.timeout_secs),
        )
    }
}

impl SearchTool for TavilySearch {
    #[instrument(skip(self), fields(max_results = self.max_results))]
    fn search(&self, query: &str) -> Result<String> {
        let body = SearchRequest {
            query,
            max_results: self.max_results,
            search_depth: "advanced",
            include_answer: false,
            include_raw_content: false,
            include_images: false,
        };
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .context("failed to call search API")?;
        let status = resp.status();
        if !status.is_success() {
            let detail = resp.text().unwrap_or_default();
            warn!(%status, "search returned an error status");
            return Err(anyhow!("search API returned {status}: {detail}"));
        }
        let payload: SearchResponse = resp.json().context("invalid search response")?;
        debug!(hits = payload.results.len(), "search completed");
        format_hits(&payload.results)
    }
}

/// Render hits as the JSON list the agent reads as its observation.
pub fn format_hits(hits: &[SearchHit]) -> Result<String> {
    serde_json::to_string(hits).context("serialize search hits")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{serve_once, serve_silence};

    fn local_search(base_url: &str, timeout: Duration) -> TavilySearch {
        TavilySearch {
            url: format!("{base_url}/search"),
            api_key: "test-key".to_string(),
            max_results: 5,
            client: reqwest::blocking::Client::builder()
                .no_proxy()
                .timeout(timeout)
                .build()
                .expect("client"),
        }
    }

    #[test]
    fn search_formats_server_hits() {
        let base = serve_once(
            "200 OK",
            r#"{"results":[{"title":"T","url":"https://a.example","content":"pain","score":0.5}]}"#,
        )
        .expect("stub");
        let search = local_search(&base, Duration::from_secs(10));

        let observation = search.search("saas pain points").expect("search");
        assert_eq!(observation, r#"[{"url":"https://a.example","content":"pain"}]"#);
    }

    #[test]
    fn error_status_is_an_error_with_status() {
        let base = serve_once("500 Internal Server Error", r#"{"detail":"upstream"}"#).expect("stub");
        let search = local_search(&base, Duration::from_secs(10));

        let err = search.search("saas pain points").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("500"), "{message}");
        assert!(message.contains("upstream"), "{message}");
    }

    #[test]
    fn agent_keeps_going_after_search_error_status() {
        use crate::agents::react::{ReactAgent, ReactConfig};
        use crate::core::types::AgentInput;
        use crate::io::agent::AgentRunner;
        use crate::test_support::ScriptedChat;

        let base = serve_once("502 Bad Gateway", "bad gateway").expect("stub");
        let search = local_search(&base, Duration::from_secs(10));
        let chat = ScriptedChat::new(vec![
            "Action: InternetSearch\nAction Input: saas pain points",
            "Final Answer: ## Problem\nWritten without search results.",
        ]);
        let agent = ReactAgent::new(
            &chat,
            &search,
            ReactConfig {
                max_steps: 3,
                handle_parsing_errors: true,
                sentinel: "FINISHED".to_string(),
            },
        );

        let output = agent.run(&AgentInput::new("# Plan")).expect("run");

        assert_eq!(output.output, "## Problem\nWritten without search results.");
        assert!(chat.prompts()[1].contains("Observation: search API returned 502 Bad Gateway"));
    }

    #[test]
    fn unresponsive_server_times_out() {
        let base = serve_silence(Duration::from_secs(5)).expect("stub");
        let search = local_search(&base, Duration::from_millis(300));

        let err = search.search("saas pain points").unwrap_err();
        assert!(format!("{err:#}").contains("failed to call search API"));
    }

    #[test]
    fn response_keeps_url_and_content_only() {
        let payload: SearchResponse = serde_json::from_str(
            r#"{"query":"q","results":[{"title":"T","url":"https://a.example","content":"pain","score":0.9}]}"#,
        )
        .expect("parse");
        assert_eq!(
            payload.results,
            vec![SearchHit {
                url: "https://a.example".to_string(),
                content: "pain".to_string(),
            }]
        );
        assert_eq!(
            format_hits(&payload.results).expect("format"),
            r#"[{"url":"https://a.example","content":"pain"}]"#
        );
    }

    #[test]
    fn missing_results_is_empty_list() {
        let payload: SearchResponse = serde_json::from_str("{}").expect("parse");
        assert!(payload.results.is_empty());
        assert_eq!(format_hits(&payload.results).expect("format"), "[]");
    }

    #[test]
    fn request_carries_result_limit() {
        let body = SearchRequest {
            query: "saas pain points",
            max_results: 5,
            search_depth: "advanced",
            include_answer: false,
            include_raw_content: false,
            include_images: false,
        };
        let value = serde_json::to_value(&body).expect("serialize");
        assert_eq!(value["max_results"], 5);
        assert_eq!(value["query"], "saas pain points");
    }
}
