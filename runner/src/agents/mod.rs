//! Agent implementations behind [`crate::io::agent::AgentRunner`].

use anyhow::{Context, Result};

use crate::io::config::RunnerConfig;
use crate::io::llm::ChatCompletionsClient;
use crate::io::search::TavilySearch;

pub mod prompt;
pub mod react;

use react::{ReactAgent, ReactConfig};

/// Production agent: chat completions model plus Tavily search.
pub type PlanAgent = ReactAgent<ChatCompletionsClient, TavilySearch>;

/// Build the production agent with a per-invocation budget of `max_steps`.
pub fn build_plan_agent(cfg: &RunnerConfig, max_steps: u32) -> Result<PlanAgent> {
    let model = ChatCompletionsClient::from_config(&cfg.model).context("configure chat model")?;
    let search = TavilySearch::from_config(&cfg.search).context("configure search tool")?;
    Ok(ReactAgent::new(
        model,
        search,
        ReactConfig {
            max_steps,
            handle_parsing_errors: cfg.agent.handle_parsing_errors,
            sentinel: cfg.sentinel.clone(),
        },
    ))
}
