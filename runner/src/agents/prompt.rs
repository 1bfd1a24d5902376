//! Prompt rendering for the ReAct agent.

use anyhow::Result;
use minijinja::{Environment, context};
use tracing::debug;

const REACT_TEMPLATE: &str = include_str!("prompts/react.md");

/// Values substituted into the ReAct template.
#[derive(Debug, Clone)]
pub struct PromptInputs<'a> {
    /// `name: description` lines, one per tool.
    pub tools: &'a str,
    /// Comma-separated tool names.
    pub tool_names: &'a str,
    /// Plan text so far (may be empty).
    pub input: &'a str,
    /// Completed Thought/Action/Observation turns.
    pub agent_scratchpad: &'a str,
    /// Word the agent should emit once the plan is complete.
    pub sentinel: &'a str,
}

/// Template engine wrapper around minijinja.
#[derive(Debug)]
pub struct ReactPrompt {
    env: Environment<'static>,
}

impl ReactPrompt {
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template("react", REACT_TEMPLATE)
            .expect("react template should be valid");
        Self { env }
    }

    pub fn render(&self, inputs: &PromptInputs<'_>) -> Result<String> {
        let template = self.env.get_template("react")?;
        let rendered = template.render(context! {
            tools => inputs.tools,
            tool_names => inputs.tool_names,
            input => (!inputs.input.trim().is_empty()).then_some(inputs.input),
            agent_scratchpad => inputs.agent_scratchpad,
            sentinel => inputs.sentinel,
        })?;
        debug!(bytes = rendered.len(), "rendered react prompt");
        Ok(rendered)
    }
}

impl Default for ReactPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs<'a>(input: &'a str, scratchpad: &'a str) -> PromptInputs<'a> {
        PromptInputs {
            tools: "InternetSearch: search the web",
            tool_names: "InternetSearch",
            input,
            agent_scratchpad: scratchpad,
            sentinel: "FINISHED",
        }
    }

    #[test]
    fn renders_tools_input_and_scratchpad() {
        let prompt = ReactPrompt::new()
            .render(&inputs("# Plan\n\n## Problem", " searching\nObservation: x\nThought: "))
            .expect("render");
        assert!(prompt.contains("InternetSearch: search the web"));
        assert!(prompt.contains("one of [InternetSearch]"));
        assert!(prompt.contains("## Problem"));
        assert!(prompt.contains("include the word FINISHED"));
        assert!(prompt.ends_with("Thought: searching\nObservation: x\nThought: "));
    }

    #[test]
    fn blank_input_omits_plan_section() {
        let prompt = ReactPrompt::new().render(&inputs("  \n", "")).expect("render");
        assert!(!prompt.contains("The plan written so far"));
        assert!(prompt.ends_with("Thought:"));
    }
}
