//! ReAct agent: think, call a tool, observe, repeat until a final answer.
//!
//! Each [`AgentRunner::run`] call is bounded by `max_steps` model calls. When
//! the budget runs out the agent returns a fixed stop message rather than an
//! error, so the outer loop keeps the partial progress and carries on.

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::agents::prompt::{PromptInputs, ReactPrompt};
use crate::core::react::{AgentStep, format_scratchpad, parse_react_output};
use crate::core::types::{AgentInput, AgentOutput};
use crate::io::agent::AgentRunner;
use crate::io::llm::ChatModel;
use crate::io::search::{SEARCH_TOOL_DESCRIPTION, SEARCH_TOOL_NAME, SearchTool};

/// The model stops generating before it invents its own observation.
pub const STOP_SEQUENCE: &str = "\nObservation";

/// Output returned when the step budget is exhausted.
pub const ITERATION_LIMIT_OUTPUT: &str = "Agent stopped due to iteration limit or time limit.";

/// Settings for a ReAct agent invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactConfig {
    /// Model calls allowed per invocation.
    pub max_steps: u32,
    /// Feed malformed replies back as observations instead of failing.
    pub handle_parsing_errors: bool,
    /// Completion word advertised in the prompt.
    pub sentinel: String,
}

/// ReAct agent over a chat model with a single internet search tool.
#[derive(Debug)]
pub struct ReactAgent<M, S> {
    model: M,
    search: S,
    config: ReactConfig,
    prompt: ReactPrompt,
}

impl<M: ChatModel, S: SearchTool> ReactAgent<M, S> {
    pub fn new(model: M, search: S, config: ReactConfig) -> Self {
        Self {
            model,
            search,
            config,
            prompt: ReactPrompt::new(),
        }
    }

    /// Run the requested tool and return its observation.
    ///
    /// Tool failures become observation text so the model can retry or move on.
    fn use_tool(&self, tool: &str, tool_input: &str) -> String {
        if tool != SEARCH_TOOL_NAME {
            warn!(tool, "model requested an unknown tool");
            return format!("{tool} is not a valid tool, try one of [{SEARCH_TOOL_NAME}].");
        }
        match self.search.search(tool_input) {
            Ok(observation) => observation,
            Err(err) => {
                let observation = format!("{err:#}");
                warn!(error = %observation, "search failed, reporting it to the model");
                observation
            }
        }
    }
}

impl<M: ChatModel, S: SearchTool> AgentRunner for ReactAgent<M, S> {
    #[instrument(skip_all, fields(max_steps = self.config.max_steps, input_bytes = input.input.len()))]
    fn run(&self, input: &AgentInput) -> Result<AgentOutput> {
        let tools = format!("{SEARCH_TOOL_NAME}: {SEARCH_TOOL_DESCRIPTION}");
        let mut steps: Vec<(String, String)> = Vec::new();

        for step in 1..=self.config.max_steps {
            let scratchpad = format_scratchpad(&steps);
            let prompt = self.prompt.render(&PromptInputs {
                tools: &tools,
                tool_names: SEARCH_TOOL_NAME,
                input: &input.input,
                agent_scratchpad: &scratchpad,
                sentinel: &self.config.sentinel,
            })?;
            let reply = self.model.complete(&prompt, &[STOP_SEQUENCE])?;

            match parse_react_output(&reply) {
                Ok(AgentStep::Finish { output, .. }) => {
                    info!(step, output_bytes = output.len(), "agent finished");
                    return Ok(AgentOutput::new(output));
                }
                Ok(AgentStep::Action {
                    tool,
                    tool_input,
                    log,
                }) => {
                    debug!(step, tool = %tool, "agent action");
                    let observation = self.use_tool(&tool, &tool_input);
                    steps.push((log, observation));
                }
                Err(err) if self.config.handle_parsing_errors => {
                    warn!(step, error = %err, "unparseable reply fed back as observation");
                    steps.push((err.llm_output, err.observation));
                }
                Err(err) => return Err(err.into()),
            }
        }

        warn!(max_steps = self.config.max_steps, "agent step budget exhausted");
        Ok(AgentOutput::new(ITERATION_LIMIT_OUTPUT))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::react::{MISSING_ACTION_MESSAGE, OutputParseError};
    use crate::test_support::{ScriptedChat, ScriptedSearch};

    fn config(max_steps: u32, handle_parsing_errors: bool) -> ReactConfig {
        ReactConfig {
            max_steps,
            handle_parsing_errors,
            sentinel: "FINISHED".to_string(),
        }
    }

    #[test]
    fn action_then_final_answer() {
        let chat = ScriptedChat::new(vec![
            "I should look for problems.\nAction: InternetSearch\nAction Input: \"invoice chasing pain\"",
            "I now know the final answer\nFinal Answer: ## Problem\nFreelancers chase late invoices.",
        ]);
        let search = ScriptedSearch::new(r#"[{"url":"https://x.example","content":"late invoices"}]"#);
        let agent = ReactAgent::new(&chat, &search, config(5, true));

        let output = agent.run(&AgentInput::new("# Plan")).expect("run");

        assert_eq!(output.output, "## Problem\nFreelancers chase late invoices.");
        assert_eq!(search.queries(), vec!["invoice chasing pain".to_string()]);
        chat.assert_drained().expect("chat drained");

        let prompts = chat.prompts();
        assert_eq!(prompts.len(), 2);
        assert!(prompts[0].contains("# Plan"));
        assert!(prompts[1].contains("\nObservation: [{\"url\":\"https://x.example\""));
        assert_eq!(chat.stops(), vec![STOP_SEQUENCE.to_string(); 2]);
    }

    #[test]
    fn unknown_tool_is_reported_to_the_model() {
        let chat = ScriptedChat::new(vec![
            "Action: Calculator\nAction Input: 2+2",
            "Final Answer: done with a long enough answer",
        ]);
        let search = ScriptedSearch::new("[]");
        let agent = ReactAgent::new(&chat, &search, config(5, true));

        agent.run(&AgentInput::new("")).expect("run");

        assert!(search.queries().is_empty());
        assert!(
            chat.prompts()[1]
                .contains("Observation: Calculator is not a valid tool, try one of [InternetSearch].")
        );
    }

    #[test]
    fn parse_errors_become_observations_when_handled() {
        let chat = ScriptedChat::new(vec!["I am rambling", "Final Answer: recovered"]);
        let search = ScriptedSearch::new("[]");
        let agent = ReactAgent::new(&chat, &search, config(5, true));

        let output = agent.run(&AgentInput::new("")).expect("run");

        assert_eq!(output.output, "recovered");
        assert!(
            chat.prompts()[1].contains(&format!("I am rambling\nObservation: {MISSING_ACTION_MESSAGE}"))
        );
    }

    #[test]
    fn parse_errors_propagate_when_not_handled() {
        let chat = ScriptedChat::new(vec!["I am rambling"]);
        let search = ScriptedSearch::new("[]");
        let agent = ReactAgent::new(&chat, &search, config(5, false));

        let err = agent.run(&AgentInput::new("")).unwrap_err();

        let parse_err = err
            .downcast_ref::<OutputParseError>()
            .expect("parse error type");
        assert_eq!(parse_err.llm_output, "I am rambling");
    }

    #[test]
    fn step_budget_returns_stop_message() {
        let chat = ScriptedChat::new(vec![
            "Action: InternetSearch\nAction Input: a",
            "Action: InternetSearch\nAction Input: b",
        ]);
        let search = ScriptedSearch::new("[]");
        let agent = ReactAgent::new(&chat, &search, config(2, true));

        let output = agent.run(&AgentInput::new("")).expect("run");

        assert_eq!(output.output, ITERATION_LIMIT_OUTPUT);
        assert_eq!(search.queries(), vec!["a".to_string(), "b".to_string()]);
        chat.assert_drained().expect("chat drained");
    }

    #[test]
    fn search_failure_is_fed_back_as_observation() {
        let chat = ScriptedChat::new(vec![
            "Action: InternetSearch\nAction Input: churn in niche CRMs",
            "Final Answer: ## Problem\nSmall agencies lose clients to missed follow-ups.",
        ]);
        let search = ScriptedSearch::failing("search API returned 502 Bad Gateway");
        let agent = ReactAgent::new(&chat, &search, config(5, true));

        let output = agent.run(&AgentInput::new("# Plan")).expect("run");

        assert_eq!(
            output.output,
            "## Problem\nSmall agencies lose clients to missed follow-ups."
        );
        assert_eq!(search.queries(), vec!["churn in niche CRMs".to_string()]);
        assert!(
            chat.prompts()[1].contains("\nObservation: search API returned 502 Bad Gateway\nThought: ")
        );
        chat.assert_drained().expect("chat drained");
    }

    #[test]
    fn model_errors_propagate() {
        let chat = ScriptedChat::new(Vec::new());
        let search = ScriptedSearch::new("[]");
        let agent = ReactAgent::new(&chat, &search, config(3, true));

        let err = agent.run(&AgentInput::new("")).unwrap_err();
        assert!(err.to_string().contains("no scripted chat reply"));
    }
}
