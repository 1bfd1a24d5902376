//! Parsing of ReAct-formatted model replies.
//!
//! A reply either names a tool to call (`Action:` / `Action Input:`) or ends the
//! run with `Final Answer:`. Anything else is an [`OutputParseError`], which the
//! agent may turn into an observation instead of failing.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

pub const FINAL_ANSWER_PREFIX: &str = "Final Answer:";

pub const MISSING_ACTION_MESSAGE: &str = "Invalid Format: Missing 'Action:' after 'Thought:'";
pub const MISSING_ACTION_INPUT_MESSAGE: &str =
    "Invalid Format: Missing 'Action Input:' after 'Action:'";
pub const INCOMPLETE_RESPONSE_OBSERVATION: &str = "Invalid or incomplete response";

static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
        .expect("action regex should be valid")
});
static ACTION_ONLY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Action\s*\d*\s*:").expect("action regex should be valid"));
static ACTION_INPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)[\s]*Action\s*\d*\s*Input\s*\d*\s*:").expect("input regex should be valid")
});

/// One parsed model turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    /// Call `tool` with `tool_input`. `log` is the raw reply.
    Action {
        tool: String,
        tool_input: String,
        log: String,
    },
    /// Stop and return `output`.
    Finish { output: String, log: String },
}

/// A reply that follows neither the action nor the final-answer format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputParseError {
    /// Human-readable reason.
    pub message: String,
    /// Text fed back to the model when parse errors are handled.
    pub observation: String,
    /// The offending reply.
    pub llm_output: String,
}

impl fmt::Display for OutputParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for OutputParseError {}

/// Parse a single ReAct reply.
pub fn parse_react_output(text: &str) -> Result<AgentStep, OutputParseError> {
    let includes_answer = text.contains(FINAL_ANSWER_PREFIX);

    if let Some(caps) = ACTION_RE.captures(text) {
        if includes_answer {
            return Err(OutputParseError {
                message: format!(
                    "Parsing LLM output produced both a final answer and a parse-able action:: {text}"
                ),
                observation: INCOMPLETE_RESPONSE_OBSERVATION.to_string(),
                llm_output: text.to_string(),
            });
        }
        let tool = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();
        let tool_input = caps
            .get(2)
            .map_or("", |m| m.as_str())
            .trim_matches(' ')
            .trim_matches('"')
            .to_string();
        return Ok(AgentStep::Action {
            tool,
            tool_input,
            log: text.to_string(),
        });
    }

    if includes_answer {
        let output = text
            .rsplit(FINAL_ANSWER_PREFIX)
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();
        return Ok(AgentStep::Finish {
            output,
            log: text.to_string(),
        });
    }

    let (message, observation) = if !ACTION_ONLY_RE.is_match(text) {
        (
            MISSING_ACTION_MESSAGE.to_string(),
            MISSING_ACTION_MESSAGE.to_string(),
        )
    } else if !ACTION_INPUT_RE.is_match(text) {
        (
            MISSING_ACTION_INPUT_MESSAGE.to_string(),
            MISSING_ACTION_INPUT_MESSAGE.to_string(),
        )
    } else {
        (
            format!("Could not parse LLM output: `{text}`"),
            INCOMPLETE_RESPONSE_OBSERVATION.to_string(),
        )
    };
    Err(OutputParseError {
        message,
        observation,
        llm_output: text.to_string(),
    })
}

/// Render completed steps as the `agent_scratchpad` prompt section.
pub fn format_scratchpad(steps: &[(String, String)]) -> String {
    let mut thoughts = String::new();
    for (log, observation) in steps {
        thoughts.push_str(log);
        thoughts.push_str("\nObservation: ");
        thoughts.push_str(observation);
        thoughts.push_str("\nThought: ");
    }
    thoughts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_action_and_input() {
        let text = "Thought: look for pain points\nAction: InternetSearch\nAction Input: \"common freelancer invoicing problems\"";
        let step = parse_react_output(text).expect("parse");
        assert_eq!(
            step,
            AgentStep::Action {
                tool: "InternetSearch".to_string(),
                tool_input: "common freelancer invoicing problems".to_string(),
                log: text.to_string(),
            }
        );
    }

    #[test]
    fn parses_final_answer_after_last_marker() {
        let text = "Thought: I know enough\nFinal Answer: draft\nFinal Answer:  ## Plan\nShip it. ";
        let step = parse_react_output(text).expect("parse");
        assert_eq!(
            step,
            AgentStep::Finish {
                output: "## Plan\nShip it.".to_string(),
                log: text.to_string(),
            }
        );
    }

    #[test]
    fn action_with_final_answer_is_an_error() {
        let text = "Action: InternetSearch\nAction Input: x\nFinal Answer: y";
        let err = parse_react_output(text).unwrap_err();
        assert!(err.message.contains("both a final answer and a parse-able action"));
        assert_eq!(err.observation, INCOMPLETE_RESPONSE_OBSERVATION);
    }

    #[test]
    fn missing_action_is_reported() {
        let err = parse_react_output("Thought: hmm, not sure").unwrap_err();
        assert_eq!(err.observation, MISSING_ACTION_MESSAGE);
        assert_eq!(err.llm_output, "Thought: hmm, not sure");
    }

    #[test]
    fn missing_action_input_is_reported() {
        let err = parse_react_output("Thought: search\nAction: InternetSearch").unwrap_err();
        assert_eq!(err.observation, MISSING_ACTION_INPUT_MESSAGE);
    }

    #[test]
    fn scratchpad_interleaves_observations() {
        let steps = vec![
            ("Action: A\nAction Input: 1".to_string(), "r1".to_string()),
            ("Action: A\nAction Input: 2".to_string(), "r2".to_string()),
        ];
        assert_eq!(
            format_scratchpad(&steps),
            "Action: A\nAction Input: 1\nObservation: r1\nThought: Action: A\nAction Input: 2\nObservation: r2\nThought: "
        );
    }
}
