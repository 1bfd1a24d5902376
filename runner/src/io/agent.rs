//! Agent runner abstraction.
//!
//! The [`AgentRunner`] trait decouples the loop controller from the actual
//! agent backend (a ReAct agent over a chat model and a search tool). Tests
//! use scripted runners that return predetermined chunks without any network.

use anyhow::Result;
use tracing::{debug, instrument};

use crate::core::types::{AgentInput, AgentOutput};

/// Given text context, produce the next block of generated text.
pub trait AgentRunner {
    fn run(&self, input: &AgentInput) -> Result<AgentOutput>;
}

impl<A: AgentRunner + ?Sized> AgentRunner for &A {
    fn run(&self, input: &AgentInput) -> Result<AgentOutput> {
        (**self).run(input)
    }
}

/// Invoke `runner` with `context` and return the generated chunk.
#[instrument(skip_all, fields(context_bytes = context.len()))]
pub fn generate_chunk<A: AgentRunner>(runner: &A, context: String) -> Result<String> {
    let output = runner.run(&AgentInput::new(context))?;
    debug!(output_bytes = output.output.len(), "agent returned");
    Ok(output.output)
}
