//! Resumable agent loop that grows a markdown business plan.
//!
//! The loop feeds the whole plan written so far to an agent, appends the
//! agent's next chunk to the plan file, and repeats until the chunk looks like
//! the end of the plan. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (completion heuristic, document
//!   model, ReAct reply parsing). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (plan file, config, HTTP clients)
//!   and the [`io::agent::AgentRunner`] seam that tests replace with fakes.
//! - **[`agents`]**: The production ReAct agent over a chat model and a search tool.
//!
//! Orchestration modules ([`step`], [`looping`], [`report`]) coordinate core
//! logic with I/O to implement CLI commands.

pub mod agents;
pub mod core;
pub mod io;
pub mod logging;
pub mod looping;
pub mod report;
pub mod step;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
