//! One iteration of the plan loop: scratchpad in, chunk appended, verdict out.

use anyhow::Result;
use tracing::{debug, info, instrument};

use crate::core::completion::{CompletionHeuristic, Verdict};
use crate::core::document::Document;
use crate::core::types::LoopPhase;
use crate::io::agent::{AgentRunner, generate_chunk};
use crate::io::config::RunnerConfig;
use crate::io::store::ContextStore;

/// Settings shared by every iteration.
#[derive(Debug, Clone)]
pub struct StepConfig {
    /// Chunk written into an empty document.
    pub title: String,
    pub heuristic: CompletionHeuristic,
}

impl StepConfig {
    pub fn from_config(cfg: &RunnerConfig) -> Self {
        Self {
            title: cfg.title.clone(),
            heuristic: CompletionHeuristic::new(&cfg.sentinel, cfg.min_chunk_chars),
        }
    }
}

impl Default for StepConfig {
    fn default() -> Self {
        Self::from_config(&RunnerConfig::default())
    }
}

/// Progress notifications emitted while the loop runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepEvent {
    /// The document was empty and the title chunk was written.
    Seeded,
    /// The agent is about to be invoked with a scratchpad of this many characters.
    Resuming { iter: u32, scratchpad_chars: usize },
    /// A chunk was appended and evaluated.
    Checkpoint(StepOutcome),
}

/// Result of a single iteration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    /// Iteration number within this process (1-indexed).
    pub iter: u32,
    pub scratchpad_chars: usize,
    pub chunk_chars: usize,
    pub verdict: Verdict,
}

impl StepOutcome {
    pub fn next_phase(&self) -> LoopPhase {
        if self.verdict.is_finished() {
            LoopPhase::Done
        } else {
            LoopPhase::Running
        }
    }
}

/// INIT: load the document, seeding it with the title if it is blank.
pub fn init_document<F: FnMut(&StepEvent)>(
    store: &ContextStore,
    config: &StepConfig,
    on_event: &mut F,
) -> Result<Document> {
    let (document, seeded) = store.load_or_seed(&config.title)?;
    if seeded {
        info!(path = %store.path().display(), "seeded empty document");
        on_event(&StepEvent::Seeded);
    }
    Ok(document)
}

/// RUNNING: invoke the agent on the full document and append its chunk.
///
/// Nothing is appended if the agent fails; the error is returned as-is.
#[instrument(skip_all, fields(iter = iter))]
pub fn run_step<A: AgentRunner, F: FnMut(&StepEvent)>(
    store: &ContextStore,
    document: &mut Document,
    runner: &A,
    config: &StepConfig,
    iter: u32,
    on_event: &mut F,
) -> Result<StepOutcome> {
    let scratchpad = document.scratchpad();
    let scratchpad_chars = document.char_len();
    on_event(&StepEvent::Resuming {
        iter,
        scratchpad_chars,
    });

    let chunk = generate_chunk(runner, scratchpad)?;
    store.append(document, &chunk)?;
    let verdict = config.heuristic.evaluate(&chunk);
    debug!(verdict = verdict.as_str(), "evaluated chunk");

    let outcome = StepOutcome {
        iter,
        scratchpad_chars,
        chunk_chars: chunk.chars().count(),
        verdict,
    };
    on_event(&StepEvent::Checkpoint(outcome.clone()));
    Ok(outcome)
}
