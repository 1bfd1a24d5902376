//! Loop controller for `plan-runner run`.

use anyhow::Result;
use tracing::{debug, info};

use crate::core::completion::Verdict;
use crate::core::types::LoopPhase;
use crate::io::agent::AgentRunner;
use crate::io::store::ContextStore;
use crate::step::{StepConfig, StepEvent, init_document, run_step};

/// Summary of a loop invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    /// Agent invocations made by this process.
    pub iterations: u32,
    /// Verdict that ended the loop.
    pub verdict: Verdict,
    /// Final document length in characters.
    pub document_chars: usize,
}

/// Run iterations until the completion heuristic reports the plan finished.
///
/// There is no iteration cap here: each agent call is bounded by its own step
/// budget, but the loop itself continues for as long as chunks look unfinished.
/// Any agent or storage error stops the loop immediately; completed chunks stay
/// on disk, so calling this again resumes from where it stopped.
pub fn run_loop<A: AgentRunner, F: FnMut(&StepEvent)>(
    store: &ContextStore,
    runner: &A,
    config: &StepConfig,
    mut on_event: F,
) -> Result<LoopOutcome> {
    let mut phase = LoopPhase::Init;
    debug!(?phase, path = %store.path().display(), "loop starting");
    let mut document = init_document(store, config, &mut on_event)?;

    let mut iter = 0u32;
    loop {
        iter += 1;
        let step = run_step(store, &mut document, runner, config, iter, &mut on_event)?;
        phase = step.next_phase();
        debug!(?phase, iter, verdict = step.verdict.as_str(), "iteration finished");

        if phase == LoopPhase::Done {
            info!(iterations = iter, verdict = step.verdict.as_str(), "plan appears complete");
            return Ok(LoopOutcome {
                iterations: iter,
                verdict: step.verdict,
                document_chars: document.char_len(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedAgent, TempPlan, long_chunk};

    #[test]
    fn loop_stops_on_sentinel() {
        let plan = TempPlan::new().expect("temp plan");
        let agent = ScriptedAgent::outputs(vec![
            long_chunk("Problem"),
            format!("{} All sections written. FINISHED", long_chunk("Launch")),
        ]);

        let outcome = run_loop(&plan.store, &agent, &StepConfig::default(), |_| {}).expect("loop");

        assert_eq!(outcome.iterations, 2);
        assert_eq!(outcome.verdict, Verdict::Sentinel);
        agent.assert_drained().expect("drained");
    }

    #[test]
    fn each_call_sees_everything_written_before_it() {
        let plan = TempPlan::new().expect("temp plan");
        let a = long_chunk("A");
        let b = long_chunk("B");
        let agent = ScriptedAgent::outputs(vec![a.clone(), b.clone(), "stop".to_string()]);
        let config = StepConfig::default();

        run_loop(&plan.store, &agent, &config, |_| {}).expect("loop");

        let inputs = agent.inputs();
        assert_eq!(inputs.len(), 3);
        assert_eq!(inputs[0], config.title);
        assert_eq!(inputs[1], format!("{}\n{a}", config.title));
        assert_eq!(inputs[2], format!("{}\n{a}\n{b}", config.title));
    }

    #[test]
    fn agent_error_stops_the_loop() {
        let plan = TempPlan::new().expect("temp plan");
        let agent = ScriptedAgent::new(vec![
            Ok(long_chunk("A")),
            Err("model unavailable".to_string()),
        ]);

        let err = run_loop(&plan.store, &agent, &StepConfig::default(), |_| {}).unwrap_err();

        assert!(err.to_string().contains("model unavailable"));
        let text = plan.read().expect("read");
        assert!(text.ends_with(&long_chunk("A")));
    }
}
