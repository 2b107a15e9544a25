//! The optimization loop.
//!
//! One `advance()` call is one optimize → execute → evaluate → analyze
//! → accept/reject cycle. State is committed only after every model
//! call of the iteration has succeeded, so a failure at any step
//! leaves the run exactly as it was and halts auto-mode at the caller.

use anyhow::anyhow;
use tracing::info;

use promptloop_common::{
    Evaluation, HistoryEntry, OutputMap, PromptLoopError, RunPhase, RunState, Verdict,
};

use crate::traits::{ChatModel, StreamSink};
use crate::{analyst, evaluator, executor, generator, optimizer};

/// What one completed iteration looked like. The full record (verdicts,
/// analysis) is the matching [`HistoryEntry`] on the run state.
#[derive(Debug, Clone, Copy)]
pub struct IterationOutcome {
    pub iteration: u32,
    pub accepted: bool,
    pub wins: usize,
    pub losses: usize,
}

/// Count candidate wins and losses. Similar verdicts count for neither.
pub fn tally(evaluations: &Evaluation) -> (usize, usize) {
    let wins = evaluations
        .values()
        .filter(|v| **v == Verdict::CandidateBetter)
        .count();
    let losses = evaluations
        .values()
        .filter(|v| **v == Verdict::CurrentBetter)
        .count();
    (wins, losses)
}

/// Strict majority: the candidate must win MORE samples than it loses.
/// Equal counts (including all-similar) keep the current best.
pub fn should_accept(evaluations: &Evaluation) -> bool {
    let (wins, losses) = tally(evaluations);
    wins > losses
}

/// Drives one optimization run over a [`ChatModel`].
///
/// The harness (CLI or test) owns pacing: it calls [`bootstrap`] once,
/// then [`advance`] until the run reports Finished or the operator
/// stops it.
///
/// [`bootstrap`]: OptimizationRun::bootstrap
/// [`advance`]: OptimizationRun::advance
pub struct OptimizationRun<M: ChatModel> {
    chat: M,
    stream: bool,
    state: RunState,
}

impl<M: ChatModel> OptimizationRun<M> {
    pub fn new(chat: M, state: RunState) -> Self {
        Self {
            chat,
            stream: false,
            state,
        }
    }

    /// Execute samples with streaming, forwarding chunks to the sink.
    pub fn with_streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    /// Read-only access to the underlying chat model.
    pub fn chat(&self) -> &M {
        &self.chat
    }

    pub fn into_state(self) -> RunState {
        self.state
    }

    /// Operator stop: the run is terminal, `advance` becomes a no-op.
    pub fn stop(&mut self) {
        self.state.phase = RunPhase::Finished;
    }

    /// Generate the sample set and the baseline outputs for the
    /// initial prompt. Must run once, before the first `advance`.
    pub async fn bootstrap(&mut self, sink: &mut dyn StreamSink) -> Result<(), PromptLoopError> {
        if self.state.phase != RunPhase::Idle {
            return Err(anyhow!("run already started").into());
        }

        self.state.samples =
            generator::generate_samples(&self.chat, &self.state.task_description).await?;

        let baseline = self
            .execute_over_samples(&self.state.current_best_prompt, sink)
            .await?;
        self.state.current_best_outputs = baseline;
        self.state.phase = RunPhase::Running;

        info!(
            samples = self.state.samples.len(),
            max_iterations = self.state.max_iterations,
            "run bootstrapped"
        );
        Ok(())
    }

    /// Run one full iteration. Returns `Ok(None)` when the run is
    /// already terminal (iteration cap reached or operator stop).
    ///
    /// On error the run state is untouched: the counter, history, best
    /// prompt and best outputs all still describe the last completed
    /// iteration.
    pub async fn advance(
        &mut self,
        sink: &mut dyn StreamSink,
    ) -> Result<Option<IterationOutcome>, PromptLoopError> {
        if self.state.phase == RunPhase::Finished
            || self.state.iteration >= self.state.max_iterations
        {
            self.state.phase = RunPhase::Finished;
            return Ok(None);
        }
        self.state.phase = RunPhase::Running;

        let iteration = self.state.iteration + 1;
        info!(iteration, "proposing candidate prompt");

        // 1. Candidate prompt. Empty or failed aborts the iteration.
        let outputs_json = serde_json::to_string(&self.state.current_best_outputs)
            .map_err(|e| PromptLoopError::Parse(format!("serializing outputs: {e}")))?;
        let candidate = optimizer::propose(
            &self.chat,
            &self.state.current_best_prompt,
            &outputs_json,
            &self.state.task_description,
            &self.state.history_summary(),
        )
        .await?;
        if candidate.trim().is_empty() {
            return Err(PromptLoopError::Parse(
                "optimizer returned an empty candidate prompt".to_string(),
            ));
        }

        // 2. Candidate outputs for every sample, before any judging.
        let candidate_outputs = self.execute_over_samples(&candidate, sink).await?;

        // 3. Judge each sample pair.
        let mut evaluations = Evaluation::new();
        for sample in &self.state.samples {
            let output_a = self
                .state
                .current_best_outputs
                .get(&sample.id)
                .map(String::as_str)
                .unwrap_or("");
            let output_b = candidate_outputs
                .get(&sample.id)
                .map(String::as_str)
                .unwrap_or("");
            let verdict = evaluator::evaluate(
                &self.chat,
                output_a,
                output_b,
                &self.state.task_description,
                &sample.question,
            )
            .await?;
            evaluations.insert(sample.id, verdict);
        }

        // 4. Rationale for the diff.
        let analysis = analyst::analyze(
            &self.chat,
            &self.state.current_best_prompt,
            &candidate,
            &self.state.task_description,
        )
        .await?;

        // 5–6. All model calls succeeded; commit atomically.
        let (wins, losses) = tally(&evaluations);
        let accepted = should_accept(&evaluations);
        self.state.candidate_prompt = candidate.clone();
        self.state.candidate_outputs = candidate_outputs.clone();
        if accepted {
            self.state.current_best_prompt = candidate.clone();
            self.state.current_best_outputs = candidate_outputs;
        }
        self.state.history.push(HistoryEntry {
            iteration,
            prompt: candidate,
            is_better: accepted,
            analysis,
            evaluations,
        });
        self.state.iteration = iteration;
        if self.state.iteration >= self.state.max_iterations {
            self.state.phase = RunPhase::Finished;
        }

        info!(iteration, accepted, wins, losses, "iteration complete");
        Ok(Some(IterationOutcome {
            iteration,
            accepted,
            wins,
            losses,
        }))
    }

    async fn execute_over_samples(
        &self,
        prompt: &str,
        sink: &mut dyn StreamSink,
    ) -> Result<OutputMap, PromptLoopError> {
        let mut outputs = OutputMap::new();
        for sample in &self.state.samples {
            let text = if self.stream {
                sink.begin(sample.id);
                executor::execute_streaming(&self.chat, prompt, &sample.question, &mut |d, acc| {
                    sink.chunk(d, acc)
                })
                .await?
            } else {
                executor::execute(&self.chat, prompt, &sample.question).await?
            };
            outputs.insert(sample.id, text);
        }
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluation(verdicts: &[(u32, Verdict)]) -> Evaluation {
        verdicts.iter().copied().collect()
    }

    #[test]
    fn test_majority_accepts() {
        let eval = evaluation(&[
            (1, Verdict::CandidateBetter),
            (2, Verdict::CandidateBetter),
            (3, Verdict::CurrentBetter),
        ]);
        assert_eq!(tally(&eval), (2, 1));
        assert!(should_accept(&eval));
    }

    #[test]
    fn test_tie_rejects() {
        let eval = evaluation(&[(1, Verdict::CandidateBetter), (2, Verdict::CurrentBetter)]);
        assert_eq!(tally(&eval), (1, 1));
        assert!(!should_accept(&eval));
    }

    #[test]
    fn test_all_similar_rejects() {
        let eval = evaluation(&[
            (1, Verdict::Similar),
            (2, Verdict::Similar),
            (3, Verdict::Similar),
        ]);
        assert_eq!(tally(&eval), (0, 0));
        assert!(!should_accept(&eval));
    }

    #[test]
    fn test_similar_counts_for_neither_side() {
        let eval = evaluation(&[(1, Verdict::CandidateBetter), (2, Verdict::Similar)]);
        assert!(should_accept(&eval));
    }

    #[test]
    fn test_empty_evaluation_rejects() {
        assert!(!should_accept(&Evaluation::new()));
    }
}
