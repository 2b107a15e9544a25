//! Pairwise output judging.

use promptloop_common::{PromptLoopError, Verdict};

use crate::traits::ChatModel;

const EVALUATE_TEMPERATURE: f32 = 0.3;

/// Preference phrases the judge is instructed to emit. Classification
/// is substring matching against these, nothing more.
const CURRENT_WINS: &str = "A is better";
const CANDIDATE_WINS: &str = "B is better";

fn evaluation_prompt(
    output_a: &str,
    output_b: &str,
    task_description: &str,
    question: &str,
) -> String {
    format!(
        r#"Evaluate which of the two outputs below better completes the task:

Task description: {task_description}

Question: {question}

Output A:
{output_a}

Output B:
{output_b}

Give a detailed assessment, then state your verdict on its own line as exactly "A is better", "B is better", or "similar"."#
    )
}

/// Classify a judge response by substring match. "A" is checked before
/// "B"; any response containing neither phrase (refusals, hedges,
/// unexpected wording) is a tie. An unreadable verdict must never move
/// the best prompt.
pub fn classify(verdict_text: &str) -> Verdict {
    if verdict_text.contains(CURRENT_WINS) {
        Verdict::CurrentBetter
    } else if verdict_text.contains(CANDIDATE_WINS) {
        Verdict::CandidateBetter
    } else {
        Verdict::Similar
    }
}

/// Judge one sample's pair of outputs. A = current best, B = candidate.
pub async fn evaluate(
    model: &dyn ChatModel,
    output_a: &str,
    output_b: &str,
    task_description: &str,
    question: &str,
) -> Result<Verdict, PromptLoopError> {
    let response = model
        .complete(
            &evaluation_prompt(output_a, output_b, task_description, question),
            EVALUATE_TEMPERATURE,
        )
        .await?;

    Ok(classify(&response))
}
