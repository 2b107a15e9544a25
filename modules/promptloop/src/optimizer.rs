//! Proposes a rewritten prompt.

use promptloop_common::PromptLoopError;

use crate::traits::ChatModel;

const OPTIMIZE_TEMPERATURE: f32 = 0.7;

fn optimization_prompt(
    current_prompt: &str,
    current_outputs: &str,
    task_description: &str,
    history_summary: &str,
) -> String {
    format!(
        r#"Rewrite the following prompt so it completes the task more effectively:

Task description: {task_description}

Current prompt:
{current_prompt}

Example outputs produced by the current prompt:
{current_outputs}

Optimization history:
{history_summary}

Return only the complete rewritten prompt, with no commentary."#
    )
}

/// Ask the model for a candidate prompt. The response is used verbatim:
/// no post-processing, no check that it differs from the input. The
/// caller treats an empty candidate or a failed call as fatal for the
/// iteration.
pub async fn propose(
    model: &dyn ChatModel,
    current_prompt: &str,
    current_outputs: &str,
    task_description: &str,
    history_summary: &str,
) -> Result<String, PromptLoopError> {
    model
        .complete(
            &optimization_prompt(
                current_prompt,
                current_outputs,
                task_description,
                history_summary,
            ),
            OPTIMIZE_TEMPERATURE,
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedChat;

    #[tokio::test]
    async fn test_candidate_is_verbatim() {
        let chat = ScriptedChat::new().respond("  A rewritten prompt.\n");
        let candidate = propose(&chat, "old", "{}", "task", "").await.unwrap();
        assert_eq!(candidate, "  A rewritten prompt.\n");
    }

    #[tokio::test]
    async fn test_request_carries_history_summary() {
        let chat = ScriptedChat::new().respond("new prompt");
        propose(&chat, "old", "{}", "task", "iteration 1: improved")
            .await
            .unwrap();
        let requests = chat.requests();
        assert!(requests[0].contains("iteration 1: improved"));
        assert!(requests[0].contains("Current prompt:\nold"));
    }
}
