//! Explains how a candidate prompt differs from the current best.

use promptloop_common::PromptLoopError;

use crate::traits::ChatModel;

const ANALYZE_TEMPERATURE: f32 = 0.5;

fn analysis_prompt(old_prompt: &str, new_prompt: &str, task_description: &str) -> String {
    format!(
        r#"Analyze the changes between these two prompts and explain how they affect the prompt's effectiveness:

Task description: {task_description}

Old prompt:
{old_prompt}

New prompt:
{new_prompt}

Explain in detail:"#
    )
}

/// Free-text rationale, stored opaque on the history entry.
pub async fn analyze(
    model: &dyn ChatModel,
    old_prompt: &str,
    new_prompt: &str,
    task_description: &str,
) -> Result<String, PromptLoopError> {
    model
        .complete(
            &analysis_prompt(old_prompt, new_prompt, task_description),
            ANALYZE_TEMPERATURE,
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedChat;

    #[tokio::test]
    async fn test_analysis_is_opaque_prose() {
        let chat = ScriptedChat::new().respond("The new prompt adds output constraints.");
        let analysis = analyze(&chat, "old", "new", "task").await.unwrap();
        assert_eq!(analysis, "The new prompt adds output constraints.");
        assert!(chat.requests()[0].contains("Old prompt:\nold"));
    }
}
