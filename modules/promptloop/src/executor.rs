//! Runs a prompt against one question.

use promptloop_common::PromptLoopError;

use crate::traits::ChatModel;

const EXECUTE_TEMPERATURE: f32 = 0.3;

fn full_prompt(prompt: &str, question: &str) -> String {
    format!("{prompt}\n\n{question}")
}

pub async fn execute(
    model: &dyn ChatModel,
    prompt: &str,
    question: &str,
) -> Result<String, PromptLoopError> {
    model
        .complete(&full_prompt(prompt, question), EXECUTE_TEMPERATURE)
        .await
}

/// Streaming variant. `on_chunk` receives (delta, accumulated); the
/// returned text is the full accumulation, identical to what
/// [`execute`] would return for the same response.
pub async fn execute_streaming(
    model: &dyn ChatModel,
    prompt: &str,
    question: &str,
    on_chunk: &mut (dyn FnMut(&str, &str) + Send),
) -> Result<String, PromptLoopError> {
    model
        .complete_stream(&full_prompt(prompt, question), EXECUTE_TEMPERATURE, on_chunk)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedChat;

    #[test]
    fn test_full_prompt_layout() {
        assert_eq!(full_prompt("Be terse.", "What is 2+2?"), "Be terse.\n\nWhat is 2+2?");
    }

    #[tokio::test]
    async fn test_streaming_accumulates_to_same_text() {
        let chat = ScriptedChat::new()
            .respond("a deterministic response")
            .respond("a deterministic response");

        let plain = execute(&chat, "p", "q").await.unwrap();

        let mut deltas = Vec::new();
        let streamed = execute_streaming(&chat, "p", "q", &mut |delta, _acc| {
            deltas.push(delta.to_string());
        })
        .await
        .unwrap();

        assert_eq!(plain, streamed);
        assert_eq!(deltas.concat(), streamed);
        assert!(deltas.len() > 1);
    }
}
