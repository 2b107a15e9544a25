//! Test sample generation.

use serde::Deserialize;
use tracing::{info, warn};

use promptloop_common::{PromptLoopError, Sample};

use crate::traits::ChatModel;

const GENERATE_TEMPERATURE: f32 = 0.7;

fn generation_prompt(task_description: &str) -> String {
    format!(
        r#"Generate 5 test samples for the following task. Each sample should contain a question and the standard a good answer is expected to meet.

Task description: {task_description}

Return JSON in this format:
[
    {{"question": "question 1", "expected": "expected standard 1"}},
    ...
]"#
    )
}

/// What the model is asked to emit per sample. Any `id` the model adds
/// is ignored; ids are assigned by position after parsing.
#[derive(Debug, Deserialize)]
struct RawSample {
    question: String,
    expected: String,
}

/// Locate the JSON array in the raw model text (first `[` to last `]`)
/// and decode it. Ids are sequential and 1-based, in generation order.
fn parse_samples(raw: &str) -> Result<Vec<Sample>, PromptLoopError> {
    let start = raw
        .find('[')
        .ok_or_else(|| PromptLoopError::Parse("no JSON array in generator output".to_string()))?;
    let end = raw
        .rfind(']')
        .filter(|&end| end > start)
        .ok_or_else(|| PromptLoopError::Parse("unterminated JSON array in generator output".to_string()))?;

    let raw_samples: Vec<RawSample> = serde_json::from_str(&raw[start..=end])
        .map_err(|e| PromptLoopError::Parse(format!("generator output is not valid JSON: {e}")))?;

    Ok(raw_samples
        .into_iter()
        .enumerate()
        .map(|(i, s)| Sample {
            id: i as u32 + 1,
            question: s.question,
            expected: s.expected,
        })
        .collect())
}

/// The degraded sample set used when the model's output cannot be
/// parsed. Callers treat these as valid input to the rest of the run.
fn fallback_samples() -> Vec<Sample> {
    vec![
        Sample {
            id: 1,
            question: "Example question 1".to_string(),
            expected: "Expected answer standard 1".to_string(),
        },
        Sample {
            id: 2,
            question: "Example question 2".to_string(),
            expected: "Expected answer standard 2".to_string(),
        },
    ]
}

/// Ask the model for a sample set for `task_description`.
///
/// Gateway failures propagate. Unparseable output does NOT: the run
/// degrades to the fixed fallback set so optimization can still
/// proceed against something.
pub async fn generate_samples(
    model: &dyn ChatModel,
    task_description: &str,
) -> Result<Vec<Sample>, PromptLoopError> {
    let raw = model
        .complete(&generation_prompt(task_description), GENERATE_TEMPERATURE)
        .await?;

    match parse_samples(&raw) {
        Ok(samples) => {
            info!(count = samples.len(), "generated test samples");
            Ok(samples)
        }
        Err(err) => {
            warn!(%err, "sample generation output unparseable, using fallback samples");
            Ok(fallback_samples())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedChat;

    #[test]
    fn test_parse_samples_assigns_sequential_ids() {
        let raw = r#"[
            {"question": "q1", "expected": "e1"},
            {"question": "q2", "expected": "e2"},
            {"question": "q3", "expected": "e3"}
        ]"#;
        let samples = parse_samples(raw).unwrap();
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0].id, 1);
        assert_eq!(samples[2].id, 3);
        assert_eq!(samples[1].question, "q2");
    }

    #[test]
    fn test_parse_samples_overwrites_model_emitted_ids() {
        let raw = r#"[{"id": 99, "question": "q", "expected": "e"}]"#;
        let samples = parse_samples(raw).unwrap();
        assert_eq!(samples[0].id, 1);
    }

    #[test]
    fn test_parse_samples_ignores_surrounding_prose() {
        let raw = "Here are your samples:\n```json\n[{\"question\": \"q\", \"expected\": \"e\"}]\n```\nEnjoy!";
        let samples = parse_samples(raw).unwrap();
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_parse_samples_rejects_non_json() {
        assert!(parse_samples("I cannot help with that.").is_err());
        assert!(parse_samples("[ broken").is_err());
    }

    #[tokio::test]
    async fn test_fallback_on_unparseable_output() {
        let chat = ScriptedChat::new().respond("no JSON here at all");
        let samples = generate_samples(&chat, "some task").await.unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].id, 1);
        assert_eq!(samples[1].id, 2);
    }

    #[tokio::test]
    async fn test_gateway_failure_propagates() {
        let chat = ScriptedChat::new().fail("connection refused");
        let result = generate_samples(&chat, "some task").await;
        assert!(matches!(result, Err(PromptLoopError::Gateway(_))));
    }
}
