// Test mocks for the optimization loop.
//
// ScriptedChat (ChatModel): ordered queue of canned completions; the
// loop's call order (optimizer, executors, evaluators, analyst) makes
// scripts deterministic. RecordingSink (StreamSink) captures chunk
// callbacks for streaming assertions.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use promptloop_common::PromptLoopError;

use crate::traits::{ChatModel, StreamSink};

// ---------------------------------------------------------------------------
// ScriptedChat
// ---------------------------------------------------------------------------

/// Queue-based chat model. Each call consumes the next scripted entry;
/// an exhausted queue is a gateway error. Every prompt sent is
/// recorded for assertions.
pub struct ScriptedChat {
    script: Mutex<VecDeque<Result<String, String>>>,
    requests: Mutex<Vec<String>>,
    chunk_size: usize,
}

impl ScriptedChat {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            chunk_size: 3,
        }
    }

    pub fn respond(self, text: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    /// Script the same response `n` times (one per sample, usually).
    pub fn respond_times(mut self, text: impl Into<String>, n: usize) -> Self {
        let text = text.into();
        for _ in 0..n {
            self = self.respond(text.clone());
        }
        self
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        self.script.lock().unwrap().push_back(Err(message.into()));
        self
    }

    /// Streaming chunk size in characters.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// Every prompt sent so far, in call order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl Default for ScriptedChat {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatModel for ScriptedChat {
    async fn complete(&self, prompt: &str, _temperature: f32) -> Result<String, PromptLoopError> {
        self.requests.lock().unwrap().push(prompt.to_string());
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(PromptLoopError::Gateway(message)),
            None => Err(PromptLoopError::Gateway(
                "ScriptedChat: no scripted response left".to_string(),
            )),
        }
    }

    async fn complete_stream(
        &self,
        prompt: &str,
        temperature: f32,
        on_chunk: &mut (dyn for<'a, 'b> FnMut(&'a str, &'b str) + Send),
    ) -> Result<String, PromptLoopError> {
        let full = self.complete(prompt, temperature).await?;

        let chars: Vec<char> = full.chars().collect();
        let mut accumulated = String::new();
        for piece in chars.chunks(self.chunk_size) {
            let delta: String = piece.iter().collect();
            accumulated.push_str(&delta);
            on_chunk(&delta, &accumulated);
        }
        Ok(full)
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// Captures everything the loop pushes at it.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub begun: Vec<u32>,
    pub deltas: Vec<String>,
    pub last_text: String,
}

impl StreamSink for RecordingSink {
    fn begin(&mut self, sample_id: u32) {
        self.begun.push(sample_id);
    }

    fn chunk(&mut self, delta: &str, text_so_far: &str) {
        self.deltas.push(delta.to_string());
        self.last_text = text_so_far.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_chat_pops_in_order() {
        let chat = ScriptedChat::new().respond("one").respond("two");
        assert_eq!(chat.complete("a", 0.0).await.unwrap(), "one");
        assert_eq!(chat.complete("b", 0.0).await.unwrap(), "two");
        assert!(chat.complete("c", 0.0).await.is_err());
        assert_eq!(chat.requests(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_scripted_stream_reassembles_exactly() {
        let chat = ScriptedChat::new().respond("héllo wörld").with_chunk_size(2);
        let mut seen = String::new();
        let full = chat
            .complete_stream("p", 0.0, &mut |delta, acc| {
                seen.push_str(delta);
                assert_eq!(seen, acc);
            })
            .await
            .unwrap();
        assert_eq!(full, "héllo wörld");
        assert_eq!(seen, full);
    }
}
