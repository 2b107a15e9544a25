// Trait abstractions for the optimization loop's dependencies.
//
// ChatModel replaces a concrete ChatClient: every model call in the
// loop goes through this one seam, so the whole pipeline runs against
// ScriptedChat in tests. No network, no API key.
//
// StreamSink is the operator surface's only hook into mid-step
// progress; everything else is read from RunState between steps.

use async_trait::async_trait;

use llm_client::ChatClient;
use promptloop_common::PromptLoopError;

// ---------------------------------------------------------------------------
// ChatModel — replaces ChatClient
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// One user message in, completion text out.
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, PromptLoopError>;

    /// Streaming completion. `on_chunk` receives (delta, accumulated)
    /// per chunk; the fully accumulated text is returned either way.
    async fn complete_stream(
        &self,
        prompt: &str,
        temperature: f32,
        on_chunk: &mut (dyn for<'a, 'b> FnMut(&'a str, &'b str) + Send),
    ) -> Result<String, PromptLoopError>;
}

#[async_trait]
impl ChatModel for ChatClient {
    async fn complete(&self, prompt: &str, temperature: f32) -> Result<String, PromptLoopError> {
        self.complete(prompt, temperature)
            .await
            .map_err(|e| PromptLoopError::Gateway(e.to_string()))
    }

    async fn complete_stream(
        &self,
        prompt: &str,
        temperature: f32,
        on_chunk: &mut (dyn for<'a, 'b> FnMut(&'a str, &'b str) + Send),
    ) -> Result<String, PromptLoopError> {
        self.complete_stream(prompt, temperature, on_chunk)
            .await
            .map_err(|e| PromptLoopError::Gateway(e.to_string()))
    }
}

// ---------------------------------------------------------------------------
// StreamSink — where incremental output goes
// ---------------------------------------------------------------------------

pub trait StreamSink: Send {
    /// A sample's execution is starting.
    fn begin(&mut self, sample_id: u32) {
        let _ = sample_id;
    }

    /// One streamed chunk: the delta and the text accumulated so far.
    fn chunk(&mut self, delta: &str, text_so_far: &str);
}

/// Discards all progress. For non-streaming runs and tests.
pub struct NullSink;

impl StreamSink for NullSink {
    fn chunk(&mut self, _delta: &str, _text_so_far: &str) {}
}
