use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::error::GatewayError;
use crate::types::{ChatRequest, ChatResponse, SseLine, WireMessage};

const DEFAULT_API_URL: &str = "https://api.siliconflow.cn";

/// Client for OpenAI-compatible `/v1/chat/completions` endpoints.
pub struct ChatClient {
    api_key: String,
    model: String,
    http: reqwest::Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            http: reqwest::Client::new(),
            base_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// The model id sent with every request.
    pub fn model(&self) -> &str {
        &self.model
    }

    fn headers(&self) -> Result<HeaderMap, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url)
    }

    /// Non-streaming chat completion. Any non-2xx status or transport
    /// failure is an error; there is no retry.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, GatewayError> {
        debug!(model = %request.model, "chat request");

        let response = self
            .http
            .post(self.endpoint())
            .headers(self.headers()?)
            .json(request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http { status, body });
        }

        Ok(response.json().await?)
    }

    /// Streaming chat completion. Forces the `stream` flag, reads the
    /// SSE body line by line, and calls `on_chunk(delta, accumulated)`
    /// for every delta until the `[DONE]` sentinel. Malformed lines are
    /// skipped. Returns the fully accumulated text, so callers that
    /// only want the final text can pass a no-op callback.
    pub async fn chat_stream(
        &self,
        request: &ChatRequest,
        on_chunk: &mut (dyn FnMut(&str, &str) + Send),
    ) -> Result<String, GatewayError> {
        let mut request = request.clone();
        request.stream = Some(true);

        debug!(model = %request.model, "streaming chat request");

        let response = self
            .http
            .post(self.endpoint())
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Http { status, body });
        }

        let mut body = response.bytes_stream();
        let mut pending = String::new();
        let mut accumulated = String::new();

        'stream: while let Some(chunk) = body.next().await {
            pending.push_str(&String::from_utf8_lossy(&chunk?));

            // SSE events are newline-delimited; a chunk may end mid-line,
            // so the tail stays in `pending` until its newline arrives.
            while let Some(pos) = pending.find('\n') {
                let line: String = pending.drain(..=pos).collect();
                match SseLine::parse(line.trim_end()) {
                    SseLine::Done => break 'stream,
                    SseLine::Delta(delta) => {
                        accumulated.push_str(&delta);
                        on_chunk(&delta, &accumulated);
                    }
                    SseLine::Skip => {}
                }
            }
        }

        Ok(accumulated)
    }

    /// One user message in, completion text out.
    pub async fn complete(
        &self,
        prompt: &str,
        temperature: f32,
    ) -> Result<String, GatewayError> {
        let request = ChatRequest::new(&self.model)
            .message(WireMessage::user(prompt))
            .temperature(temperature);

        let response = self.chat(&request).await?;
        response.text().ok_or(GatewayError::EmptyCompletion)
    }

    /// Streaming variant of [`complete`](Self::complete).
    pub async fn complete_stream(
        &self,
        prompt: &str,
        temperature: f32,
        on_chunk: &mut (dyn FnMut(&str, &str) + Send),
    ) -> Result<String, GatewayError> {
        let request = ChatRequest::new(&self.model)
            .message(WireMessage::user(prompt))
            .temperature(temperature);

        self.chat_stream(&request, on_chunk).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let client = ChatClient::new("sk-test", "deepseek-ai/DeepSeek-V3");
        assert_eq!(client.model(), "deepseek-ai/DeepSeek-V3");
        assert_eq!(client.base_url, DEFAULT_API_URL);
    }

    #[test]
    fn test_with_base_url() {
        let client = ChatClient::new("sk-test", "m").with_base_url("http://localhost:8080");
        assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
