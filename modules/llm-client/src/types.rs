use serde::{Deserialize, Serialize};

// =============================================================================
// Messages
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireMessage {
    pub role: Role,
    pub content: String,
}

impl WireMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Chat Request
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            messages: Vec::new(),
            temperature: None,
            stream: None,
        }
    }

    pub fn message(mut self, message: WireMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

// =============================================================================
// Chat Response (non-streaming)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}

impl ChatResponse {
    /// The first choice's completion text, if any.
    pub fn text(self) -> Option<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
    }
}

// =============================================================================
// Stream chunks (SSE)
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    pub content: Option<String>,
}

/// One classified line of a `text/event-stream` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseLine {
    /// `data: [DONE]`, end of stream.
    Done,
    /// A delta carrying completion text.
    Delta(String),
    /// Anything else: non-data lines, empty deltas, malformed JSON.
    Skip,
}

impl SseLine {
    pub(crate) fn parse(line: &str) -> Self {
        let Some(data) = line.strip_prefix("data: ") else {
            return SseLine::Skip;
        };
        if data == "[DONE]" {
            return SseLine::Done;
        }
        let Ok(chunk) = serde_json::from_str::<StreamChunk>(data) else {
            return SseLine::Skip;
        };
        match chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
        {
            Some(delta) if !delta.is_empty() => SseLine::Delta(delta),
            _ => SseLine::Skip,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serializes_without_optional_fields() {
        let request = ChatRequest::new("test-model").message(WireMessage::user("hi"));
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "test-model");
        assert_eq!(json["messages"][0]["role"], "user");
        assert!(json.get("temperature").is_none());
        assert!(json.get("stream").is_none());
    }

    #[test]
    fn test_request_serializes_temperature_and_stream() {
        let mut request = ChatRequest::new("m").temperature(0.5);
        request.stream = Some(true);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["temperature"], 0.5);
        assert_eq!(json["stream"], true);
    }

    #[test]
    fn test_response_text_extracts_first_choice() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"hello"}}]}"#,
        )
        .unwrap();
        assert_eq!(response.text().as_deref(), Some("hello"));
    }

    #[test]
    fn test_response_text_empty_choices() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(response.text(), None);
    }

    #[test]
    fn test_sse_line_delta() {
        let line = r#"data: {"choices":[{"delta":{"content":"Hi"}}]}"#;
        assert_eq!(SseLine::parse(line), SseLine::Delta("Hi".to_string()));
    }

    #[test]
    fn test_sse_line_done_sentinel() {
        assert_eq!(SseLine::parse("data: [DONE]"), SseLine::Done);
    }

    #[test]
    fn test_sse_line_skips_non_data_lines() {
        assert_eq!(SseLine::parse(""), SseLine::Skip);
        assert_eq!(SseLine::parse(": keep-alive"), SseLine::Skip);
        assert_eq!(SseLine::parse("event: message"), SseLine::Skip);
    }

    #[test]
    fn test_sse_line_skips_malformed_json() {
        assert_eq!(SseLine::parse("data: {not json"), SseLine::Skip);
    }

    #[test]
    fn test_sse_line_skips_empty_delta() {
        let line = r#"data: {"choices":[{"delta":{}}]}"#;
        assert_eq!(SseLine::parse(line), SseLine::Skip);
        let line = r#"data: {"choices":[{"delta":{"content":""}}]}"#;
        assert_eq!(SseLine::parse(line), SseLine::Skip);
    }
}
