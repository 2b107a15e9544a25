use thiserror::Error;

/// Transport and protocol failures from the chat API.
///
/// There is no retry layer: callers see every failure and decide
/// whether to abort whatever they were doing.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("chat API error ({status}): {body}")]
    Http {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid API key: {0}")]
    InvalidKey(#[from] reqwest::header::InvalidHeaderValue),

    #[error("response contained no completion text")]
    EmptyCompletion,
}
