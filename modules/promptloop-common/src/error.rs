use thiserror::Error;

#[derive(Error, Debug)]
pub enum PromptLoopError {
    #[error("Gateway error: {0}")]
    Gateway(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
