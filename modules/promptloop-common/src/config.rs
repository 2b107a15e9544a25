use std::env;

use crate::error::PromptLoopError;

pub const DEFAULT_BASE_URL: &str = "https://api.siliconflow.cn";
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-V3";

/// API configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl Config {
    /// Load configuration from environment variables. A missing API key
    /// is fatal before a run starts; everything else has a default.
    pub fn from_env() -> Result<Self, PromptLoopError> {
        Ok(Self {
            api_key: required_env("PROMPTLOOP_API_KEY")?,
            base_url: env::var("PROMPTLOOP_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: env::var("PROMPTLOOP_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
        })
    }
}

fn required_env(key: &str) -> Result<String, PromptLoopError> {
    env::var(key)
        .map_err(|_| PromptLoopError::Config(format!("{key} environment variable is required")))
}
