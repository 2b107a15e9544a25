mod client;
mod error;
pub mod types;

pub use client::ChatClient;
pub use error::GatewayError;
pub use types::{ChatRequest, ChatResponse, WireMessage};
