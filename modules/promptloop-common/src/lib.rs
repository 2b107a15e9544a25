pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::PromptLoopError;
pub use types::{
    Evaluation, HistoryEntry, OutputMap, RunPhase, RunState, RunSummary, Sample, Verdict,
};
