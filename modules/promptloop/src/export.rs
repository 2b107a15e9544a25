//! One-way JSON snapshot of a finished run. Never reloaded.

use std::path::Path;

use anyhow::Context;
use chrono::Local;
use serde::Serialize;

use promptloop_common::{PromptLoopError, RunState};

#[derive(Debug, Serialize)]
pub struct ExportSnapshot {
    pub date: String,
    pub task_description: String,
    /// The best prompt at export time, under the historical field name.
    pub initial_prompt: String,
    pub iterations: u32,
    pub history: Vec<ExportEntry>,
}

/// Per-sample evaluations are not exported.
#[derive(Debug, Serialize)]
pub struct ExportEntry {
    pub iteration: u32,
    pub prompt: String,
    pub is_better: bool,
    pub analysis: String,
}

impl ExportSnapshot {
    pub fn from_state(state: &RunState) -> Self {
        Self {
            date: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            task_description: state.task_description.clone(),
            initial_prompt: state.current_best_prompt.clone(),
            iterations: state.iteration,
            history: state
                .history
                .iter()
                .map(|entry| ExportEntry {
                    iteration: entry.iteration,
                    prompt: entry.prompt.clone(),
                    is_better: entry.is_better,
                    analysis: entry.analysis.clone(),
                })
                .collect(),
        }
    }
}

pub fn write_snapshot(state: &RunState, path: &Path) -> Result<(), PromptLoopError> {
    let snapshot = ExportSnapshot::from_state(state);
    let json = serde_json::to_string_pretty(&snapshot)
        .context("serializing export snapshot")
        .map_err(PromptLoopError::Anyhow)?;
    std::fs::write(path, json)
        .with_context(|| format!("writing export snapshot to {}", path.display()))
        .map_err(PromptLoopError::Anyhow)?;
    Ok(())
}
