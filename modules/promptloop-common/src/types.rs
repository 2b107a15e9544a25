use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// One generated test case. `expected` is advisory for the judge model;
/// nothing ever string-matches an output against it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// 1-based, in generation order.
    pub id: u32,
    pub question: String,
    pub expected: String,
}

/// Outcome of judging two outputs for one sample. "A" is the current
/// best prompt's output, "B" the candidate's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "A_better")]
    CurrentBetter,
    #[serde(rename = "B_better")]
    CandidateBetter,
    #[serde(rename = "similar")]
    Similar,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::CurrentBetter => write!(f, "current better"),
            Verdict::CandidateBetter => write!(f, "candidate better"),
            Verdict::Similar => write!(f, "similar"),
        }
    }
}

/// Sample id → generated text. Regenerated wholesale each iteration.
pub type OutputMap = BTreeMap<u32, String>;

/// Sample id → verdict for one iteration.
pub type Evaluation = BTreeMap<u32, Verdict>;

/// Record of one completed iteration, appended win or lose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub iteration: u32,
    /// The candidate prompt evaluated that iteration.
    pub prompt: String,
    pub is_better: bool,
    pub analysis: String,
    pub evaluations: Evaluation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunPhase {
    Idle,
    Running,
    Finished,
}

/// Everything one optimization run owns. Only the run loop mutates
/// this, and only between steps.
#[derive(Debug, Clone)]
pub struct RunState {
    pub task_description: String,
    pub initial_prompt: String,
    pub current_best_prompt: String,
    pub current_best_outputs: OutputMap,
    /// The most recent iteration's candidate, win or lose. Empty until
    /// the first iteration completes.
    pub candidate_prompt: String,
    pub candidate_outputs: OutputMap,
    pub samples: Vec<Sample>,
    /// Completed iterations. Monotonically increasing, never past
    /// `max_iterations`.
    pub iteration: u32,
    pub max_iterations: u32,
    pub phase: RunPhase,
    pub history: Vec<HistoryEntry>,
}

impl RunState {
    pub fn new(
        task_description: impl Into<String>,
        initial_prompt: impl Into<String>,
        max_iterations: u32,
    ) -> Self {
        let initial_prompt = initial_prompt.into();
        Self {
            task_description: task_description.into(),
            current_best_prompt: initial_prompt.clone(),
            initial_prompt,
            current_best_outputs: OutputMap::new(),
            candidate_prompt: String::new(),
            candidate_outputs: OutputMap::new(),
            samples: Vec::new(),
            iteration: 0,
            max_iterations,
            phase: RunPhase::Idle,
            history: Vec::new(),
        }
    }

    /// Render the trailing (up to 3) history entries for the optimizer,
    /// one line per iteration.
    pub fn history_summary(&self) -> String {
        let start = self.history.len().saturating_sub(3);
        self.history[start..]
            .iter()
            .map(|entry| {
                let outcome = if entry.is_better {
                    "improved"
                } else {
                    "no improvement"
                };
                format!("iteration {}: {}", entry.iteration, outcome)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn summary(&self) -> RunSummary {
        let improved = self.history.iter().filter(|e| e.is_better).count() as u32;
        let improvement_rate = if self.iteration > 0 {
            f64::from(improved) / f64::from(self.iteration)
        } else {
            0.0
        };
        RunSummary {
            iterations: self.iteration,
            improved,
            improvement_rate,
        }
    }
}

/// Derived stats over a run, for the final report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RunSummary {
    pub iterations: u32,
    pub improved: u32,
    pub improvement_rate: f64,
}
