use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use dialoguer::Confirm;
use tracing::info;
use tracing_subscriber::EnvFilter;

use llm_client::ChatClient;
use promptloop::export;
use promptloop::runner::{IterationOutcome, OptimizationRun};
use promptloop::traits::{NullSink, StreamSink};
use promptloop_common::{Config, RunPhase, RunState};

#[derive(Parser)]
#[command(name = "promptloop")]
#[command(about = "Iteratively optimize a prompt against a chat-completion API")]
#[command(version)]
struct Cli {
    /// What the prompt is supposed to accomplish
    #[arg(long)]
    task: String,

    /// The initial prompt to optimize
    #[arg(long)]
    prompt: String,

    /// Maximum number of optimization iterations
    #[arg(short = 'n', long, default_value_t = 3)]
    iterations: u32,

    /// Confirm between iterations instead of running straight through
    #[arg(long)]
    manual: bool,

    /// Print model output incrementally while samples execute
    #[arg(long)]
    stream: bool,

    /// Write a JSON snapshot of the run here when finished
    #[arg(long)]
    export: Option<PathBuf>,

    /// Override the configured model id
    #[arg(long)]
    model: Option<String>,

    /// Override the configured API base URL
    #[arg(long)]
    base_url: Option<String>,
}

/// Streams deltas straight to the terminal.
struct StdoutSink;

impl StreamSink for StdoutSink {
    fn begin(&mut self, sample_id: u32) {
        println!("\n--- sample {sample_id} ---");
    }

    fn chunk(&mut self, delta: &str, _text_so_far: &str) {
        print!("{delta}");
        let _ = std::io::stdout().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("promptloop=info".parse()?))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    info!(model = %config.model, base_url = %config.base_url, "promptloop starting");

    let chat = ChatClient::new(&config.api_key, &config.model).with_base_url(&config.base_url);
    let state = RunState::new(&cli.task, &cli.prompt, cli.iterations);
    let mut run = OptimizationRun::new(chat, state).with_streaming(cli.stream);

    let mut sink: Box<dyn StreamSink> = if cli.stream {
        Box::new(StdoutSink)
    } else {
        Box::new(NullSink)
    };

    println!("Generating test samples and baseline outputs...");
    run.bootstrap(&mut *sink).await?;
    for sample in &run.state().samples {
        println!("  [{}] {}", sample.id, sample.question);
    }

    while run.state().phase != RunPhase::Finished {
        if cli.manual && run.state().iteration > 0 {
            let proceed = Confirm::new()
                .with_prompt("Run the next iteration?")
                .default(true)
                .interact()?;
            if !proceed {
                run.stop();
                break;
            }
        }

        match run.advance(&mut *sink).await {
            Ok(Some(outcome)) => render_iteration(run.state(), &outcome),
            Ok(None) => break,
            Err(err) => {
                eprintln!("\nIteration failed, stopping the run: {err}");
                eprintln!("The last known-good prompt is still selected.");
                break;
            }
        }
    }

    let summary = run.state().summary();
    println!("\n=== Run complete ===");
    println!("Iterations:       {}", summary.iterations);
    println!("Improved:         {}", summary.improved);
    println!("Improvement rate: {:.0}%", summary.improvement_rate * 100.0);
    println!("\nBest prompt:\n{}", run.state().current_best_prompt);

    if let Some(path) = cli.export {
        export::write_snapshot(run.state(), &path)?;
        println!("\nExported run history to {}", path.display());
    }

    Ok(())
}

fn render_iteration(state: &RunState, outcome: &IterationOutcome) {
    println!("\n=== Iteration {} ===", outcome.iteration);
    let Some(entry) = state.history.last() else {
        return;
    };
    for (sample_id, verdict) in &entry.evaluations {
        let output = state
            .candidate_outputs
            .get(sample_id)
            .map(String::as_str)
            .unwrap_or("");
        println!("  sample {sample_id}: {verdict}  | {}", preview(output));
    }
    let decision = if outcome.accepted {
        "accepted"
    } else {
        "rejected"
    };
    println!(
        "  candidate {decision} ({} wins / {} losses)",
        outcome.wins, outcome.losses
    );
    if !entry.analysis.is_empty() {
        println!("\n{}", entry.analysis);
    }
}

/// First line of a candidate output, truncated at a char boundary.
fn preview(text: &str) -> String {
    let first_line = text.lines().next().unwrap_or("");
    let mut end = first_line.len().min(100);
    while !first_line.is_char_boundary(end) {
        end -= 1;
    }
    if end < text.len() {
        format!("{}...", &first_line[..end])
    } else {
        first_line.to_string()
    }
}
