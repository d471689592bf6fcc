use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use council::{DebateEngine, DebateResult, FailurePolicy, InputArtifact};
use council_agents::{run_stage, ChatReviewer, CouncilFile, EndpointConfig, StageError};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Run an artifact past a weighted persona council", long_about = None)]
struct Args {
    /// Council definition (.toml, .yaml or .yml) with personas, axioms and debate settings
    #[arg(long)]
    council: PathBuf,

    /// Artifact to review (reads stdin when omitted)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Consensus threshold in (0, 1] (overrides the council file)
    #[arg(long)]
    threshold: Option<f64>,

    /// Maximum debate rounds (overrides the council file)
    #[arg(long)]
    max_rounds: Option<u32>,

    /// What a failed review counts as: approve, reject or abstain
    #[arg(long)]
    on_failure: Option<FailurePolicy>,

    /// Treat responses without a DECISION marker as failed reviews
    #[arg(long, default_value_t = false)]
    strict: bool,

    /// Write the debate record as JSON to this path
    #[arg(long)]
    output: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.json_logs);

    let council = CouncilFile::load(&args.council)?;
    let registry = council.registry()?;

    let mut config = council.debate.clone();
    if let Some(threshold) = args.threshold {
        config.threshold = threshold;
    }
    if let Some(max_rounds) = args.max_rounds {
        config.max_rounds = max_rounds;
    }
    if let Some(on_failure) = args.on_failure {
        config.on_failure = on_failure;
    }

    let text = read_input(args.input.as_ref())?;
    let input = InputArtifact::new(text).with_axioms(council.axioms.clone());

    let mut endpoint = EndpointConfig::default();
    endpoint.strict_parse |= args.strict;
    info!(
        url = %endpoint.url,
        model = %endpoint.model,
        personas = registry.len(),
        threshold = config.threshold,
        max_rounds = config.max_rounds,
        "Council starting"
    );

    let engine = DebateEngine::new(ChatReviewer::new(endpoint)?);

    match run_stage(&engine, input, &registry, &config).await {
        Ok(output) => {
            emit_result(&output.result, args.output.as_ref())?;
            Ok(())
        }
        Err(e) => {
            if let Some(result) = e.result() {
                emit_result(result, args.output.as_ref())?;
            }
            match e {
                StageError::Debate(inner) => Err(inner).context("Council could not start"),
                other => Err(anyhow::anyhow!(other)),
            }
        }
    }
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

fn read_input(path: Option<&PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read input {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read input from stdin")?;
            Ok(text)
        }
    }
}

fn emit_result(result: &DebateResult, output: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(result).context("Failed to serialize debate result")?;
    if let Some(path) = output {
        std::fs::write(path, &json)
            .with_context(|| format!("Failed to write debate result to {}", path.display()))?;
    }
    println!("{json}");
    Ok(())
}
