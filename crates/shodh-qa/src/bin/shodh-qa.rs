//! Command-line runner: loads a tokenizer and ONNX model, runs one input and
//! prints the result as JSON on stdout. Logs go to stderr.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use shodh_qa::encoding::HfTokenizer;
use shodh_qa::{OnnxEngine, QaConfig, QaPipeline, TaskKind, TranslatorInput};

#[derive(Debug, Parser)]
#[command(
    name = "shodh-qa",
    about = "Multi-span QA, sentence highlighting and text embedding over ONNX models"
)]
struct Args {
    /// JSON config file; missing fields fall back to defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Task to run; overrides the config file.
    #[arg(long, value_enum)]
    task: Option<TaskKind>,

    /// Directory holding `model.onnx` and `tokenizer.json`.
    #[arg(long)]
    model_dir: Option<PathBuf>,

    #[arg(long)]
    question: Option<String>,

    #[arg(long)]
    context: Option<String>,

    /// Single text for embedding.
    #[arg(long, conflicts_with_all = ["question", "context"])]
    text: Option<String>,

    /// Print the structured decode instead of the tensor envelope.
    #[arg(long, default_value_t = false)]
    decoded: bool,
}

fn input_from_args(args: &Args) -> Result<TranslatorInput> {
    match (&args.question, &args.context, &args.text) {
        (Some(question), Some(context), None) => Ok(TranslatorInput::pair(question, context)),
        (None, None, Some(text)) => Ok(TranslatorInput::text(text)),
        _ => bail!("pass either --question with --context, or --text"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_writer(io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let mut config = match &args.config {
        Some(path) => QaConfig::from_file(path).map_err(anyhow::Error::msg)?,
        None => QaConfig::default(),
    };
    if let Some(task) = args.task {
        config.task = task;
    }
    if let Some(dir) = &args.model_dir {
        config.model.model_dir = dir.clone();
    }
    config.validate().map_err(anyhow::Error::msg)?;

    let input = input_from_args(&args)?;

    tracing::info!(
        task = ?config.task,
        model_dir = %config.model.model_dir.display(),
        "Loading model"
    );
    let tokenizer = HfTokenizer::from_file(&config.tokenizer_path(), config.model.max_length)
        .context("Failed to load tokenizer")?;
    let engine = OnnxEngine::new(&config.model.model_dir)?;
    let pipeline = QaPipeline::from_config(&config, Arc::new(tokenizer), Arc::new(engine));

    let json = if args.decoded {
        let decoded = pipeline.predict_decoded(&input)?;
        serde_json::to_string_pretty(&decoded)?
    } else {
        let envelope = pipeline.predict(&input)?;
        serde_json::to_string_pretty(&envelope)?
    };
    println!("{}", json);

    Ok(())
}
