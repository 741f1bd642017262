//! Score a trained model on the dev or test split.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use nerfr_core::{ModelKind, Recognizer, RecognizerConfig};
use nerfr_trainer::{evaluate, read_conll, split_path};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "evaluate")]
#[command(about = "Evaluate a French NER model on a CoNLL split")]
#[command(version)]
struct Cli {
    /// Directory holding fr_<split>.conll
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Trained model artifact
    #[arg(long, default_value = "models/ner_model.json")]
    model_path: PathBuf,

    /// Split to score: dev or test
    #[arg(long, default_value = "dev", value_parser = ["dev", "test"])]
    split: String,

    /// Model family the artifact was trained as
    #[arg(long, default_value_t = ModelKind::Crf)]
    model_type: ModelKind,

    /// Restrict CRF decoding to well-formed BIO sequences
    #[arg(long)]
    constrained: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    if !cli.model_path.exists() {
        bail!("model not found: {}", cli.model_path.display());
    }
    let recognizer = Recognizer::new(
        RecognizerConfig::new()
            .with_model_kind(cli.model_type)
            .with_model_path(&cli.model_path)
            .with_constrained_decoding(cli.constrained),
    )?;

    let path = split_path(&cli.data_dir, &cli.split);
    let corpus = read_conll(&path).with_context(|| format!("loading {} split", cli.split))?;
    info!(path = %path.display(), sentences = corpus.len(), "evaluating");

    let report = evaluate(&recognizer, &corpus)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }

    Ok(())
}
