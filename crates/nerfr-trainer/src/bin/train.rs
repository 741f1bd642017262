//! Train a labeler on `fr_train.conll` and write the model artifact.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use nerfr_core::{Labeler, ModelKind, Recognizer, RecognizerConfig};
use nerfr_trainer::{Trainer, TrainerConfig, evaluate, read_conll, split_path};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "train")]
#[command(about = "Train a French NER model from CoNLL files")]
#[command(version)]
struct Cli {
    /// Directory holding fr_train.conll (and optionally fr_dev.conll)
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// Model family: logreg or crf
    #[arg(long, default_value_t = ModelKind::Crf)]
    model: ModelKind,

    /// Where to write the trained artifact
    #[arg(short, long, default_value = "models/ner_model.json")]
    output: PathBuf,

    /// Passes over the training data
    #[arg(long, default_value_t = 10)]
    epochs: usize,

    /// Shuffle seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    let train_path = split_path(&cli.data_dir, "train");
    let corpus = read_conll(&train_path)
        .with_context(|| format!("training data not found in {}", cli.data_dir.display()))?;
    info!(
        path = %train_path.display(),
        sentences = corpus.len(),
        tokens = corpus.token_count(),
        "loaded training data"
    );

    let mut trainer = Trainer::new(TrainerConfig {
        kind: cli.model,
        epochs: cli.epochs,
        seed: cli.seed,
    });
    let artifact = trainer.fit(&corpus)?;

    artifact
        .save(&cli.output)
        .with_context(|| format!("writing {}", cli.output.display()))?;
    info!(path = %cli.output.display(), "model saved");

    let dev_path = split_path(&cli.data_dir, "dev");
    if !dev_path.exists() {
        warn!(path = %dev_path.display(), "no dev split, skipping evaluation");
        return Ok(());
    }

    let dev = read_conll(&dev_path)?;
    let labeler = Labeler::from_artifact(artifact, cli.model, false)?;
    let recognizer =
        Recognizer::with_labeler(RecognizerConfig::new().with_model_kind(cli.model), labeler)?;
    let report = evaluate(&recognizer, &dev)?;
    info!(f1 = report.f1(), "dev evaluation");
    println!("{report}");

    Ok(())
}
