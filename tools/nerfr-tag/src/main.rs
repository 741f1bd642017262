//! Read one sentence per stdin line and print one JSON object per line.

use std::io::{self, BufRead, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use nerfr_core::pipeline::DEFAULT_MODEL_PATH;
use nerfr_core::{ModelKind, Recognizer, RecognizerConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nerfr-tag")]
#[command(about = "Tag French sentences read from stdin")]
#[command(version)]
struct Cli {
    /// Trained model artifact
    #[arg(long, env = "NERFR_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    model_path: PathBuf,

    /// Model family of the artifact: logreg or crf
    #[arg(long, env = "NERFR_MODEL_KIND", default_value_t = ModelKind::Crf)]
    model_kind: ModelKind,

    /// Restrict CRF decoding to well-formed BIO sequences
    #[arg(long)]
    constrained: bool,

    /// Print tokens and labels only
    #[arg(long)]
    basic: bool,
}

#[derive(Serialize)]
struct Failure<'a> {
    input: &'a str,
    error: String,
}

fn tag_line(recognizer: &Recognizer, line: &str, basic: bool) -> serde_json::Result<String> {
    let analysis = match recognizer.analyze(line) {
        Ok(analysis) => analysis,
        Err(e) => {
            return serde_json::to_string(&Failure {
                input: line,
                error: e.to_string(),
            });
        }
    };
    if basic {
        serde_json::to_string(&analysis.into_basic())
    } else {
        serde_json::to_string(&analysis)
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays valid JSON lines.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let recognizer = Recognizer::new(
        RecognizerConfig::new()
            .with_model_kind(cli.model_kind)
            .with_model_path(cli.model_path)
            .with_constrained_decoding(cli.constrained),
    )?;

    let stdin = io::stdin();
    let mut out = BufWriter::new(io::stdout().lock());

    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        writeln!(out, "{}", tag_line(&recognizer, line, cli.basic)?)?;
    }

    out.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_line_without_model() {
        let recognizer = Recognizer::new(RecognizerConfig::new().without_model()).unwrap();

        let full: serde_json::Value =
            serde_json::from_str(&tag_line(&recognizer, "Paris.", false).unwrap()).unwrap();
        assert_eq!(full["tokens"], serde_json::json!(["Paris", "."]));
        assert_eq!(full["statistics"], serde_json::json!({}));

        let basic: serde_json::Value =
            serde_json::from_str(&tag_line(&recognizer, "Paris.", true).unwrap()).unwrap();
        assert_eq!(basic["labels"], serde_json::json!(["O", "O"]));
        assert!(basic.get("entities").is_none());
    }
}
