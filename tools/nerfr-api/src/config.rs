//! Server configuration from flags and `NERFR_*` environment variables.

use std::path::{Path, PathBuf};

use clap::Parser;
use nerfr_core::pipeline::DEFAULT_MODEL_PATH;
use nerfr_core::{ModelKind, RecognizerConfig};

/// 5 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Parser)]
#[command(name = "nerfr-api")]
#[command(about = "Serve French named-entity recognition over HTTP")]
#[command(version)]
pub struct ServerConfig {
    /// Address to bind
    #[arg(long, env = "NERFR_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(short, long, env = "NERFR_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Trained model artifact; its directory is served under /models
    #[arg(long, env = "NERFR_MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    pub model_path: PathBuf,

    /// Model family of the artifact: logreg or crf
    #[arg(long, env = "NERFR_MODEL_KIND", default_value_t = ModelKind::Crf)]
    pub model_kind: ModelKind,

    /// Restrict CRF decoding to well-formed BIO sequences
    #[arg(long, env = "NERFR_CONSTRAINED")]
    pub constrained: bool,

    /// Maximum request body size in bytes
    #[arg(long, env = "NERFR_MAX_UPLOAD_BYTES", default_value_t = DEFAULT_MAX_UPLOAD_BYTES)]
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn recognizer_config(&self) -> RecognizerConfig {
        RecognizerConfig::new()
            .with_model_kind(self.model_kind)
            .with_model_path(&self.model_path)
            .with_constrained_decoding(self.constrained)
    }

    /// Directory exposed for model downloads.
    pub fn models_dir(&self) -> PathBuf {
        self.model_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }
}
