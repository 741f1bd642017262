//! nerfr-api: serve the recognizer over HTTP.
//!
//! Every flag can also be set through its `NERFR_*` environment variable;
//! see `nerfr-api --help`.

use anyhow::{Context, Result};
use clap::Parser;
use nerfr_api::{AppState, ServerConfig, build_router};
use nerfr_core::Recognizer;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,nerfr_api=debug,tower_http=debug".into()),
        )
        .init();

    let config = ServerConfig::parse();

    let recognizer = Recognizer::new(config.recognizer_config())
        .with_context(|| format!("loading model from {}", config.model_path.display()))?;
    if recognizer.is_degraded() {
        warn!("serving without a trained model");
    }

    let app = build_router(AppState::new(recognizer, &config));

    let listener = TcpListener::bind((config.host.as_str(), config.port))
        .await
        .with_context(|| format!("binding {}:{}", config.host, config.port))?;
    info!(
        addr = %listener.local_addr()?,
        model_kind = %config.model_kind,
        "nerfr-api listening"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
