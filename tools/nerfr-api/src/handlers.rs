//! Request handlers.

use std::path::Path;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use nerfr_core::{Analysis, BasicPrediction, ModelKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::AppState;
use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model_loaded: bool,
    pub model_kind: ModelKind,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model_loaded: !state.recognizer.is_degraded(),
        model_kind: state.recognizer.config().model_kind,
    })
}

#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub tokens: Vec<String>,
}

/// POST /predict
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> Result<Json<BasicPrediction>, ApiError> {
    let Json(request) = payload?;
    Ok(Json(state.recognizer.label_tokens(request.tokens)?))
}

#[derive(Debug, Deserialize)]
pub struct EnhancedRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub tokens: Option<Vec<String>>,
}

/// POST /predict-enhanced
///
/// `text` takes precedence when both fields are present.
pub async fn predict_enhanced(
    State(state): State<AppState>,
    payload: Result<Json<EnhancedRequest>, JsonRejection>,
) -> Result<Json<Analysis>, ApiError> {
    let Json(request) = payload?;
    let analysis = match (request.text, request.tokens) {
        (Some(text), _) => state.recognizer.analyze(&text)?,
        (None, Some(tokens)) => state.recognizer.analyze_tokens(tokens)?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "request must contain `text` or `tokens`".into(),
            ));
        }
    };
    Ok(Json(analysis))
}

/// Upload formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Pdf,
    Docx,
    Other,
}

impl DocumentKind {
    pub fn from_filename(name: &str) -> Self {
        let ext = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("txt") => Self::Text,
            Some("pdf") => Self::Pdf,
            Some("docx") => Self::Docx,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileAnalysis {
    pub filename: String,
    pub text: String,
    #[serde(flatten)]
    pub analysis: Analysis,
}

/// POST /predict-file
pub async fn predict_file(
    State(state): State<AppState>,
    payload: Result<Multipart, MultipartRejection>,
) -> Result<Json<FileAnalysis>, ApiError> {
    let mut multipart = payload?;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        match DocumentKind::from_filename(&filename) {
            DocumentKind::Text => {}
            DocumentKind::Pdf | DocumentKind::Docx => {
                return Err(ApiError::UnsupportedMediaType(format!(
                    "text extraction from {filename:?} is not supported, upload a .txt file"
                )));
            }
            DocumentKind::Other => {
                return Err(ApiError::UnsupportedMediaType(format!(
                    "unsupported file type {filename:?}, expected .txt"
                )));
            }
        }

        let bytes = field.bytes().await?;
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| ApiError::BadRequest(format!("{filename:?} is not valid UTF-8")))?;
        debug!(filename = %filename, bytes = text.len(), "analyzing upload");

        let analysis = state.recognizer.analyze(&text)?;
        return Ok(Json(FileAnalysis {
            filename,
            text,
            analysis,
        }));
    }

    Err(ApiError::BadRequest("missing multipart field `file`".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_kind() {
        assert_eq!(DocumentKind::from_filename("notes.txt"), DocumentKind::Text);
        assert_eq!(DocumentKind::from_filename("NOTES.TXT"), DocumentKind::Text);
        assert_eq!(DocumentKind::from_filename("report.pdf"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_filename("cv.docx"), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_filename("image.png"), DocumentKind::Other);
        assert_eq!(DocumentKind::from_filename("README"), DocumentKind::Other);
        assert_eq!(DocumentKind::from_filename(""), DocumentKind::Other);
    }
}
