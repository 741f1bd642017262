//! # Model Artifact
//!
//! The on-disk form of a trained labeler: a JSON document holding the label
//! set and linear weights keyed by feature attribute.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{NerError, Result};
use crate::pipeline::bio_tags::Tag;

/// The labeler family an artifact was trained for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Independent per-token linear classifier.
    #[serde(rename = "logreg")]
    LogReg,
    /// Linear-chain CRF decoded per sentence.
    #[default]
    Crf,
}

impl ModelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LogReg => "logreg",
            Self::Crf => "crf",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = NerError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "logreg" => Ok(Self::LogReg),
            "crf" => Ok(Self::Crf),
            _ => Err(NerError::UnknownModelKind(s.to_string())),
        }
    }
}

/// A serialised labeler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub kind: ModelKind,
    /// Label set; weight vectors are indexed in this order.
    pub labels: Vec<Tag>,
    /// Per-attribute weight vectors, one weight per label.
    pub weights: HashMap<String, Vec<f32>>,
    /// Per-label intercepts (per-token classifier only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub intercepts: Vec<f32>,
    /// `[from][to]` label transition scores (CRF only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transitions: Vec<Vec<f32>>,
}

impl ModelArtifact {
    /// An artifact with all-zero parameters for the given labels.
    pub fn zeroed(kind: ModelKind, labels: Vec<Tag>) -> Self {
        let n = labels.len();
        let (intercepts, transitions) = match kind {
            ModelKind::LogReg => (vec![0.0; n], Vec::new()),
            ModelKind::Crf => (Vec::new(), vec![vec![0.0; n]; n]),
        };
        Self {
            kind,
            labels,
            weights: HashMap::new(),
            intercepts,
            transitions,
        }
    }

    pub fn num_labels(&self) -> usize {
        self.labels.len()
    }

    /// Check that every parameter block matches the label set.
    pub fn validate(&self) -> Result<()> {
        let n = self.labels.len();
        if n == 0 {
            return Err(NerError::InvalidArtifact("label set is empty".into()));
        }

        if let Some((attr, row)) = self.weights.iter().find(|(_, row)| row.len() != n) {
            return Err(NerError::InvalidArtifact(format!(
                "attribute {attr:?} has {} weights, expected {n}",
                row.len()
            )));
        }

        match self.kind {
            ModelKind::LogReg => {
                if !self.intercepts.is_empty() && self.intercepts.len() != n {
                    return Err(NerError::InvalidArtifact(format!(
                        "expected {n} intercepts, found {}",
                        self.intercepts.len()
                    )));
                }
            }
            ModelKind::Crf => {
                if self.transitions.len() != n || self.transitions.iter().any(|r| r.len() != n) {
                    return Err(NerError::InvalidArtifact(format!(
                        "transition matrix must be {n}x{n}"
                    )));
                }
            }
        }

        Ok(())
    }

    /// Read and validate an artifact from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let artifact: Self = serde_json::from_str(&content)?;
        artifact.validate()?;
        debug!(
            path = %path.display(),
            kind = %artifact.kind,
            labels = artifact.labels.len(),
            attributes = artifact.weights.len(),
            "loaded model artifact"
        );
        Ok(artifact)
    }

    /// Write the artifact as pretty JSON, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
